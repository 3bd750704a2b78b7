use serde::{Deserialize, Serialize};

use crate::model::{common::Scope, mongodb::Id};

/// An elected position within one election.
///
/// Definitional data is managed by the admin tooling and treated as
/// read-only here.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Position {
    /// Unique ID.
    #[serde(rename = "_id")]
    pub id: Id,
    /// Foreign key election ID.
    pub election_id: Id,
    /// Position title, e.g. "President".
    pub name: String,
    /// University-wide or one college's ballot slice.
    pub scope: Scope,
    /// Maximum number of candidates one voter may select. At least 1.
    pub max_votes_allowed: u32,
    /// Minimum number of selections. Stored and exposed for clients, but not
    /// enforced at submission time.
    pub min_votes_required: u32,
    /// Display and precedence order within the ballot.
    pub order: u32,
}
