use serde::{Deserialize, Serialize};

use crate::model::{common::Scope, mongodb::Id};

/// A partylist fielding candidates within one election.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Partylist {
    /// Unique ID.
    #[serde(rename = "_id")]
    pub id: Id,
    /// Foreign key election ID.
    pub election_id: Id,
    /// Partylist name.
    pub name: String,
    /// University-wide or one college's ballot slice.
    pub scope: Scope,
}
