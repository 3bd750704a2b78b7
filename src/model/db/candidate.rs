use serde::{Deserialize, Serialize};

use crate::model::mongodb::Id;

/// A candidate's partylist membership, or lack of one. A candidate is never
/// both independent and on a partylist.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "partylist_id")]
pub enum Affiliation {
    Independent,
    Partylist(Id),
}

/// A candidate standing for one position in one election.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Candidate {
    /// Unique ID.
    #[serde(rename = "_id")]
    pub id: Id,
    /// Foreign key election ID.
    pub election_id: Id,
    /// Foreign key position ID.
    pub position_id: Id,
    pub first_name: String,
    pub last_name: String,
    pub affiliation: Affiliation,
    /// Authoritative vote count. Monotonically increasing; mutated only by
    /// atomic `$inc` inside the ballot transaction.
    pub votes_received: u64,
}
