use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::model::{
    common::{ElectionState, Scope},
    db::election::{EffectiveStatus, Election},
    mongodb::Id,
};

/// The election currently relevant to the caller's scope, with its effective
/// (computed) state and end time rather than the stored ones.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CurrentElection {
    pub id: Id,
    pub name: String,
    pub scope: Scope,
    /// Effective state for the caller's scope at the time of the request.
    pub state: ElectionState,
    pub start_time: DateTime<Utc>,
    /// Effective end time for the caller's scope.
    pub end_time: DateTime<Utc>,
    pub has_voted: bool,
}

impl CurrentElection {
    pub fn new(election: Election, status: EffectiveStatus, has_voted: bool) -> Self {
        Self {
            id: election.id,
            name: election.name,
            scope: election.scope,
            state: status.state,
            start_time: election.start_time,
            end_time: status.end_time,
            has_voted,
        }
    }
}
