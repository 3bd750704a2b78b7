use std::fmt::{Display, Formatter};

use mongodb::bson::{to_bson, Bson};
use serde::{Deserialize, Serialize};

/// States in the Election lifecycle.
///
/// The stored value is what an admin last set; the *effective* state for a
/// given scope and instant is computed by
/// [`Election::resolve_status`](crate::model::db::election::Election::resolve_status).
#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ElectionState {
    /// Scheduled but not yet open.
    Upcoming,
    /// Open for ballot submission.
    Ongoing,
    /// Temporarily suspended; submission is closed but the election is not over.
    Paused,
    /// Closed; results are final.
    Ended,
    /// Retired. Terminal: an archived election never reopens.
    Archived,
}

impl Display for ElectionState {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            ElectionState::Upcoming => "upcoming",
            ElectionState::Ongoing => "ongoing",
            ElectionState::Paused => "paused",
            ElectionState::Ended => "ended",
            ElectionState::Archived => "archived",
        };
        write!(f, "{name}")
    }
}

impl From<ElectionState> for Bson {
    fn from(state: ElectionState) -> Self {
        to_bson(&state).expect("Serialisation is infallible")
    }
}
