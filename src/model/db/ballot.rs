use std::ops::Deref;

use chrono::{DateTime, Utc};
use mongodb::bson::serde_helpers::chrono_datetime_as_bson_datetime;
use serde::{Deserialize, Serialize};

use crate::model::{
    common::{College, StudentId},
    mongodb::Id,
};

/// The vote dedup marker: its existence is the single source of truth for
/// "has this student voted in this election".
///
/// Inserted as the *first* write of the ballot transaction and backed by a
/// unique index on `(student_id, election_id)`, so of two concurrent
/// submissions exactly one can commit. Never updated or deleted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VoteMarker {
    pub student_id: StudentId,
    pub election_id: Id,
}

/// A successfully submitted ballot, without its database ID.
/// Immutable after creation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewBallot {
    pub student_id: StudentId,
    pub election_id: Id,
    /// The voter's college at cast time; used to slice turnout by scope.
    pub college: Option<College>,
    #[serde(with = "chrono_datetime_as_bson_datetime")]
    pub cast_at: DateTime<Utc>,
}

/// A submitted ballot from the database, with its unique ID.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubmittedBallot {
    #[serde(rename = "_id")]
    pub id: Id,
    #[serde(flatten)]
    pub ballot: NewBallot,
}

impl Deref for SubmittedBallot {
    type Target = NewBallot;

    fn deref(&self) -> &Self::Target {
        &self.ballot
    }
}

/// One selection of one candidate for one position on one ballot.
/// Append-only; never updated.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VoteCast {
    pub ballot_id: Id,
    pub election_id: Id,
    pub position_id: Id,
    pub candidate_id: Id,
}
