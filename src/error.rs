use rocket::{http::Status, response::Responder};
use thiserror::Error;

use crate::model::{common::ElectionState, mongodb::Id};

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Error)]
pub enum Error {
    /// The transaction or query could not be completed for infrastructure
    /// reasons. Safe for the caller to retry; internals are never exposed.
    #[error(transparent)]
    Db(#[from] mongodb::error::Error),
    #[error(transparent)]
    Jwt(#[from] jsonwebtoken::errors::Error),
    #[error("Unauthorized: {0}")]
    Unauthorized(String),
    #[error("Not found: {0}")]
    NotFound(String),
    /// Effective status for the caller's scope is not `Ongoing`.
    #[error("Voting is not currently open (election is {0})")]
    ElectionNotOpen(ElectionState),
    /// Terminal: never retryable, whether detected pre-flight or by the
    /// uniqueness constraint at commit time.
    #[error("You have already voted in this election")]
    AlreadyVoted,
    #[error(transparent)]
    BallotValidation(#[from] BallotError),
    #[error("Internal error: {0}")]
    Internal(String),
}

impl Error {
    pub fn not_found(what: impl std::fmt::Display) -> Self {
        Self::NotFound(what.to_string())
    }
}

/// A malformed or rule-violating ballot, naming the offending selection.
/// Detected before any write begins.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum BallotError {
    #[error("Position {position_id} is not part of this election")]
    UnknownPosition { position_id: Id },
    #[error("Position {position_id} is outside your ballot")]
    PositionOutOfScope { position_id: Id },
    #[error("Position {position_id} allows at most {max} selections, got {got}")]
    Overvote { position_id: Id, max: u32, got: u32 },
    #[error("Candidate {candidate_id} selected twice for position {position_id}")]
    DuplicateCandidate { position_id: Id, candidate_id: Id },
    #[error("Candidate {candidate_id} does not stand for position {position_id}")]
    ForeignCandidate { position_id: Id, candidate_id: Id },
}

impl<'r, 'o: 'r> Responder<'r, 'o> for Error {
    fn respond_to(self, _: &'r rocket::Request<'_>) -> rocket::response::Result<'o> {
        match &self {
            Self::Db(err) => error!("Database error: {err}"),
            Self::Internal(msg) => error!("Internal error: {msg}"),
            err => warn!("{err}"),
        }
        Err(match self {
            Self::Db(_) | Self::Internal(_) => Status::InternalServerError,
            Self::Jwt(_) => Status::Unauthorized,
            Self::Unauthorized(_) => Status::Forbidden,
            Self::NotFound(_) => Status::NotFound,
            Self::ElectionNotOpen(_) | Self::AlreadyVoted => Status::Conflict,
            Self::BallotValidation(_) => Status::UnprocessableEntity,
        })
    }
}
