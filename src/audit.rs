use chrono::{DateTime, Utc};
use rocket::serde::json::serde_json;
use serde::Serialize;

use crate::error::Error;
use crate::model::{
    auth::Identity,
    common::{Scope, StudentId},
    mongodb::Id,
};

/// The final outcome of a submission attempt, never an intermediate state.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum SubmissionOutcome {
    Accepted { ballot_id: Id },
    Rejected { reason: String, detail: String },
}

impl SubmissionOutcome {
    fn rejected(reason: &str, err: &Error) -> Self {
        Self::Rejected {
            reason: reason.to_string(),
            detail: err.to_string(),
        }
    }
}

impl From<&Result<Id, &Error>> for SubmissionOutcome {
    fn from(result: &Result<Id, &Error>) -> Self {
        match result {
            Ok(ballot_id) => Self::Accepted {
                ballot_id: *ballot_id,
            },
            Err(err) => match err {
                Error::ElectionNotOpen(_) => Self::rejected("election_not_open", err),
                Error::AlreadyVoted => Self::rejected("already_voted", err),
                Error::BallotValidation(_) => Self::rejected("invalid_ballot", err),
                Error::Unauthorized(_) => Self::rejected("unauthorized", err),
                Error::NotFound(_) => Self::rejected("not_found", err),
                _ => Self::rejected("persistence_failure", err),
            },
        }
    }
}

/// One structured event per ballot submission attempt.
#[derive(Debug, Clone, Serialize)]
pub struct SubmissionEvent<'a> {
    pub student_id: &'a StudentId,
    pub scope: &'a Scope,
    pub election_id: Id,
    #[serde(flatten)]
    pub outcome: SubmissionOutcome,
    pub at: DateTime<Utc>,
}

/// The audit event sink. Events are serialized as JSON lines on the `audit`
/// log target and routed to the external collector by the log4rs config;
/// emission is fire-and-forget and never fails the request.
#[derive(Debug, Copy, Clone, Default)]
pub struct AuditLog;

impl AuditLog {
    /// Record the final outcome of a ballot submission attempt.
    pub fn submission(&self, voter: &Identity, election_id: Id, result: &Result<Id, &Error>) {
        let scope = voter.scope();
        let event = SubmissionEvent {
            student_id: voter.student_id(),
            scope: &scope,
            election_id,
            outcome: SubmissionOutcome::from(result),
            at: Utc::now(),
        };
        match serde_json::to_string(&event) {
            Ok(line) => info!(target: "audit", "{line}"),
            // Never let auditing break the request path.
            Err(err) => error!(target: "audit", "Failed to serialise audit event: {err}"),
        }
    }
}
