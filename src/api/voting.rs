use chrono::Utc;
use mongodb::{bson::doc, Client};
use rocket::{futures::TryStreamExt, serde::json::Json, Route, State};

use crate::audit::AuditLog;
use crate::error::{Error, Result};
use crate::model::{
    api::ballot::{BallotReceipt, BallotSpec},
    auth::Identity,
    common::ElectionState,
    db::{
        ballot::{NewBallot, VoteCast, VoteMarker},
        candidate::Candidate,
        election::Election,
        position::Position,
    },
    mongodb::{is_duplicate_key, Coll, Id},
};

pub fn routes() -> Vec<Route> {
    routes![submit_ballot]
}

/// Submit the caller's ballot for an election. At most one ballot per
/// student per election, committed all-or-nothing; every attempt is audited
/// with its final outcome.
#[post("/elections/<election_id>/ballot", data = "<spec>", format = "json")]
#[allow(clippy::too_many_arguments)]
async fn submit_ballot(
    identity: Identity,
    election_id: Id,
    spec: Json<BallotSpec>,
    elections: Coll<Election>,
    positions: Coll<Position>,
    candidates: Coll<Candidate>,
    markers: Coll<VoteMarker>,
    new_ballots: Coll<NewBallot>,
    votes: Coll<VoteCast>,
    db_client: &State<Client>,
    audit: &State<AuditLog>,
) -> Result<Json<BallotReceipt>> {
    let result = process_ballot(
        &identity,
        election_id,
        spec.0,
        &elections,
        &positions,
        &candidates,
        &markers,
        &new_ballots,
        &votes,
        db_client,
    )
    .await;

    // Report the final outcome, success or failure, to the audit sink.
    audit.submission(&identity, election_id, &result.as_ref().copied());

    result.map(|ballot_id| Json(BallotReceipt { ballot_id }))
}

#[allow(clippy::too_many_arguments)]
async fn process_ballot(
    identity: &Identity,
    election_id: Id,
    spec: BallotSpec,
    elections: &Coll<Election>,
    positions: &Coll<Position>,
    candidates: &Coll<Candidate>,
    markers: &Coll<VoteMarker>,
    new_ballots: &Coll<NewBallot>,
    votes: &Coll<VoteCast>,
    db_client: &Client,
) -> Result<Id> {
    // Get the election and check the caller may vote in it at all.
    let election = elections
        .find_one(election_id.as_doc(), None)
        .await?
        .ok_or_else(|| Error::not_found(format!("Election {election_id}")))?;
    if !identity.can_access(&election.scope) {
        return Err(Error::Unauthorized(format!(
            "Election {election_id} is outside your scope"
        )));
    }

    // Voting must be open for the caller's scope right now.
    let scope = identity.scope();
    let status = election.resolve_status(&scope, Utc::now())?;
    if status.state != ElectionState::Ongoing {
        return Err(Error::ElectionNotOpen(status.state));
    }

    // Pre-flight dedup check. The unique index re-validates this inside the
    // transaction, so a concurrent double-submit still cannot slip through.
    let marker_filter = doc! {
        "student_id": identity.student_id().as_str(),
        "election_id": election.id,
    };
    if markers.find_one(marker_filter, None).await?.is_some() {
        return Err(Error::AlreadyVoted);
    }

    // Validate the selections against the election's rules. No writes have
    // happened yet, so a rejection needs no cleanup.
    let election_filter = doc! { "election_id": election.id };
    let election_positions: Vec<Position> = positions
        .find(election_filter.clone(), None)
        .await?
        .try_collect()
        .await?;
    let election_candidates: Vec<Candidate> = candidates
        .find(election_filter, None)
        .await?
        .try_collect()
        .await?;
    spec.validate(&election, &scope, &election_positions, &election_candidates)?;

    // Commit the ballot atomically: dedup marker first (the concurrency
    // guard), then the ballot, its vote rows, and the counter increments.
    // Any error aborts the whole transaction.
    let mut session = db_client.start_session(None).await?;
    session.start_transaction(None).await?;

    let marker = VoteMarker {
        student_id: identity.student_id().clone(),
        election_id: election.id,
    };
    if let Err(err) = markers
        .insert_one_with_session(&marker, None, &mut session)
        .await
    {
        // The loser of a concurrent double-submit lands here.
        if is_duplicate_key(&err) {
            return Err(Error::AlreadyVoted);
        }
        return Err(err.into());
    }

    let ballot = NewBallot {
        student_id: identity.student_id().clone(),
        election_id: election.id,
        college: identity.college().cloned(),
        cast_at: Utc::now(),
    };
    let ballot_id: Id = new_ballots
        .insert_one_with_session(&ballot, None, &mut session)
        .await?
        .inserted_id
        .as_object_id()
        .unwrap() // Valid because the ID comes directly from the DB
        .into();

    let vote_rows = spec
        .votes()
        .map(|(position_id, candidate_id)| VoteCast {
            ballot_id,
            election_id: election.id,
            position_id,
            candidate_id,
        })
        .collect::<Vec<_>>();
    if !vote_rows.is_empty() {
        votes
            .insert_many_with_session(&vote_rows, None, &mut session)
            .await?;
    }

    // Atomic increments: concurrent ballots for other students must never
    // lose updates to the shared counters.
    for vote in &vote_rows {
        let result = candidates
            .update_one_with_session(
                doc! { "_id": vote.candidate_id, "election_id": election.id },
                doc! { "$inc": { "votes_received": 1 } },
                None,
                &mut session,
            )
            .await?;
        if result.matched_count != 1 {
            // Validation already proved the candidate exists; failing here
            // means the definitional data changed under us. Abort.
            return Err(Error::Internal(format!(
                "Candidate {} vanished during ballot commit",
                vote.candidate_id
            )));
        }
    }

    session.commit_transaction().await?;
    Ok(ballot_id)
}
