use mongodb::bson::{doc, Document};
use rocket::{futures::TryStreamExt, serde::json::Json, Route};

use crate::error::{Error, Result};
use crate::model::{
    api::results::{partylist_rollup, ElectionResults, PositionResult, Turnout},
    auth::Identity,
    common::Scope,
    db::{
        ballot::SubmittedBallot, candidate::Candidate, election::Election, partylist::Partylist,
        position::Position, voter::EligibleVoter,
    },
    mongodb::{Coll, Id},
};

pub fn routes() -> Vec<Route> {
    routes![election_results]
}

/// Live or final results for an election, sliced to the caller's scope.
/// Read-only over committed data, so it is safe to poll while voting is
/// still open.
#[get("/elections/<election_id>/results")]
#[allow(clippy::too_many_arguments)]
async fn election_results(
    identity: Identity,
    election_id: Id,
    elections: Coll<Election>,
    positions: Coll<Position>,
    partylists: Coll<Partylist>,
    candidates: Coll<Candidate>,
    ballots: Coll<SubmittedBallot>,
    voters: Coll<EligibleVoter>,
) -> Result<Json<ElectionResults>> {
    let election = elections
        .find_one(election_id.as_doc(), None)
        .await?
        .ok_or_else(|| Error::not_found(format!("Election {election_id}")))?;
    if !identity.can_access(&election.scope) {
        return Err(Error::Unauthorized(format!(
            "Election {election_id} is outside your scope"
        )));
    }
    let scope = identity.scope();

    // The caller's slice of the ballot.
    let slice_filter = |scope_filter: Document| {
        doc! {
            "election_id": election.id,
            "$and": [scope_filter],
        }
    };
    let visible_positions: Vec<Position> = positions
        .find(slice_filter(scope.visibility_filter()), None)
        .await?
        .try_collect()
        .await?;
    let visible_partylists: Vec<Partylist> = partylists
        .find(slice_filter(scope.visibility_filter()), None)
        .await?
        .try_collect()
        .await?;

    // Candidates have no scope of their own; they follow their position.
    let mut all_candidates: Vec<Candidate> = candidates
        .find(doc! { "election_id": election.id }, None)
        .await?
        .try_collect()
        .await?;
    all_candidates.retain(|candidate| {
        visible_positions
            .iter()
            .any(|position| position.id == candidate.position_id)
    });

    // Position results in ballot order.
    let mut ordered = visible_positions.clone();
    ordered.sort_by_key(|position| position.order);
    let position_results = ordered
        .iter()
        .map(|position| {
            let runners = all_candidates
                .iter()
                .filter(|candidate| candidate.position_id == position.id)
                .cloned()
                .collect();
            PositionResult::compute(position, runners)
        })
        .collect();

    // Turnout, restricted to the target college for college scopes.
    let (ballot_filter, voter_filter) = match &scope {
        Scope::University => (doc! { "election_id": election.id }, doc! {}),
        Scope::College(college) => (
            doc! { "election_id": election.id, "college": college.as_str() },
            doc! { "college": college.as_str() },
        ),
    };
    let votes_cast = ballots.count_documents(ballot_filter, None).await?;
    let eligible_voters = voters.count_documents(voter_filter, None).await?;

    Ok(Json(ElectionResults {
        election_id: election.id,
        turnout: Turnout::new(votes_cast, eligible_voters),
        positions: position_results,
        partylists: partylist_rollup(&visible_partylists, &all_candidates),
    }))
}
