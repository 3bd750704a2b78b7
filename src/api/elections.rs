use chrono::Utc;
use mongodb::bson::doc;
use rocket::{futures::TryStreamExt, serde::json::Json, Route, State};

use crate::config::Config;
use crate::error::{Error, Result};
use crate::model::{
    api::election::CurrentElection,
    auth::Identity,
    db::{
        ballot::VoteMarker,
        election::{select_relevant, Election},
    },
    mongodb::{Coll, Id},
};

pub fn routes() -> Vec<Route> {
    routes![current_election, has_voted]
}

/// The election currently relevant to the caller's scope, with its effective
/// status. 404 when nothing is scheduled, running, or recently ended.
#[get("/elections/current")]
async fn current_election(
    identity: Identity,
    config: &State<Config>,
    elections: Coll<Election>,
    markers: Coll<VoteMarker>,
) -> Result<Json<CurrentElection>> {
    let scope = identity.scope();
    let now = Utc::now();

    let visible: Vec<Election> = elections
        .find(scope.visibility_filter(), None)
        .await?
        .try_collect()
        .await?;

    let mut resolved = Vec::with_capacity(visible.len());
    for election in visible {
        let status = election.resolve_status(&scope, now)?;
        resolved.push((election, status));
    }

    let (election, status) = select_relevant(resolved, now, config.ended_grace())
        .ok_or_else(|| Error::not_found(format!("No relevant election for scope {scope}")))?;

    let marker = doc! {
        "student_id": identity.student_id().as_str(),
        "election_id": election.id,
    };
    let has_voted = markers.find_one(marker, None).await?.is_some();

    Ok(Json(CurrentElection::new(election, status, has_voted)))
}

/// Whether the caller has already voted in the given election.
#[get("/elections/<election_id>/voted")]
async fn has_voted(
    identity: Identity,
    election_id: Id,
    elections: Coll<Election>,
    markers: Coll<VoteMarker>,
) -> Result<Json<bool>> {
    let election = elections
        .find_one(election_id.as_doc(), None)
        .await?
        .ok_or_else(|| Error::not_found(format!("Election {election_id}")))?;
    if !identity.can_access(&election.scope) {
        return Err(Error::Unauthorized(format!(
            "Election {election_id} is outside your scope"
        )));
    }

    let marker = doc! {
        "student_id": identity.student_id().as_str(),
        "election_id": election.id,
    };
    let voted = markers.find_one(marker, None).await?.is_some();
    Ok(Json(voted))
}
