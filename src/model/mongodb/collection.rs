use std::ops::Deref;

use mongodb::{
    bson::doc, error::Error as DbError, options::IndexOptions, Collection, Database, IndexModel,
};
use rocket::{
    request::{self, FromRequest, Request},
    State,
};

use crate::model::db::{
    ballot::{NewBallot, SubmittedBallot, VoteCast, VoteMarker},
    candidate::Candidate,
    election::Election,
    partylist::Partylist,
    position::Position,
    voter::EligibleVoter,
};

/// A type that can be directly inserted/read to/from the database.
pub trait MongoCollection {
    /// The name of the collection.
    const NAME: &'static str;
}

/// A database collection of the given type.
pub struct Coll<T>(Collection<T>);

impl<T> Coll<T>
where
    T: MongoCollection,
{
    /// Get a handle on this collection in the given database.
    pub fn from_db(db: &Database) -> Self {
        Self(db.collection(T::NAME))
    }
}

// `Derive(Clone)` would only derive if `T: Clone`, but we don't need that bound.
impl<T> Clone for Coll<T> {
    fn clone(&self) -> Self {
        Self(self.0.clone())
    }
}

impl<T> Deref for Coll<T> {
    type Target = Collection<T>;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

#[rocket::async_trait]
impl<'r, T> FromRequest<'r> for Coll<T>
where
    T: MongoCollection,
{
    type Error = ();

    /// Get the database connection from the managed state and wrap it in a collection.
    ///
    /// Panics iff the [`Database`] is not managed by [`rocket::Rocket`].
    async fn from_request(req: &'r Request<'_>) -> request::Outcome<Self, Self::Error> {
        let db = req.guard::<&State<Database>>().await.unwrap();
        request::Outcome::Success(Coll::from_db(db))
    }
}

// Election collection
const ELECTIONS: &str = "elections";
impl MongoCollection for Election {
    const NAME: &'static str = ELECTIONS;
}

// Position collection
const POSITIONS: &str = "positions";
impl MongoCollection for Position {
    const NAME: &'static str = POSITIONS;
}

// Partylist collection
const PARTYLISTS: &str = "partylists";
impl MongoCollection for Partylist {
    const NAME: &'static str = PARTYLISTS;
}

// Candidate collection
const CANDIDATES: &str = "candidates";
impl MongoCollection for Candidate {
    const NAME: &'static str = CANDIDATES;
}

// Vote marker collection
const VOTE_MARKERS: &str = "vote_markers";
impl MongoCollection for VoteMarker {
    const NAME: &'static str = VOTE_MARKERS;
}

// Ballot collections
const BALLOTS: &str = "ballots";
impl MongoCollection for NewBallot {
    const NAME: &'static str = BALLOTS;
}
impl MongoCollection for SubmittedBallot {
    const NAME: &'static str = BALLOTS;
}

// Vote collection
const VOTES: &str = "votes";
impl MongoCollection for VoteCast {
    const NAME: &'static str = VOTES;
}

// Eligible voter roll
const VOTERS: &str = "voters";
impl MongoCollection for EligibleVoter {
    const NAME: &'static str = VOTERS;
}

/// Ensure that all the required indexes exist on the given database.
///
/// The vote marker index is load-bearing: it is the uniqueness constraint
/// that makes concurrent double-voting impossible.
///
/// This operation is idempotent.
pub async fn ensure_indexes_exist(db: &Database) -> Result<(), DbError> {
    debug!("Ensuring collection indexes exist");

    let unique = IndexOptions::builder().unique(true).build();

    // Vote marker collection: at most one vote per (student, election).
    let marker_index = IndexModel::builder()
        .keys(doc! {"student_id": 1, "election_id": 1})
        .options(unique.clone())
        .build();
    Coll::<VoteMarker>::from_db(db)
        .create_index(marker_index, None)
        .await?;

    // Ballot collection: one ballot per (student, election).
    let ballot_index = IndexModel::builder()
        .keys(doc! {"student_id": 1, "election_id": 1})
        .options(unique.clone())
        .build();
    Coll::<SubmittedBallot>::from_db(db)
        .create_index(ballot_index, None)
        .await?;

    // Vote collection: tally and conservation lookups by candidate.
    let vote_index = IndexModel::builder()
        .keys(doc! {"election_id": 1, "candidate_id": 1})
        .build();
    Coll::<VoteCast>::from_db(db)
        .create_index(vote_index, None)
        .await?;

    // Candidate collection: per-position result lookups.
    let candidate_index = IndexModel::builder()
        .keys(doc! {"election_id": 1, "position_id": 1})
        .build();
    Coll::<Candidate>::from_db(db)
        .create_index(candidate_index, None)
        .await?;

    // Voter roll: turnout denominators by college.
    let voter_index = IndexModel::builder()
        .keys(doc! {"student_id": 1})
        .options(unique)
        .build();
    Coll::<EligibleVoter>::from_db(db)
        .create_index(voter_index, None)
        .await?;

    Ok(())
}
