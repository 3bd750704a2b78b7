use serde::{Deserialize, Serialize};

use crate::model::{
    db::{
        candidate::{Affiliation, Candidate},
        partylist::Partylist,
        position::Position,
    },
    mongodb::Id,
};

/// Results for one election, sliced to the caller's scope.
/// Safe to recompute repeatedly, including while voting is still open.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ElectionResults {
    pub election_id: Id,
    pub turnout: Turnout,
    /// Position results in ballot order.
    pub positions: Vec<PositionResult>,
    pub partylists: Vec<PartylistResult>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Turnout {
    pub votes_cast: u64,
    pub eligible_voters: u64,
    pub percentage: f64,
}

impl Turnout {
    pub fn new(votes_cast: u64, eligible_voters: u64) -> Self {
        let percentage = if eligible_voters == 0 {
            0.0
        } else {
            votes_cast as f64 / eligible_voters as f64 * 100.0
        };
        Self {
            votes_cast,
            eligible_voters,
            percentage,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PositionResult {
    pub position_id: Id,
    pub name: String,
    pub max_votes_allowed: u32,
    pub total_votes: u64,
    /// Candidates in rank order: descending votes, ties ordered by name for
    /// display only.
    pub candidates: Vec<CandidateResult>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CandidateResult {
    pub candidate_id: Id,
    pub first_name: String,
    pub last_name: String,
    pub affiliation: Affiliation,
    pub votes_received: u64,
    /// Share of all votes cast for this position, 0 when none were cast.
    pub percentage: f64,
    pub winner: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PartylistResult {
    pub partylist_id: Id,
    pub name: String,
    /// Sum of `votes_received` across the partylist's candidates,
    /// independent of position.
    pub total_votes: u64,
}

impl PositionResult {
    /// Tally one position's candidates and mark the winners.
    ///
    /// Candidates are ranked by descending vote count; equal counts are
    /// ordered by (last name, first name) for stable display, but the name
    /// order never decides who wins. A candidate at rank `i` wins if
    /// `i < max_votes_allowed`, or if they are tied with the candidate at
    /// the last guaranteed winning rank (a tie for the final seat extends
    /// the winner set). A candidate with zero votes never wins, even when
    /// seats remain unfilled.
    pub fn compute(position: &Position, mut candidates: Vec<Candidate>) -> Self {
        candidates.sort_by(|a, b| {
            b.votes_received
                .cmp(&a.votes_received)
                .then_with(|| a.last_name.cmp(&b.last_name))
                .then_with(|| a.first_name.cmp(&b.first_name))
        });

        let total_votes: u64 = candidates.iter().map(|c| c.votes_received).sum();
        let max = position.max_votes_allowed as usize;
        // The vote count of the lowest-ranked guaranteed winner; ties with
        // it extend the winner set beyond `max_votes_allowed`.
        let threshold = candidates
            .get(max.saturating_sub(1))
            .map(|c| c.votes_received);

        let mut results = Vec::with_capacity(candidates.len());
        let mut still_winning = true;
        for (rank, candidate) in candidates.into_iter().enumerate() {
            if candidate.votes_received == 0 {
                still_winning = false;
            }
            let winner = still_winning
                && (rank < max || Some(candidate.votes_received) == threshold);
            if !winner {
                still_winning = false;
            }

            let percentage = if total_votes == 0 {
                0.0
            } else {
                candidate.votes_received as f64 / total_votes as f64 * 100.0
            };
            results.push(CandidateResult {
                candidate_id: candidate.id,
                first_name: candidate.first_name,
                last_name: candidate.last_name,
                affiliation: candidate.affiliation,
                votes_received: candidate.votes_received,
                percentage,
                winner,
            });
        }

        Self {
            position_id: position.id,
            name: position.name.clone(),
            max_votes_allowed: position.max_votes_allowed,
            total_votes,
            candidates: results,
        }
    }
}

/// Sum each partylist's candidate votes across all positions.
pub fn partylist_rollup(partylists: &[Partylist], candidates: &[Candidate]) -> Vec<PartylistResult> {
    partylists
        .iter()
        .map(|partylist| {
            let total_votes = candidates
                .iter()
                .filter(|c| c.affiliation == Affiliation::Partylist(partylist.id))
                .map(|c| c.votes_received)
                .sum();
            PartylistResult {
                partylist_id: partylist.id,
                name: partylist.name.clone(),
                total_votes,
            }
        })
        .collect()
}
