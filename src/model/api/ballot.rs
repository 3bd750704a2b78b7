use std::collections::{HashMap, HashSet};

use serde::{Deserialize, Serialize};

use crate::error::BallotError;
use crate::model::{
    common::Scope,
    db::{candidate::Candidate, election::Election, position::Position},
    mongodb::Id,
};

/// A ballot as submitted by a voter: for each position, the candidates they
/// selected. A position may be present with an empty selection.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BallotSpec {
    pub selections: HashMap<Id, Vec<Id>>,
}

impl BallotSpec {
    /// Validate this ballot against the election's position rules and
    /// candidate memberships. Pure; performs no writes and short-circuits on
    /// the first violation.
    ///
    /// Checks, per selected position: the position belongs to the election
    /// and to the voter's visible ballot slice; the selection does not
    /// exceed `max_votes_allowed`; no candidate is selected twice; every
    /// candidate stands for exactly that position in that election.
    ///
    /// `min_votes_required` is deliberately not enforced here; empty and
    /// partial selections are accepted.
    pub fn validate(
        &self,
        election: &Election,
        voter_scope: &Scope,
        positions: &[Position],
        candidates: &[Candidate],
    ) -> Result<(), BallotError> {
        let positions_by_id = positions
            .iter()
            .map(|position| (position.id, position))
            .collect::<HashMap<_, _>>();
        let candidates_by_id = candidates
            .iter()
            .map(|candidate| (candidate.id, candidate))
            .collect::<HashMap<_, _>>();

        for (&position_id, selected) in &self.selections {
            let position = positions_by_id
                .get(&position_id)
                .filter(|position| position.election_id == election.id)
                .ok_or(BallotError::UnknownPosition { position_id })?;

            let visible = position.scope == Scope::University || position.scope == *voter_scope;
            if !visible {
                return Err(BallotError::PositionOutOfScope { position_id });
            }

            if selected.len() > position.max_votes_allowed as usize {
                return Err(BallotError::Overvote {
                    position_id,
                    max: position.max_votes_allowed,
                    got: selected.len() as u32,
                });
            }

            let mut seen = HashSet::new();
            for &candidate_id in selected {
                if !seen.insert(candidate_id) {
                    return Err(BallotError::DuplicateCandidate {
                        position_id,
                        candidate_id,
                    });
                }
                let belongs = candidates_by_id.get(&candidate_id).is_some_and(|c| {
                    c.position_id == position_id && c.election_id == election.id
                });
                if !belongs {
                    return Err(BallotError::ForeignCandidate {
                        position_id,
                        candidate_id,
                    });
                }
            }
        }

        Ok(())
    }

    /// Every selected candidate ID, with its position.
    pub fn votes(&self) -> impl Iterator<Item = (Id, Id)> + '_ {
        self.selections.iter().flat_map(|(&position_id, selected)| {
            selected
                .iter()
                .map(move |&candidate_id| (position_id, candidate_id))
        })
    }
}

/// The response to a successful ballot submission.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BallotReceipt {
    pub ballot_id: Id,
}

#[cfg(test)]
mod tests {
    use chrono::{Duration, Utc};

    use crate::model::{common::ElectionState, db::candidate::Affiliation};

    use super::*;

    fn fixture() -> (Election, Vec<Position>, Vec<Candidate>) {
        let now = Utc::now();
        let election = Election {
            id: Id::new(),
            name: "Student Council Elections".to_string(),
            scope: Scope::University,
            state: ElectionState::Ongoing,
            start_time: now - Duration::hours(1),
            end_time: now + Duration::hours(1),
            extensions: Vec::new(),
        };
        let president = Position {
            id: Id::new(),
            election_id: election.id,
            name: "President".to_string(),
            scope: Scope::University,
            max_votes_allowed: 1,
            min_votes_required: 1,
            order: 1,
        };
        let senator = Position {
            id: Id::new(),
            election_id: election.id,
            name: "Senator".to_string(),
            scope: Scope::University,
            max_votes_allowed: 2,
            min_votes_required: 0,
            order: 2,
        };
        let college_rep = Position {
            id: Id::new(),
            election_id: election.id,
            name: "College Representative".to_string(),
            scope: Scope::College("engineering".into()),
            max_votes_allowed: 1,
            min_votes_required: 0,
            order: 3,
        };
        let candidate = |position: &Position, last: &str| Candidate {
            id: Id::new(),
            election_id: election.id,
            position_id: position.id,
            first_name: "Alex".to_string(),
            last_name: last.to_string(),
            affiliation: Affiliation::Independent,
            votes_received: 0,
        };
        let candidates = vec![
            candidate(&president, "Reyes"),
            candidate(&senator, "Santos"),
            candidate(&senator, "Cruz"),
            candidate(&senator, "Garcia"),
            candidate(&college_rep, "Lim"),
        ];
        (election, vec![president, senator, college_rep], candidates)
    }

    #[test]
    fn accepts_valid_ballot() {
        let (election, positions, candidates) = fixture();
        let spec = BallotSpec {
            selections: HashMap::from([
                (positions[0].id, vec![candidates[0].id]),
                (positions[1].id, vec![candidates[1].id, candidates[2].id]),
            ]),
        };
        assert!(spec
            .validate(&election, &Scope::University, &positions, &candidates)
            .is_ok());
    }

    #[test]
    fn accepts_empty_selection() {
        let (election, positions, candidates) = fixture();
        let spec = BallotSpec {
            selections: HashMap::from([(positions[1].id, vec![])]),
        };
        assert!(spec
            .validate(&election, &Scope::University, &positions, &candidates)
            .is_ok());
    }

    #[test]
    fn rejects_overvote() {
        let (election, positions, candidates) = fixture();
        let senator = &positions[1];
        let spec = BallotSpec {
            selections: HashMap::from([(
                senator.id,
                vec![candidates[1].id, candidates[2].id, candidates[3].id],
            )]),
        };
        let err = spec
            .validate(&election, &Scope::University, &positions, &candidates)
            .unwrap_err();
        assert_eq!(
            err,
            BallotError::Overvote {
                position_id: senator.id,
                max: 2,
                got: 3,
            }
        );
    }

    #[test]
    fn rejects_unknown_position() {
        let (election, positions, candidates) = fixture();
        let bogus = Id::new();
        let spec = BallotSpec {
            selections: HashMap::from([(bogus, vec![candidates[0].id])]),
        };
        let err = spec
            .validate(&election, &Scope::University, &positions, &candidates)
            .unwrap_err();
        assert_eq!(err, BallotError::UnknownPosition { position_id: bogus });
    }

    #[test]
    fn rejects_cross_position_candidate() {
        let (election, positions, candidates) = fixture();
        // A senator candidate on the president slot.
        let spec = BallotSpec {
            selections: HashMap::from([(positions[0].id, vec![candidates[1].id])]),
        };
        let err = spec
            .validate(&election, &Scope::University, &positions, &candidates)
            .unwrap_err();
        assert_eq!(
            err,
            BallotError::ForeignCandidate {
                position_id: positions[0].id,
                candidate_id: candidates[1].id,
            }
        );
    }

    #[test]
    fn rejects_duplicate_candidate() {
        let (election, positions, candidates) = fixture();
        let spec = BallotSpec {
            selections: HashMap::from([(
                positions[1].id,
                vec![candidates[1].id, candidates[1].id],
            )]),
        };
        let err = spec
            .validate(&election, &Scope::University, &positions, &candidates)
            .unwrap_err();
        assert_eq!(
            err,
            BallotError::DuplicateCandidate {
                position_id: positions[1].id,
                candidate_id: candidates[1].id,
            }
        );
    }

    #[test]
    fn rejects_position_outside_voter_scope() {
        let (election, positions, candidates) = fixture();
        let college_rep = &positions[2];
        let spec = BallotSpec {
            selections: HashMap::from([(college_rep.id, vec![candidates[4].id])]),
        };

        // Wrong college.
        let err = spec
            .validate(
                &election,
                &Scope::College("sciences".into()),
                &positions,
                &candidates,
            )
            .unwrap_err();
        assert_eq!(
            err,
            BallotError::PositionOutOfScope {
                position_id: college_rep.id,
            }
        );

        // Right college.
        assert!(spec
            .validate(
                &election,
                &Scope::College("engineering".into()),
                &positions,
                &candidates,
            )
            .is_ok());
    }
}
