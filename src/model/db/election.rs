use chrono::{DateTime, Duration, Utc};
use mongodb::bson::serde_helpers::chrono_datetime_as_bson_datetime;
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::model::{
    common::{ElectionState, Scope},
    mongodb::{bson::opt_chrono_datetime_as_bson_datetime, Id},
};

/// An election, as stored in the database.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Election {
    /// Unique ID.
    #[serde(rename = "_id")]
    pub id: Id,
    /// Election name.
    pub name: String,
    /// University-wide (USC) or one college's (CSC).
    pub scope: Scope,
    /// Admin-set state. The effective state for a scope is computed from
    /// this, the schedule, and any extensions; see [`Election::resolve_status`].
    pub state: ElectionState,
    /// Scheduled start of voting.
    #[serde(with = "chrono_datetime_as_bson_datetime")]
    pub start_time: DateTime<Utc>,
    /// Scheduled end of voting.
    #[serde(with = "chrono_datetime_as_bson_datetime")]
    pub end_time: DateTime<Utc>,
    /// Per-scope schedule overrides, most recent last.
    #[serde(default)]
    pub extensions: Vec<Extension>,
}

/// A scope-specific override of an election's end date and/or a pause flag.
/// Its scope must be narrower than or equal to the election's own scope.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Extension {
    /// The scope this override applies to.
    pub scope: Scope,
    /// Replacement end of voting, if any.
    #[serde(default, with = "opt_chrono_datetime_as_bson_datetime")]
    pub end_time: Option<DateTime<Utc>>,
    /// Suspend voting for this scope.
    #[serde(default)]
    pub paused: bool,
}

/// An election's effective lifecycle state for one scope at one instant.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EffectiveStatus {
    pub state: ElectionState,
    pub end_time: DateTime<Utc>,
}

impl Election {
    /// Find the most specific extension matching the query scope: an exact
    /// college match beats a university-wide extension, and an extension for
    /// a different college never matches at all.
    ///
    /// An extension scoped outside the election's own scope is invalid data
    /// and resolves to an internal error rather than a silent default.
    fn extension_for(&self, query: &Scope) -> Result<Option<&Extension>> {
        for extension in &self.extensions {
            if !self.scope.includes(&extension.scope) {
                return Err(Error::Internal(format!(
                    "election {} ({}) has an extension scoped to {}",
                    self.id, self.scope, extension.scope
                )));
            }
        }

        if matches!(query, Scope::College(_)) {
            if let Some(exact) = self.extensions.iter().rev().find(|e| e.scope == *query) {
                return Ok(Some(exact));
            }
        }
        Ok(self
            .extensions
            .iter()
            .rev()
            .find(|e| e.scope == Scope::University))
    }

    /// Resolve the effective lifecycle state and end time of this election
    /// for the given query scope at the given instant.
    ///
    /// Pure and deterministic: identical inputs always produce identical
    /// results. Precedence, strongest first:
    ///
    /// 1. Admin-set `Archived` is terminal and always wins.
    /// 2. A matching extension's pause flag.
    /// 3. Admin-set `Ended` closes the election early.
    /// 4. The temporal state computed from `start_time` and the effective
    ///    end time (the matching extension's override if present).
    /// 5. Admin-set `Paused`, only when no extension matched; an extension's
    ///    dates reopen its scope.
    ///
    /// Admin-set `Upcoming`/`Ongoing` never beat the temporal computation.
    pub fn resolve_status(&self, query: &Scope, now: DateTime<Utc>) -> Result<EffectiveStatus> {
        let extension = self.extension_for(query)?;
        let end_time = extension
            .and_then(|e| e.end_time)
            .unwrap_or(self.end_time);

        if self.state == ElectionState::Archived {
            return Ok(EffectiveStatus {
                state: ElectionState::Archived,
                end_time,
            });
        }

        if let Some(extension) = extension {
            if extension.paused {
                return Ok(EffectiveStatus {
                    state: ElectionState::Paused,
                    end_time,
                });
            }
        }

        if self.state == ElectionState::Ended {
            return Ok(EffectiveStatus {
                state: ElectionState::Ended,
                end_time,
            });
        }

        if self.state == ElectionState::Paused && extension.is_none() {
            return Ok(EffectiveStatus {
                state: ElectionState::Paused,
                end_time,
            });
        }

        let state = if now < self.start_time {
            ElectionState::Upcoming
        } else if now <= end_time {
            ElectionState::Ongoing
        } else {
            ElectionState::Ended
        };
        Ok(EffectiveStatus { state, end_time })
    }
}

/// Pick "the" election to show for a scope out of the visible candidates:
/// an ongoing election ending soonest, else an upcoming election starting
/// soonest, else a paused one, else the most recently ended one whose end
/// falls within the grace window. Archived elections are never selected.
pub fn select_relevant(
    elections: Vec<(Election, EffectiveStatus)>,
    now: DateTime<Utc>,
    ended_grace: Duration,
) -> Option<(Election, EffectiveStatus)> {
    let in_state = |state: ElectionState| {
        elections
            .iter()
            .filter(move |(_, status)| status.state == state)
    };

    let best = if let Some((election, _)) =
        in_state(ElectionState::Ongoing).min_by_key(|(_, s)| s.end_time)
    {
        Some(election.id)
    } else if let Some((election, _)) =
        in_state(ElectionState::Upcoming).min_by_key(|(e, _)| e.start_time)
    {
        Some(election.id)
    } else if let Some((election, _)) =
        in_state(ElectionState::Paused).min_by_key(|(_, s)| s.end_time)
    {
        Some(election.id)
    } else {
        in_state(ElectionState::Ended)
            .filter(|(_, s)| now - s.end_time <= ended_grace)
            .max_by_key(|(_, s)| s.end_time)
            .map(|(election, _)| election.id)
    };

    let best = best?;
    elections.into_iter().find(|(e, _)| e.id == best)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn hours(h: i64) -> Duration {
        Duration::hours(h)
    }

    fn election(scope: Scope, state: ElectionState) -> Election {
        let now = Utc::now();
        Election {
            id: Id::new(),
            name: "Student Council Elections".to_string(),
            scope,
            state,
            start_time: now - hours(24),
            end_time: now + hours(24),
            extensions: Vec::new(),
        }
    }

    #[test]
    fn temporal_states() {
        let now = Utc::now();
        let e = election(Scope::University, ElectionState::Ongoing);

        let before = e.resolve_status(&Scope::University, now - hours(48)).unwrap();
        assert_eq!(before.state, ElectionState::Upcoming);

        let during = e.resolve_status(&Scope::University, now).unwrap();
        assert_eq!(during.state, ElectionState::Ongoing);
        assert_eq!(during.end_time, e.end_time);

        let after = e.resolve_status(&Scope::University, now + hours(48)).unwrap();
        assert_eq!(after.state, ElectionState::Ended);
    }

    #[test]
    fn resolution_is_idempotent() {
        let now = Utc::now();
        let mut e = election(Scope::University, ElectionState::Ongoing);
        e.extensions.push(Extension {
            scope: Scope::University,
            end_time: Some(now + hours(72)),
            paused: false,
        });

        let first = e.resolve_status(&Scope::University, now).unwrap();
        for _ in 0..10 {
            assert_eq!(e.resolve_status(&Scope::University, now).unwrap(), first);
        }
    }

    #[test]
    fn admin_upcoming_does_not_beat_temporal_ongoing() {
        // Started yesterday, ends tomorrow, admin never flipped the state.
        let e = election(Scope::University, ElectionState::Upcoming);
        let status = e.resolve_status(&Scope::University, Utc::now()).unwrap();
        assert_eq!(status.state, ElectionState::Ongoing);
    }

    #[test]
    fn admin_ended_closes_early() {
        let e = election(Scope::University, ElectionState::Ended);
        let status = e.resolve_status(&Scope::University, Utc::now()).unwrap();
        assert_eq!(status.state, ElectionState::Ended);
    }

    #[test]
    fn admin_archived_always_wins() {
        let now = Utc::now();
        let mut e = election(Scope::University, ElectionState::Archived);
        e.extensions.push(Extension {
            scope: Scope::University,
            end_time: Some(now + hours(72)),
            paused: true,
        });
        let status = e.resolve_status(&Scope::University, now).unwrap();
        assert_eq!(status.state, ElectionState::Archived);
    }

    #[test]
    fn extension_extends_end_for_its_college_only() {
        let now = Utc::now();
        let engineering = Scope::College("engineering".into());
        let sciences = Scope::College("sciences".into());

        let mut e = election(Scope::University, ElectionState::Ongoing);
        e.extensions.push(Extension {
            scope: engineering.clone(),
            end_time: Some(now + hours(72)),
            paused: false,
        });

        // Query from 36 hours in: past the base end, within the extension.
        let later = now + hours(36);
        let extended = e.resolve_status(&engineering, later).unwrap();
        assert_eq!(extended.state, ElectionState::Ongoing);
        assert_eq!(extended.end_time, now + hours(72));

        // Scope isolation: other colleges and the global view are untouched.
        let other = e.resolve_status(&sciences, later).unwrap();
        assert_eq!(other.state, ElectionState::Ended);
        assert_eq!(other.end_time, e.end_time);
        let global = e.resolve_status(&Scope::University, later).unwrap();
        assert_eq!(global.state, ElectionState::Ended);
    }

    #[test]
    fn university_extension_applies_to_college_queries() {
        let now = Utc::now();
        let mut e = election(Scope::University, ElectionState::Ongoing);
        e.extensions.push(Extension {
            scope: Scope::University,
            end_time: Some(now + hours(72)),
            paused: false,
        });

        let later = now + hours(36);
        let status = e
            .resolve_status(&Scope::College("engineering".into()), later)
            .unwrap();
        assert_eq!(status.state, ElectionState::Ongoing);
    }

    #[test]
    fn exact_college_extension_beats_university_extension() {
        let now = Utc::now();
        let engineering = Scope::College("engineering".into());
        let mut e = election(Scope::University, ElectionState::Ongoing);
        e.extensions.push(Extension {
            scope: Scope::University,
            end_time: Some(now + hours(72)),
            paused: false,
        });
        e.extensions.push(Extension {
            scope: engineering.clone(),
            end_time: Some(now + hours(96)),
            paused: false,
        });

        let status = e.resolve_status(&engineering, now).unwrap();
        assert_eq!(status.end_time, now + hours(96));
    }

    #[test]
    fn paused_extension_pauses_regardless_of_dates() {
        let engineering = Scope::College("engineering".into());
        let mut e = election(Scope::University, ElectionState::Ongoing);
        e.extensions.push(Extension {
            scope: engineering.clone(),
            end_time: None,
            paused: true,
        });

        let status = e.resolve_status(&engineering, Utc::now()).unwrap();
        assert_eq!(status.state, ElectionState::Paused);
        assert_eq!(status.end_time, e.end_time);

        // Everyone else keeps voting.
        let global = e.resolve_status(&Scope::University, Utc::now()).unwrap();
        assert_eq!(global.state, ElectionState::Ongoing);
    }

    #[test]
    fn admin_pause_yields_to_matching_extension() {
        let now = Utc::now();
        let engineering = Scope::College("engineering".into());
        let mut e = election(Scope::University, ElectionState::Paused);

        // No extension: the admin pause holds everywhere.
        let status = e.resolve_status(&engineering, now).unwrap();
        assert_eq!(status.state, ElectionState::Paused);

        // An extension reopens its scope only.
        e.extensions.push(Extension {
            scope: engineering.clone(),
            end_time: Some(now + hours(72)),
            paused: false,
        });
        let reopened = e.resolve_status(&engineering, now).unwrap();
        assert_eq!(reopened.state, ElectionState::Ongoing);
        let global = e.resolve_status(&Scope::University, now).unwrap();
        assert_eq!(global.state, ElectionState::Paused);
    }

    #[test]
    fn extension_outside_election_scope_is_an_error() {
        let engineering = Scope::College("engineering".into());
        let mut e = election(engineering.clone(), ElectionState::Ongoing);
        e.extensions.push(Extension {
            scope: Scope::College("sciences".into()),
            end_time: None,
            paused: true,
        });

        assert!(e.resolve_status(&engineering, Utc::now()).is_err());
    }

    #[test]
    fn latest_exact_extension_wins() {
        let now = Utc::now();
        let engineering = Scope::College("engineering".into());
        let mut e = election(Scope::University, ElectionState::Ongoing);
        e.extensions.push(Extension {
            scope: engineering.clone(),
            end_time: Some(now + hours(48)),
            paused: false,
        });
        e.extensions.push(Extension {
            scope: engineering.clone(),
            end_time: Some(now + hours(96)),
            paused: false,
        });

        let status = e.resolve_status(&engineering, now).unwrap();
        assert_eq!(status.end_time, now + hours(96));
    }

    #[test]
    fn selects_ongoing_ending_soonest() {
        let now = Utc::now();
        let scope = Scope::University;
        let mut a = election(scope.clone(), ElectionState::Ongoing);
        a.end_time = now + hours(10);
        let mut b = election(scope.clone(), ElectionState::Ongoing);
        b.end_time = now + hours(5);
        let expected = b.id;

        let items = [a, b]
            .into_iter()
            .map(|e| {
                let status = e.resolve_status(&scope, now).unwrap();
                (e, status)
            })
            .collect();
        let (selected, status) = select_relevant(items, now, hours(24)).unwrap();
        assert_eq!(selected.id, expected);
        assert_eq!(status.state, ElectionState::Ongoing);
    }

    #[test]
    fn selects_upcoming_over_recently_ended() {
        let now = Utc::now();
        let scope = Scope::University;
        let mut upcoming = election(scope.clone(), ElectionState::Upcoming);
        upcoming.start_time = now + hours(5);
        upcoming.end_time = now + hours(30);
        let mut ended = election(scope.clone(), ElectionState::Ongoing);
        ended.start_time = now - hours(30);
        ended.end_time = now - hours(2);
        let expected = upcoming.id;

        let items = [upcoming, ended]
            .into_iter()
            .map(|e| {
                let status = e.resolve_status(&scope, now).unwrap();
                (e, status)
            })
            .collect();
        let (selected, _) = select_relevant(items, now, hours(24)).unwrap();
        assert_eq!(selected.id, expected);
    }

    #[test]
    fn recently_ended_shown_within_grace_only() {
        let now = Utc::now();
        let scope = Scope::University;
        let mut e = election(scope.clone(), ElectionState::Ongoing);
        e.start_time = now - hours(30);
        e.end_time = now - hours(2);
        let status = e.resolve_status(&scope, now).unwrap();
        assert_eq!(status.state, ElectionState::Ended);

        let within = select_relevant(vec![(e.clone(), status)], now, hours(24));
        assert!(within.is_some());

        let expired = select_relevant(vec![(e, status)], now, hours(1));
        assert!(expired.is_none());
    }

    #[test]
    fn archived_never_selected() {
        let now = Utc::now();
        let scope = Scope::University;
        let e = election(scope.clone(), ElectionState::Archived);
        let status = e.resolve_status(&scope, now).unwrap();
        assert!(select_relevant(vec![(e, status)], now, hours(24)).is_none());
    }
}
