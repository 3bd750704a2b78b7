use std::fmt::{Display, Formatter};

use mongodb::bson::{doc, to_bson, Bson, Document};
use serde::{Deserialize, Serialize};

/// A college within the university, identified by its short name.
#[derive(Debug, Clone, Hash, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct College(pub String);

impl College {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Display for College {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for College {
    fn from(name: &str) -> Self {
        Self(name.to_string())
    }
}

/// The scope of an election, position, partylist, or query: either the
/// university-wide student council (USC) or one college's council (CSC).
///
/// This is deliberately a two-case variant rather than a nullable college
/// field, so "university-wide" can never be confused with a missing value.
#[derive(Debug, Clone, Hash, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "college")]
pub enum Scope {
    University,
    College(College),
}

impl Scope {
    /// Does this scope contain the other?
    /// The university scope contains every scope; a college scope contains
    /// only itself.
    pub fn includes(&self, other: &Scope) -> bool {
        match self {
            Scope::University => true,
            Scope::College(college) => {
                matches!(other, Scope::College(other) if other == college)
            }
        }
    }

    /// Filter for documents whose `scope` field is visible from this query
    /// scope: university-wide documents are visible to everyone, college
    /// documents only to their own college.
    pub fn visibility_filter(&self) -> Document {
        match self {
            Scope::University => doc! {
                "scope.type": "University",
            },
            Scope::College(college) => doc! {
                "$or": [
                    {"scope.type": "University"},
                    {"scope.type": "College", "scope.college": college.as_str()},
                ],
            },
        }
    }
}

impl Display for Scope {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Scope::University => write!(f, "university"),
            Scope::College(college) => write!(f, "college:{college}"),
        }
    }
}

impl From<Scope> for Bson {
    fn from(scope: Scope) -> Self {
        to_bson(&scope).expect("Serialisation is infallible")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn university_includes_all() {
        let university = Scope::University;
        let college = Scope::College("engineering".into());
        assert!(university.includes(&university));
        assert!(university.includes(&college));
    }

    #[test]
    fn college_includes_only_itself() {
        let engineering = Scope::College("engineering".into());
        let sciences = Scope::College("sciences".into());
        assert!(engineering.includes(&engineering));
        assert!(!engineering.includes(&sciences));
        assert!(!engineering.includes(&Scope::University));
    }
}
