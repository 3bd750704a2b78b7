use chrono::{serde::ts_seconds, DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::model::common::{College, StudentId};

/// The caller's role, as asserted by the identity provider.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Role {
    /// An enrolled student; may vote within their own scope slice.
    Voter,
    /// A university-wide election officer; may read any scope slice but
    /// never votes.
    Officer,
}

/// Claims of the identity token issued by the external identity provider.
/// This server verifies and consumes these; it never issues them.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IdentityClaims {
    /// The student number.
    pub sub: StudentId,
    #[serde(rename = "rol")]
    pub role: Role,
    /// The caller's college, absent for university-wide roles.
    #[serde(rename = "clg", default, skip_serializing_if = "Option::is_none")]
    pub college: Option<College>,
    #[serde(rename = "exp", with = "ts_seconds")]
    pub expire_at: DateTime<Utc>,
}
