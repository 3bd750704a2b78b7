use serde::{Deserialize, Serialize};

use crate::model::common::{College, StudentId};

/// One entry of the eligible-voter roll, maintained by the registrar
/// integration. Read here only for turnout denominators.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EligibleVoter {
    pub student_id: StudentId,
    /// None for students outside any college (university-wide staff roles).
    pub college: Option<College>,
}
