use serde::{Deserialize, Serialize};

#[cfg(feature = "with-api")]
use utoipa::ToSchema;

use super::status::Severity;

/// A clinical pattern recognised across several values of one test event
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "with-api", derive(ToSchema))]
pub struct ConstellationFinding {
    pub title: String,
    pub description: String,
    pub severity: Severity,

    /// Codes of the values that triggered the finding
    pub affected_codes: Vec<String>,

    pub recommendations: Vec<String>,
}
