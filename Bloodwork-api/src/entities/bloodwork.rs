use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;
use validator::Validate;

use bloodwork_domain::entities::{ConstellationFinding, ReferenceRange, Sex, Status};

/// Query parameters for the catalog
#[derive(Debug, Deserialize, IntoParams, ToSchema)]
pub struct CatalogQueryParams {
    /// Case-insensitive search over names, code and category
    pub q: Option<String>,
}

/// Query parameters for listing test events
#[derive(Debug, Deserialize, Clone, Validate, IntoParams, ToSchema)]
pub struct TestListQueryParams {
    /// Earliest test date, inclusive (YYYY-MM-DD)
    pub start_date: Option<NaiveDate>,

    /// Latest test date, inclusive (YYYY-MM-DD)
    pub end_date: Option<NaiveDate>,

    /// Maximum number of results (default: 50, max: 500)
    #[validate(range(min = 1, max = 500, message = "limit must be between 1 and 500"))]
    pub limit: Option<usize>,

    /// Pagination offset (default: 0)
    pub offset: Option<usize>,
}

/// Classify a value without storing it
#[derive(Debug, Deserialize, Serialize, Validate, ToSchema)]
pub struct ClassifyRequest {
    /// Catalog code, e.g. "GLU"
    #[validate(length(min = 1, max = 20, message = "code must be between 1 and 20 characters"))]
    pub code: String,

    pub value: f64,

    /// Defaults to the configured sex
    pub sex: Option<Sex>,
}

/// Result of a classification
#[derive(Debug, Deserialize, Serialize, ToSchema)]
pub struct ClassifyResponse {
    pub code: String,
    pub value: f64,
    pub unit: String,
    pub status: Status,

    /// Sex the range was chosen for
    pub sex: Sex,

    /// Range the value was compared against; absent when the catalog has none for this sex
    pub reference_range: Option<ReferenceRange>,

    /// German explanation matching the direction of the deviation
    #[serde(skip_serializing_if = "Option::is_none")]
    pub meaning: Option<String>,
}

/// Constellation findings for one test event
#[derive(Debug, Deserialize, Serialize, ToSchema)]
pub struct AnalysisResponse {
    pub test_id: Uuid,
    pub findings: Vec<ConstellationFinding>,
}
