use axum::{
    extract::rejection::{JsonRejection, PathRejection, QueryRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use tracing::{error, warn};
use utoipa::ToSchema;
use validator::ValidationErrors;

use bloodwork_domain::entities::TestEventSummary;
use bloodwork_domain::services::BloodworkServiceError;

/// Error response format for API
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ErrorResponse {
    /// Error type/code - machine-readable identifier
    pub error: String,

    /// Human-readable error message
    pub message: String,

    /// Optional additional details about the error
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<serde_json::Value>,
}

impl ErrorResponse {
    pub fn not_found(message: &str) -> Self {
        Self {
            error: "not_found".to_string(),
            message: message.to_string(),
            details: None,
        }
    }

    pub fn validation_error(message: &str, details: Option<serde_json::Value>) -> Self {
        Self {
            error: "validation_error".to_string(),
            message: message.to_string(),
            details,
        }
    }

    pub fn bad_request(message: &str) -> Self {
        Self {
            error: "bad_request".to_string(),
            message: message.to_string(),
            details: None,
        }
    }

    /// Internal failures never leak their cause to the client
    pub fn internal_error() -> Self {
        Self {
            error: "internal_error".to_string(),
            message: "An unexpected error occurred".to_string(),
            details: None,
        }
    }

    pub fn status_code(&self) -> StatusCode {
        match self.error.as_str() {
            "not_found" => StatusCode::NOT_FOUND,
            "validation_error" | "bad_request" => StatusCode::BAD_REQUEST,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ErrorResponse {
    fn into_response(self) -> Response {
        (self.status_code(), Json(self)).into_response()
    }
}

impl From<BloodworkServiceError> for ErrorResponse {
    fn from(err: BloodworkServiceError) -> Self {
        match err {
            BloodworkServiceError::NotFound(msg) => ErrorResponse::not_found(&msg),
            BloodworkServiceError::ValidationError(msg) => {
                warn!("Rejected request: {}", msg);
                ErrorResponse::validation_error(&msg, None)
            }
            BloodworkServiceError::RepositoryError(_) | BloodworkServiceError::CorruptRecord(_) => {
                error!("Request failed: {}", err);
                ErrorResponse::internal_error()
            }
        }
    }
}

impl From<ValidationErrors> for ErrorResponse {
    fn from(errors: ValidationErrors) -> Self {
        let details = serde_json::to_value(errors.field_errors()).ok();
        ErrorResponse::validation_error("Request validation failed", details)
    }
}

impl From<JsonRejection> for ErrorResponse {
    fn from(rejection: JsonRejection) -> Self {
        warn!("Rejected request body: {}", rejection.body_text());
        ErrorResponse::bad_request(&rejection.body_text())
    }
}

impl From<PathRejection> for ErrorResponse {
    fn from(rejection: PathRejection) -> Self {
        ErrorResponse::bad_request(&rejection.body_text())
    }
}

impl From<QueryRejection> for ErrorResponse {
    fn from(rejection: QueryRejection) -> Self {
        ErrorResponse::bad_request(&rejection.body_text())
    }
}

/// Paginated response format
#[derive(Debug, Serialize, Deserialize, ToSchema)]
#[aliases(TestSummaryPage = PaginatedResponse<TestEventSummary>)]
pub struct PaginatedResponse<T> {
    /// Total count of items available
    pub total_count: usize,

    pub offset: usize,
    pub limit: usize,

    /// URL for the next page
    #[serde(skip_serializing_if = "Option::is_none")]
    pub next: Option<String>,

    /// URL for the previous page
    #[serde(skip_serializing_if = "Option::is_none")]
    pub previous: Option<String>,

    pub data: Vec<T>,
}

impl<T: Clone> PaginatedResponse<T> {
    /// Cut one page out of `items`; `query` holds the filter parameters to carry into the links
    pub fn page(items: &[T], limit: usize, offset: usize, base_url: &str, query: &[(&str, String)]) -> Self {
        let total_count = items.len();
        let data = items.iter().skip(offset).take(limit).cloned().collect();
        let (next, previous) = generate_pagination_links(total_count, limit, offset, base_url, query);
        Self {
            total_count,
            offset,
            limit,
            next,
            previous,
            data,
        }
    }
}

fn page_url(base_url: &str, query: &[(&str, String)], limit: usize, offset: usize) -> String {
    let mut parts: Vec<String> = query.iter().map(|(key, value)| format!("{}={}", key, value)).collect();
    parts.push(format!("limit={}", limit));
    parts.push(format!("offset={}", offset));
    format!("{}?{}", base_url, parts.join("&"))
}

/// Links to the neighbouring pages, if there are any
pub fn generate_pagination_links(
    total_count: usize,
    limit: usize,
    offset: usize,
    base_url: &str,
    query: &[(&str, String)],
) -> (Option<String>, Option<String>) {
    let next = if offset.saturating_add(limit) < total_count {
        Some(page_url(base_url, query, limit, offset.saturating_add(limit)))
    } else {
        None
    };

    let previous = if offset > 0 {
        Some(page_url(base_url, query, limit, offset.saturating_sub(limit)))
    } else {
        None
    };

    (next, previous)
}
