use axum::{extract::State, http::StatusCode, response::IntoResponse, Json};
use tracing::{info, instrument};
use uuid::Uuid;
use validator::Validate;

use bloodwork_domain::entities::{
    CreateTestEventRequest, MeasurementDetail, RecordMeasurementRequest, TestEvent, TestEventDetail,
    UpdateTestEventRequest,
};

use super::BloodworkService;
use crate::api::extract::{ApiJson, ApiPath, ApiQuery};
use crate::entities::bloodwork::{AnalysisResponse, TestListQueryParams};
use crate::entities::common::{ErrorResponse, PaginatedResponse, TestSummaryPage};

const DEFAULT_PAGE_SIZE: usize = 50;

/// List test events, newest first
#[utoipa::path(
    get,
    path = "/api/v1/tests",
    params(TestListQueryParams),
    responses(
        (status = 200, description = "Test events with status counts", body = TestSummaryPage),
        (status = 400, description = "Invalid query", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse),
    ),
    tag = "tests"
)]
#[instrument(skip(service))]
pub async fn list_tests(
    State(service): State<BloodworkService>,
    ApiQuery(params): ApiQuery<TestListQueryParams>,
) -> Result<impl IntoResponse, ErrorResponse> {
    params.validate()?;
    let limit = params.limit.unwrap_or(DEFAULT_PAGE_SIZE);
    let offset = params.offset.unwrap_or(0);

    let summaries = service.list_tests(params.start_date, params.end_date).await?;

    let mut query = Vec::new();
    if let Some(start) = params.start_date {
        query.push(("start_date", start.to_string()));
    }
    if let Some(end) = params.end_date {
        query.push(("end_date", end.to_string()));
    }

    let page = PaginatedResponse::page(&summaries, limit, offset, "/api/v1/tests", &query);
    Ok((StatusCode::OK, Json(page)))
}

/// Record a test event with its values
#[utoipa::path(
    post,
    path = "/api/v1/tests",
    request_body = CreateTestEventRequest,
    responses(
        (status = 201, description = "Test event created", body = TestEventDetail),
        (status = 400, description = "Invalid request", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse),
    ),
    tag = "tests"
)]
#[instrument(skip(service, request))]
pub async fn create_test(
    State(service): State<BloodworkService>,
    ApiJson(request): ApiJson<CreateTestEventRequest>,
) -> Result<impl IntoResponse, ErrorResponse> {
    info!("Creating test event for {} with {} values", request.test_date, request.measurements.len());
    let detail = service.create_test(request).await?;
    Ok((StatusCode::CREATED, Json(detail)))
}

/// Get a test event with all of its values
#[utoipa::path(
    get,
    path = "/api/v1/tests/{id}",
    params(
        ("id" = Uuid, Path, description = "Test event ID")
    ),
    responses(
        (status = 200, description = "Test event found", body = TestEventDetail),
        (status = 404, description = "Test event not found", body = ErrorResponse),
    ),
    tag = "tests"
)]
#[instrument(skip(service))]
pub async fn get_test(
    State(service): State<BloodworkService>,
    ApiPath(id): ApiPath<Uuid>,
) -> Result<impl IntoResponse, ErrorResponse> {
    let detail = service.get_test(&id.to_string()).await?;
    Ok((StatusCode::OK, Json(detail)))
}

/// Replace the metadata of a test event
#[utoipa::path(
    put,
    path = "/api/v1/tests/{id}",
    params(
        ("id" = Uuid, Path, description = "Test event ID")
    ),
    request_body = UpdateTestEventRequest,
    responses(
        (status = 200, description = "Test event updated", body = TestEvent),
        (status = 400, description = "Invalid request", body = ErrorResponse),
        (status = 404, description = "Test event not found", body = ErrorResponse),
    ),
    tag = "tests"
)]
#[instrument(skip(service, request))]
pub async fn update_test(
    State(service): State<BloodworkService>,
    ApiPath(id): ApiPath<Uuid>,
    ApiJson(request): ApiJson<UpdateTestEventRequest>,
) -> Result<impl IntoResponse, ErrorResponse> {
    let test = service.update_test(&id.to_string(), request).await?;
    Ok((StatusCode::OK, Json(test)))
}

/// Delete a test event and its values
#[utoipa::path(
    delete,
    path = "/api/v1/tests/{id}",
    params(
        ("id" = Uuid, Path, description = "Test event ID")
    ),
    responses(
        (status = 204, description = "Test event deleted"),
        (status = 404, description = "Test event not found", body = ErrorResponse),
    ),
    tag = "tests"
)]
#[instrument(skip(service))]
pub async fn delete_test(
    State(service): State<BloodworkService>,
    ApiPath(id): ApiPath<Uuid>,
) -> Result<impl IntoResponse, ErrorResponse> {
    service.delete_test(&id.to_string()).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// Add a value to a test event, replacing any value for the same definition
#[utoipa::path(
    post,
    path = "/api/v1/tests/{id}/measurements",
    params(
        ("id" = Uuid, Path, description = "Test event ID")
    ),
    request_body = RecordMeasurementRequest,
    responses(
        (status = 200, description = "Value stored and classified", body = MeasurementDetail),
        (status = 400, description = "Invalid request", body = ErrorResponse),
        (status = 404, description = "Test event not found", body = ErrorResponse),
    ),
    tag = "tests"
)]
#[instrument(skip(service, request))]
pub async fn record_measurement(
    State(service): State<BloodworkService>,
    ApiPath(id): ApiPath<Uuid>,
    ApiJson(request): ApiJson<RecordMeasurementRequest>,
) -> Result<impl IntoResponse, ErrorResponse> {
    let detail = service.record_measurement(&id.to_string(), request).await?;
    Ok((StatusCode::OK, Json(detail)))
}

/// Run the constellation analysis over a stored test event
#[utoipa::path(
    get,
    path = "/api/v1/tests/{id}/analysis",
    params(
        ("id" = Uuid, Path, description = "Test event ID")
    ),
    responses(
        (status = 200, description = "Findings in rule order", body = AnalysisResponse),
        (status = 404, description = "Test event not found", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse),
    ),
    tag = "tests"
)]
#[instrument(skip(service))]
pub async fn analyze_test(
    State(service): State<BloodworkService>,
    ApiPath(id): ApiPath<Uuid>,
) -> Result<impl IntoResponse, ErrorResponse> {
    let findings = service.analyze_test(&id.to_string()).await?;
    Ok((StatusCode::OK, Json(AnalysisResponse { test_id: id, findings })))
}
