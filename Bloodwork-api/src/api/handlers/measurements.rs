use axum::{extract::State, http::StatusCode, response::IntoResponse, Json};
use tracing::instrument;
use uuid::Uuid;

use bloodwork_domain::entities::{MeasurementDetail, UpdateMeasurementRequest};

use super::BloodworkService;
use crate::api::extract::{ApiJson, ApiPath};
use crate::entities::common::ErrorResponse;

/// Correct a stored value; the status is recomputed
#[utoipa::path(
    put,
    path = "/api/v1/measurements/{id}",
    params(
        ("id" = Uuid, Path, description = "Measurement ID")
    ),
    request_body = UpdateMeasurementRequest,
    responses(
        (status = 200, description = "Value updated", body = MeasurementDetail),
        (status = 400, description = "Invalid request", body = ErrorResponse),
        (status = 404, description = "Measurement not found", body = ErrorResponse),
    ),
    tag = "measurements"
)]
#[instrument(skip(service, request))]
pub async fn update_measurement(
    State(service): State<BloodworkService>,
    ApiPath(id): ApiPath<Uuid>,
    ApiJson(request): ApiJson<UpdateMeasurementRequest>,
) -> Result<impl IntoResponse, ErrorResponse> {
    let detail = service.update_measurement(&id.to_string(), request).await?;
    Ok((StatusCode::OK, Json(detail)))
}

#[utoipa::path(
    delete,
    path = "/api/v1/measurements/{id}",
    params(
        ("id" = Uuid, Path, description = "Measurement ID")
    ),
    responses(
        (status = 204, description = "Measurement deleted"),
        (status = 404, description = "Measurement not found", body = ErrorResponse),
    ),
    tag = "measurements"
)]
#[instrument(skip(service))]
pub async fn delete_measurement(
    State(service): State<BloodworkService>,
    ApiPath(id): ApiPath<Uuid>,
) -> Result<impl IntoResponse, ErrorResponse> {
    service.delete_measurement(&id.to_string()).await?;
    Ok(StatusCode::NO_CONTENT)
}
