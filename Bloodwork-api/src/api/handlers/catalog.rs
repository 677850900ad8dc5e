use axum::{extract::State, http::StatusCode, response::IntoResponse, Json};
use tracing::{debug, info, instrument};
use validator::Validate;

use bloodwork_domain::entities::{CatalogCategory, MeasurementDefinition, Status, ValueHistory};
use bloodwork_domain::services::applicable_range;

use super::BloodworkService;
use crate::api::extract::{ApiJson, ApiPath, ApiQuery};
use crate::entities::bloodwork::{CatalogQueryParams, ClassifyRequest, ClassifyResponse};
use crate::entities::common::ErrorResponse;

/// Get the catalog grouped by category
#[utoipa::path(
    get,
    path = "/api/v1/catalog",
    params(CatalogQueryParams),
    responses(
        (status = 200, description = "Catalog grouped by category", body = [CatalogCategory]),
        (status = 500, description = "Internal server error", body = ErrorResponse),
    ),
    tag = "catalog"
)]
#[instrument(skip(service))]
pub async fn get_catalog(
    State(service): State<BloodworkService>,
    ApiQuery(params): ApiQuery<CatalogQueryParams>,
) -> Result<impl IntoResponse, ErrorResponse> {
    let catalog = service.get_catalog(params.q).await?;
    debug!("Catalog request returned {} categories", catalog.len());
    Ok((StatusCode::OK, Json(catalog)))
}

/// Get one catalog definition
#[utoipa::path(
    get,
    path = "/api/v1/catalog/{id}",
    params(
        ("id" = i64, Path, description = "Catalog definition ID")
    ),
    responses(
        (status = 200, description = "Definition found", body = MeasurementDefinition),
        (status = 404, description = "Definition not found", body = ErrorResponse),
    ),
    tag = "catalog"
)]
#[instrument(skip(service))]
pub async fn get_definition(
    State(service): State<BloodworkService>,
    ApiPath(id): ApiPath<i64>,
) -> Result<impl IntoResponse, ErrorResponse> {
    let definition = service.get_definition(id).await?;
    Ok((StatusCode::OK, Json(definition)))
}

/// Get all stored values of one definition, oldest first
#[utoipa::path(
    get,
    path = "/api/v1/catalog/{id}/history",
    params(
        ("id" = i64, Path, description = "Catalog definition ID")
    ),
    responses(
        (status = 200, description = "Value history", body = ValueHistory),
        (status = 404, description = "Definition not found", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse),
    ),
    tag = "catalog"
)]
#[instrument(skip(service))]
pub async fn get_value_history(
    State(service): State<BloodworkService>,
    ApiPath(id): ApiPath<i64>,
) -> Result<impl IntoResponse, ErrorResponse> {
    let history = service.value_history(id).await?;
    Ok((StatusCode::OK, Json(history)))
}

/// Classify a value against the catalog without storing it
#[utoipa::path(
    post,
    path = "/api/v1/classify",
    request_body = ClassifyRequest,
    responses(
        (status = 200, description = "Value classified", body = ClassifyResponse),
        (status = 400, description = "Invalid request", body = ErrorResponse),
        (status = 404, description = "Unknown catalog code", body = ErrorResponse),
    ),
    tag = "catalog"
)]
#[instrument(skip(service))]
pub async fn classify_value(
    State(service): State<BloodworkService>,
    ApiJson(request): ApiJson<ClassifyRequest>,
) -> Result<impl IntoResponse, ErrorResponse> {
    request.validate()?;

    let definition = service.get_definition_by_code(&request.code).await?;
    let sex = request.sex.unwrap_or_else(|| service.default_sex());
    let status = service.classify_value(request.value, &definition, sex);
    info!("Classified {} = {} as {}", definition.code, request.value, status);

    let meaning = match status {
        Status::High | Status::CriticalHigh => definition.high_meaning_de.clone(),
        Status::Low | Status::CriticalLow => definition.low_meaning_de.clone(),
        Status::Normal => None,
    };

    Ok((
        StatusCode::OK,
        Json(ClassifyResponse {
            reference_range: applicable_range(&definition, sex),
            code: definition.code,
            value: request.value,
            unit: definition.unit,
            status,
            sex,
            meaning,
        }),
    ))
}
