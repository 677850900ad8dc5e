use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

/// Configure Swagger UI endpoints
pub fn configure_swagger_routes() -> SwaggerUi {
    SwaggerUi::new("/api-docs").url("/api-docs/openapi.json", ApiDoc::openapi())
}

// API Documentation
#[derive(OpenApi)]
#[openapi(
    paths(
        // Health endpoints
        crate::api::handlers::health::health_check,

        // Catalog endpoints
        crate::api::handlers::catalog::get_catalog,
        crate::api::handlers::catalog::get_definition,
        crate::api::handlers::catalog::get_value_history,
        crate::api::handlers::catalog::classify_value,

        // Test event endpoints
        crate::api::handlers::test_events::list_tests,
        crate::api::handlers::test_events::create_test,
        crate::api::handlers::test_events::get_test,
        crate::api::handlers::test_events::update_test,
        crate::api::handlers::test_events::delete_test,
        crate::api::handlers::test_events::record_measurement,
        crate::api::handlers::test_events::analyze_test,

        // Measurement endpoints
        crate::api::handlers::measurements::update_measurement,
        crate::api::handlers::measurements::delete_measurement,
    ),
    components(
        schemas(
            // Domain entities
            bloodwork_domain::entities::Status,
            bloodwork_domain::entities::Severity,
            bloodwork_domain::entities::Sex,
            bloodwork_domain::entities::ReferenceRange,
            bloodwork_domain::entities::MeasurementDefinition,
            bloodwork_domain::entities::CatalogCategory,
            bloodwork_domain::entities::TestEvent,
            bloodwork_domain::entities::StatusCounts,
            bloodwork_domain::entities::TestEventSummary,
            bloodwork_domain::entities::TestEventDetail,
            bloodwork_domain::entities::Measurement,
            bloodwork_domain::entities::MeasurementDetail,
            bloodwork_domain::entities::MeasurementInput,
            bloodwork_domain::entities::CreateTestEventRequest,
            bloodwork_domain::entities::UpdateTestEventRequest,
            bloodwork_domain::entities::RecordMeasurementRequest,
            bloodwork_domain::entities::UpdateMeasurementRequest,
            bloodwork_domain::entities::ConstellationFinding,
            bloodwork_domain::entities::HistoryPoint,
            bloodwork_domain::entities::ValueHistory,

            // API entities
            crate::entities::common::ErrorResponse,
            crate::entities::common::TestSummaryPage,
            crate::entities::bloodwork::CatalogQueryParams,
            crate::entities::bloodwork::TestListQueryParams,
            crate::entities::bloodwork::ClassifyRequest,
            crate::entities::bloodwork::ClassifyResponse,
            crate::entities::bloodwork::AnalysisResponse,

            // Health handlers
            crate::api::handlers::health::HealthResponse,
            crate::api::handlers::health::ComponentStatus,
            crate::api::handlers::health::ComponentHealthStatus,
        )
    ),
    tags(
        (name = "health", description = "Health check endpoint"),
        (name = "catalog", description = "Measurement catalog and classification"),
        (name = "tests", description = "Blood test events and their analysis"),
        (name = "measurements", description = "Individual measured values")
    ),
    info(
        title = "Bloodwork API",
        version = "0.1.0",
        description = "Track blood test results, classify values against reference ranges and detect clinical constellations",
        license(
            name = "MIT",
            url = "https://opensource.org/licenses/MIT"
        ),
    ),
    servers(
        (url = "/", description = "Local development server")
    )
)]
pub struct ApiDoc;
