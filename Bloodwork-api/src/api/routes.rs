use std::sync::Arc;
use std::time::Duration;

use axum::{
    http::{header, HeaderName, HeaderValue, Method},
    routing::{get, post, put},
    Extension, Router,
};
use tower::ServiceBuilder;
use tower_http::{
    cors::{Any, CorsLayer},
    set_header::SetResponseHeaderLayer,
    trace::TraceLayer,
};
use tracing::debug;

use bloodwork_domain::health::HealthServiceTrait;

use crate::api::handlers::{self, catalog, health, measurements, test_events, BloodworkService};
use crate::openapi::configure_swagger_routes;

/// Create the application router
pub fn create_app(service: BloodworkService, health_service: Arc<dyn HealthServiceTrait + Send + Sync>) -> Router {
    debug!("Creating application router");

    let api_routes = Router::new()
        .route("/catalog", get(catalog::get_catalog))
        .route("/catalog/:id", get(catalog::get_definition))
        .route("/catalog/:id/history", get(catalog::get_value_history))
        .route("/classify", post(catalog::classify_value))
        .route("/tests", get(test_events::list_tests).post(test_events::create_test))
        .route(
            "/tests/:id",
            get(test_events::get_test)
                .put(test_events::update_test)
                .delete(test_events::delete_test),
        )
        .route("/tests/:id/measurements", post(test_events::record_measurement))
        .route("/tests/:id/analysis", get(test_events::analyze_test))
        .route(
            "/measurements/:id",
            put(measurements::update_measurement).delete(measurements::delete_measurement),
        );

    let public_routes = Router::new()
        .route("/health", get(handlers::health_check))
        .layer(Extension(health_service));

    let app = Router::new()
        .merge(public_routes)
        .nest("/api/v1", api_routes)
        .with_state(service);

    let app = add_swagger_ui(app);

    health::initialize_server_start_time();
    configure_middleware(app)
}

/// Add Swagger UI to the router
pub fn add_swagger_ui(app: Router) -> Router {
    app.merge(configure_swagger_routes())
}

/// CORS, security headers and request tracing for the whole application
pub fn configure_middleware(app: Router) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE])
        .allow_headers([header::CONTENT_TYPE, header::ACCEPT])
        .max_age(Duration::from_secs(3600));

    let security_headers = ServiceBuilder::new()
        .layer(SetResponseHeaderLayer::if_not_present(
            header::X_CONTENT_TYPE_OPTIONS,
            HeaderValue::from_static("nosniff"),
        ))
        .layer(SetResponseHeaderLayer::if_not_present(
            header::X_FRAME_OPTIONS,
            HeaderValue::from_static("DENY"),
        ))
        .layer(SetResponseHeaderLayer::if_not_present(
            HeaderName::from_static("referrer-policy"),
            HeaderValue::from_static("no-referrer"),
        ));

    app.layer(cors).layer(security_headers).layer(TraceLayer::new_for_http())
}
