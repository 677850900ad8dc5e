// Bloodwork API
//
// HTTP adapter over the bloodwork domain services: routing, handlers,
// request/response entities and the OpenAPI document.

pub mod api;
pub mod entities;
pub mod openapi;

pub use api::create_app;
pub use api::handlers::BloodworkService;
