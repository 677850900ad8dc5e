// HTTP handlers and routing
pub mod extract;
pub mod handlers;
pub mod routes;

pub use routes::create_app;
