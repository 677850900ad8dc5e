// Domain services
// Pure classification and analysis, plus the service that applies them to stored data.
pub mod bloodwork;
pub mod constellation;
pub mod evaluator;

// Re-export service traits and factory functions
pub use bloodwork::{create_default_bloodwork_service, BloodworkService, BloodworkServiceError, BloodworkServiceTrait};
pub use constellation::analyze;
pub use evaluator::{applicable_range, classify};

#[cfg(feature = "mock")]
pub use crate::testing::create_in_memory_bloodwork_service;
