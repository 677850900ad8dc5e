use std::sync::Arc;

use bloodwork_domain::services::BloodworkServiceTrait;

pub mod catalog;
pub mod health;
pub mod measurements;
pub mod test_events;

// Tests module
#[cfg(test)]
mod tests;

/// Service type for dependency injection
pub type BloodworkService = Arc<dyn BloodworkServiceTrait + Send + Sync>;

// Re-export handlers for easier imports
pub use catalog::{classify_value, get_catalog, get_definition, get_value_history};
pub use health::health_check;
pub use measurements::{delete_measurement, update_measurement};
pub use test_events::{analyze_test, create_test, delete_test, get_test, list_tests, record_measurement, update_test};
