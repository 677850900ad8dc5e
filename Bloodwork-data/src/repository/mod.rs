// Repository module structure
pub mod errors;
mod bloodwork;
mod in_memory;
mod storage;

// Re-export commonly used types
pub use errors::RepositoryError;
pub use bloodwork::{validate_test_date, BloodworkRepository, BloodworkRepositoryTrait};

// Re-export test doubles for both testing and when mock feature is enabled
#[cfg(any(test, feature = "mock"))]
pub use bloodwork::tests;
