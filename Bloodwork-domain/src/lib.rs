// Bloodwork Domain
// Classification of lab values, constellation analysis and the service layer around them

// Services that implement business logic
pub mod services;

// Domain entities
pub mod entities;

// Evaluation settings
pub mod config;

// Health checks and system status
pub mod health;

// Re-export the database module from the data crate for convenience
pub use bloodwork_data::database;

// Testing utilities - only available with mock feature
#[cfg(feature = "mock")]
pub mod testing;
