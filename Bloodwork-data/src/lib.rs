// Bloodwork Data
// Storage for the measurement catalog, test events and their measurements

// Database connection management
pub mod database;

// Repository implementations for data access
pub mod repository;

// Data storage models
pub mod models;
