use thiserror::Error;

// Database modules
pub mod connection;
pub mod migrations;
pub mod seed;

// Re-export database connection types
pub use connection::*;

/// Database error enum
#[derive(Debug, Error)]
pub enum DatabaseError {
    /// SQLite error
    #[error("SQLite error: {0}")]
    SqliteError(#[from] rusqlite::Error),

    /// SQLite connection pool error
    #[error("SQLite connection pool error: {0}")]
    SqlitePoolError(#[from] r2d2::Error),

    /// Configuration error
    #[error("Database configuration error: {0}")]
    ConfigError(String),

    /// Migration error
    #[error("Database migration error: {0}")]
    MigrationError(String),

    /// The bundled catalog could not be parsed
    #[error("Catalog seed error: {0}")]
    SeedError(#[from] serde_json::Error),

    /// Filesystem error while preparing the database location
    #[error("Database I/O error: {0}")]
    Io(#[from] std::io::Error),
}
