//! Database connection module for the bloodwork tracker
//!
//! Pools are built explicitly from a [`DatabaseConfig`] and handed to the
//! repository layer. Every pooled connection has foreign keys enabled so that
//! deleting a test event cascades to its measurements.

use std::env;
use std::fs;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use r2d2_sqlite::SqliteConnectionManager;
use rusqlite::OpenFlags;
use tracing::{error, info};

use super::migrations::run_sqlite_migrations;
use super::seed::seed_catalog;
use super::DatabaseError;

/// Pool of SQLite connections
pub type SqlitePool = r2d2::Pool<SqliteConnectionManager>;

/// A connection checked out of the pool
pub type PooledConnection = r2d2::PooledConnection<SqliteConnectionManager>;

const DEFAULT_SQLITE_PATH: &str = "data/bloodwork.db";

/// Database connection pool
#[derive(Debug, Clone)]
pub enum DatabasePool {
    /// SQLite connection pool
    SQLite(Arc<SqlitePool>),
}

/// Database configuration
#[derive(Debug, Clone, PartialEq)]
pub struct DatabaseConfig {
    /// Path to SQLite database file
    pub sqlite_path: String,
    /// Maximum number of pooled connections
    pub max_connections: u32,
    /// Connection timeout in seconds
    pub timeout_seconds: u64,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            sqlite_path: DEFAULT_SQLITE_PATH.to_string(),
            max_connections: 10,
            timeout_seconds: 30,
        }
    }
}

impl DatabaseConfig {
    /// Create a database configuration from environment variables
    ///
    /// Reads `DB_SQLITE_PATH`, `DB_MAX_CONNECTIONS` and `DB_TIMEOUT_SECONDS`.
    /// Unset variables fall back to the defaults; malformed ones are rejected.
    pub fn from_env() -> Result<Self, DatabaseError> {
        let defaults = Self::default();

        let sqlite_path = match env::var("DB_SQLITE_PATH") {
            Ok(path) if !path.trim().is_empty() => path,
            _ => {
                info!("No DB_SQLITE_PATH provided, will use default path: {}", DEFAULT_SQLITE_PATH);
                defaults.sqlite_path
            }
        };

        let max_connections = parse_env_var("DB_MAX_CONNECTIONS", defaults.max_connections)?;
        if max_connections == 0 {
            return Err(DatabaseError::ConfigError(
                "DB_MAX_CONNECTIONS must be at least 1".to_string(),
            ));
        }

        let timeout_seconds = parse_env_var("DB_TIMEOUT_SECONDS", defaults.timeout_seconds)?;

        info!(
            "Database configuration: path={}, max_connections={}, timeout={}s",
            sqlite_path, max_connections, timeout_seconds
        );

        Ok(DatabaseConfig {
            sqlite_path,
            max_connections,
            timeout_seconds,
        })
    }
}

fn parse_env_var<T: std::str::FromStr>(name: &str, default: T) -> Result<T, DatabaseError> {
    match env::var(name) {
        Ok(raw) => raw
            .trim()
            .parse::<T>()
            .map_err(|_| DatabaseError::ConfigError(format!("{} must be a number, got '{}'", name, raw))),
        Err(_) => Ok(default),
    }
}

fn connection_manager(manager: SqliteConnectionManager) -> SqliteConnectionManager {
    manager.with_init(|conn| conn.execute_batch("PRAGMA foreign_keys = ON;"))
}

impl DatabasePool {
    /// Open a file-backed SQLite pool, run migrations and seed the catalog
    pub fn connect(config: &DatabaseConfig) -> Result<Self, DatabaseError> {
        info!("Initializing SQLite database at: {}", config.sqlite_path);

        if let Some(parent) = Path::new(&config.sqlite_path).parent() {
            if !parent.as_os_str().is_empty() && !parent.exists() {
                info!("Creating parent directory: {:?}", parent);
                fs::create_dir_all(parent)?;
            }
        }

        let manager = connection_manager(
            SqliteConnectionManager::file(&config.sqlite_path)
                .with_flags(OpenFlags::SQLITE_OPEN_READ_WRITE | OpenFlags::SQLITE_OPEN_CREATE),
        );

        let pool = r2d2::Pool::builder()
            .max_size(config.max_connections)
            .connection_timeout(Duration::from_secs(config.timeout_seconds))
            .build(manager)
            .map_err(|e| {
                error!("Failed to create SQLite connection pool: {}", e);
                DatabaseError::SqlitePoolError(e)
            })?;

        info!("SQLite connection pool created successfully");
        DatabasePool::SQLite(Arc::new(pool)).initialize()
    }

    /// Create a private in-memory SQLite database
    ///
    /// The pool holds a single connection that never expires, otherwise every
    /// checkout would see its own empty database.
    pub fn in_memory() -> Result<Self, DatabaseError> {
        info!("Initializing in-memory SQLite database");

        let pool = r2d2::Pool::builder()
            .max_size(1)
            .idle_timeout(None)
            .max_lifetime(None)
            .build(connection_manager(SqliteConnectionManager::memory()))?;

        DatabasePool::SQLite(Arc::new(pool)).initialize()
    }

    fn initialize(self) -> Result<Self, DatabaseError> {
        let conn = self.connection()?;
        run_sqlite_migrations(&conn).map_err(DatabaseError::MigrationError)?;
        let seeded = seed_catalog(&conn)?;
        if seeded > 0 {
            info!("Seeded measurement catalog with {} definitions", seeded);
        }
        drop(conn);
        Ok(self)
    }

    /// Check a connection out of the pool
    pub fn connection(&self) -> Result<PooledConnection, DatabaseError> {
        match self {
            DatabasePool::SQLite(pool) => Ok(pool.get()?),
        }
    }

    /// Run a trivial query to verify the database answers
    pub fn ping(&self) -> Result<(), DatabaseError> {
        let conn = self.connection()?;
        conn.query_row("SELECT 1", [], |row| row.get::<_, i64>(0))?;
        Ok(())
    }

    /// Describe the database and the pool state
    pub fn connection_info(&self) -> String {
        match self {
            DatabasePool::SQLite(pool) => {
                let location = match pool.get() {
                    Ok(conn) => match conn.query_row("PRAGMA database_list", [], |row| row.get::<_, String>(2)) {
                        Ok(path) if path.is_empty() || path == ":memory:" => "SQLite in-memory database".to_string(),
                        Ok(path) => format!("SQLite database at {}", path),
                        Err(_) => "SQLite database (path unknown)".to_string(),
                    },
                    Err(e) => {
                        error!("Failed to get SQLite connection: {}", e);
                        return format!("SQLite connection error: {}", e);
                    }
                };

                let state = pool.state();
                format!(
                    "{} (connections: active={}, idle={})",
                    location, state.connections, state.idle_connections
                )
            }
        }
    }
}
