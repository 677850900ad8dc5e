//! System health checks

use std::collections::HashMap;

use async_trait::async_trait;
use bloodwork_data::database::DatabasePool;
use tracing::warn;

/// System health status
#[derive(Debug, Clone, PartialEq)]
pub enum SystemStatus {
    /// All components are healthy
    Healthy,
    /// Some components are degraded but the system is functional
    Degraded,
    /// System is not functioning properly
    Unhealthy,
}

/// Component health status
#[derive(Debug, Clone, PartialEq)]
pub enum ComponentStatus {
    Healthy,
    Degraded,
    Unhealthy,
}

/// A health component with status and optional details
#[derive(Debug, Clone)]
pub struct HealthComponent {
    pub status: ComponentStatus,
    pub details: Option<String>,
}

/// Overall health of the system
#[derive(Debug, Clone)]
pub struct SystemHealth {
    pub status: SystemStatus,
    /// Component name to component health
    pub components: HashMap<String, HealthComponent>,
}

/// Trait for health services
#[async_trait]
pub trait HealthServiceTrait: Send + Sync + std::fmt::Debug {
    /// Get the overall system health
    async fn get_system_health(&self) -> SystemHealth;

    /// Check the status of the database
    /// Returns true if the database is healthy, false if not
    /// Returns an error if the check could not be performed
    async fn check_database_status(&self) -> Result<bool, String>;
}

/// Check the database behind the repository
///
/// Returns:
/// - Ok(true) if the pool answers queries
/// - Ok(false) if there is no database and data only lives in memory
/// - Err if the pool exists but cannot be queried
pub async fn check_database_status(pool: Option<&DatabasePool>) -> Result<bool, String> {
    match pool {
        Some(pool) => pool
            .ping()
            .map(|_| true)
            .map_err(|e| format!("Database connection error: {}", e)),
        None => Ok(false),
    }
}

fn database_component(status: Result<bool, String>) -> HealthComponent {
    match status {
        Ok(true) => HealthComponent {
            status: ComponentStatus::Healthy,
            details: None,
        },
        Ok(false) => HealthComponent {
            status: ComponentStatus::Degraded,
            details: Some("No database configured, data is kept in memory only".to_string()),
        },
        Err(e) => HealthComponent {
            status: ComponentStatus::Unhealthy,
            details: Some(e),
        },
    }
}

/// Get overall system health
pub async fn get_system_health(pool: Option<&DatabasePool>) -> SystemHealth {
    let db_component = database_component(check_database_status(pool).await);

    let overall_status = match db_component.status {
        ComponentStatus::Unhealthy => SystemStatus::Unhealthy,
        ComponentStatus::Degraded => SystemStatus::Degraded,
        ComponentStatus::Healthy => SystemStatus::Healthy,
    };

    if overall_status != SystemStatus::Healthy {
        warn!("System health is {:?}: {:?}", overall_status, db_component.details);
    }

    SystemHealth {
        status: overall_status,
        components: vec![("database".to_string(), db_component)].into_iter().collect(),
    }
}

/// Health service reporting on an optional database pool
#[derive(Debug, Clone)]
pub struct HealthService {
    pool: Option<DatabasePool>,
}

impl HealthService {
    /// `None` means the application runs on the in-memory repository
    pub fn new(pool: Option<DatabasePool>) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl HealthServiceTrait for HealthService {
    async fn get_system_health(&self) -> SystemHealth {
        get_system_health(self.pool.as_ref()).await
    }

    async fn check_database_status(&self) -> Result<bool, String> {
        check_database_status(self.pool.as_ref()).await
    }
}
