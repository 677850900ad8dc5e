// Testing utilities for the domain layer
// This module is only available when the "mock" feature is enabled

pub use bloodwork_data::repository::tests::UnavailableRepository;

use std::collections::HashMap;

use async_trait::async_trait;
use bloodwork_data::repository::BloodworkRepository;

use crate::config::EvaluationSettings;
use crate::entities::{ClassifiedMeasurement, MeasurementDefinition, Status};
use crate::health::{ComponentStatus, HealthComponent, HealthServiceTrait, SystemHealth, SystemStatus};
use crate::services::bloodwork::BloodworkService;

/// Service over a fresh in-memory repository seeded with the bundled catalog
pub fn create_in_memory_bloodwork_service() -> BloodworkService<BloodworkRepository> {
    let repository = BloodworkRepository::in_memory().expect("bundled catalog must load");
    BloodworkService::new(repository, EvaluationSettings::default())
}

/// Service whose storage fails every call
pub fn create_unavailable_bloodwork_service() -> BloodworkService<UnavailableRepository> {
    BloodworkService::new(UnavailableRepository::new(), EvaluationSettings::default())
}

/// Definition with only a sex-independent range
pub fn definition_with_range(code: &str, category: &str, min: f64, max: f64) -> MeasurementDefinition {
    MeasurementDefinition {
        id: 1,
        code: code.to_string(),
        name_de: code.to_string(),
        name_en: code.to_string(),
        description_de: String::new(),
        description_en: String::new(),
        unit: "mg/dl".to_string(),
        category: category.to_string(),
        min_male: None,
        max_male: None,
        min_female: None,
        max_female: None,
        min_normal: Some(min),
        max_normal: Some(max),
        critical_low: None,
        critical_high: None,
        high_meaning_de: None,
        high_meaning_en: None,
        low_meaning_de: None,
        low_meaning_en: None,
        sort_order: 0,
    }
}

pub fn classified(category: &str, code: &str, value: f64, status: Status) -> ClassifiedMeasurement {
    ClassifiedMeasurement::new(category, code, value, status)
}

/// Mock implementation of health services for testing system health
#[derive(Debug)]
pub struct MockHealthService {
    database_status: ComponentStatus,
    system_status: SystemStatus,
    components: HashMap<String, HealthComponent>,
}

impl Default for MockHealthService {
    fn default() -> Self {
        Self::new()
    }
}

impl MockHealthService {
    /// Create a new mock health service with all components healthy
    pub fn new() -> Self {
        Self {
            database_status: ComponentStatus::Healthy,
            system_status: SystemStatus::Healthy,
            components: HashMap::new(),
        }
    }

    /// Database missing, data kept in memory
    pub fn with_degraded_database(mut self) -> Self {
        self.database_status = ComponentStatus::Degraded;
        self.system_status = SystemStatus::Degraded;
        self
    }

    pub fn with_unhealthy_database(mut self) -> Self {
        self.database_status = ComponentStatus::Unhealthy;
        self.system_status = SystemStatus::Unhealthy;
        self
    }

    /// Add a custom component with a specific status
    pub fn with_component(mut self, name: &str, status: ComponentStatus, details: Option<String>) -> Self {
        self.components.insert(name.to_string(), HealthComponent { status, details });
        self
    }
}

#[async_trait]
impl HealthServiceTrait for MockHealthService {
    async fn get_system_health(&self) -> SystemHealth {
        let mut components = HashMap::new();
        components.insert(
            "database".to_string(),
            HealthComponent {
                status: self.database_status.clone(),
                details: match self.database_status {
                    ComponentStatus::Healthy => None,
                    ComponentStatus::Degraded => Some("No database configured, data is kept in memory only".to_string()),
                    ComponentStatus::Unhealthy => Some("Database connection failed".to_string()),
                },
            },
        );

        for (name, component) in &self.components {
            components.insert(name.clone(), component.clone());
        }

        SystemHealth {
            status: self.system_status.clone(),
            components,
        }
    }

    async fn check_database_status(&self) -> Result<bool, String> {
        match self.database_status {
            ComponentStatus::Healthy => Ok(true),
            ComponentStatus::Degraded => Ok(false),
            ComponentStatus::Unhealthy => Err("Database connection failed".to_string()),
        }
    }
}

/// Factory function to create a mock health service
pub fn create_mock_health_service() -> MockHealthService {
    MockHealthService::new()
}
