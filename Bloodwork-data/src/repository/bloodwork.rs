use async_trait::async_trait;
use chrono::{NaiveDate, Utc};
use tracing::debug;
use uuid::Uuid;

use crate::database::seed::load_catalog_seed;
use crate::database::DatabasePool;
use crate::models::{
    HistoryPointRecord, MeasurementDefinitionRecord, MeasurementRecord, MeasurementWithDefinitionRecord,
    NewMeasurementRecord, NewTestEventRecord, StatusCountRecord, TestEventRecord,
};
use super::errors::RepositoryError;
use super::in_memory::InMemoryStorage;
use super::storage::DatabaseStorage;

/// Repository trait for the catalog, test events and measurements
#[async_trait]
pub trait BloodworkRepositoryTrait {
    /// All catalog definitions ordered by category, sort order and German name
    async fn list_definitions(&self) -> Result<Vec<MeasurementDefinitionRecord>, RepositoryError>;

    /// Definitions whose names, code or category contain the query (case-insensitive)
    async fn search_definitions(&self, query: &str) -> Result<Vec<MeasurementDefinitionRecord>, RepositoryError>;

    async fn get_definition(&self, id: i64) -> Result<Option<MeasurementDefinitionRecord>, RepositoryError>;

    async fn get_definition_by_code(&self, code: &str) -> Result<Option<MeasurementDefinitionRecord>, RepositoryError>;

    /// Create a test event together with its measurements; either all rows are stored or none
    async fn create_test(
        &self,
        test: NewTestEventRecord,
        measurements: Vec<NewMeasurementRecord>,
    ) -> Result<(TestEventRecord, Vec<MeasurementRecord>), RepositoryError>;

    async fn get_test(&self, id: Uuid) -> Result<Option<TestEventRecord>, RepositoryError>;

    /// Test events newest first, optionally bounded by inclusive YYYY-MM-DD dates
    async fn list_tests(
        &self,
        start_date: Option<String>,
        end_date: Option<String>,
    ) -> Result<Vec<TestEventRecord>, RepositoryError>;

    /// Measurement counts per (test, status) for the test events `list_tests` returns with the same bounds
    async fn status_counts(
        &self,
        start_date: Option<String>,
        end_date: Option<String>,
    ) -> Result<Vec<StatusCountRecord>, RepositoryError>;

    /// Replace the metadata of a test event
    async fn update_test(&self, id: Uuid, update: NewTestEventRecord) -> Result<Option<TestEventRecord>, RepositoryError>;

    /// Delete a test event and, with it, its measurements
    async fn delete_test(&self, id: Uuid) -> Result<bool, RepositoryError>;

    /// Insert a measurement, or replace the one stored for the same (test, definition) pair
    async fn upsert_measurement(&self, test_id: Uuid, input: NewMeasurementRecord) -> Result<MeasurementRecord, RepositoryError>;

    async fn get_measurement(&self, id: Uuid) -> Result<Option<MeasurementRecord>, RepositoryError>;

    async fn update_measurement(
        &self,
        id: Uuid,
        value: f64,
        status: String,
        notes: Option<String>,
    ) -> Result<Option<MeasurementRecord>, RepositoryError>;

    async fn delete_measurement(&self, id: Uuid) -> Result<bool, RepositoryError>;

    /// Every measurement of a test joined with its definition, taken from one consistent read
    async fn measurements_for_test(&self, test_id: Uuid) -> Result<Vec<MeasurementWithDefinitionRecord>, RepositoryError>;

    /// Stored values of one definition across tests, oldest first
    async fn history_for_definition(&self, definition_id: i64) -> Result<Vec<HistoryPointRecord>, RepositoryError>;
}

#[derive(Debug, Clone)]
enum Backend {
    Database(DatabasePool),
    Memory(InMemoryStorage),
}

/// Repository for bloodwork data.
/// Backed either by a SQLite pool or by process memory; the choice is made once at construction.
#[derive(Debug, Clone)]
pub struct BloodworkRepository {
    backend: Backend,
}

/// Reject dates that are not calendar dates in YYYY-MM-DD form
pub fn validate_test_date(date: &str) -> Result<(), RepositoryError> {
    NaiveDate::parse_from_str(date, "%Y-%m-%d")
        .map(|_| ())
        .map_err(|e| RepositoryError::DateParse(format!("'{}' is not a YYYY-MM-DD date: {}", date, e)))
}

impl BloodworkRepository {
    /// Create a repository on top of an initialized database pool
    pub fn with_database(pool: DatabasePool) -> Self {
        Self {
            backend: Backend::Database(pool),
        }
    }

    /// Create a repository that keeps everything in memory, seeded with the bundled catalog
    pub fn in_memory() -> Result<Self, RepositoryError> {
        let catalog = load_catalog_seed()?;
        Ok(Self {
            backend: Backend::Memory(InMemoryStorage::with_catalog(catalog)),
        })
    }
}

#[async_trait]
impl BloodworkRepositoryTrait for BloodworkRepository {
    async fn list_definitions(&self) -> Result<Vec<MeasurementDefinitionRecord>, RepositoryError> {
        match &self.backend {
            Backend::Database(pool) => DatabaseStorage::list_definitions(pool).await,
            Backend::Memory(storage) => storage.list_definitions().await,
        }
    }

    async fn search_definitions(&self, query: &str) -> Result<Vec<MeasurementDefinitionRecord>, RepositoryError> {
        match &self.backend {
            Backend::Database(pool) => DatabaseStorage::search_definitions(pool, query).await,
            Backend::Memory(storage) => storage.search_definitions(query).await,
        }
    }

    async fn get_definition(&self, id: i64) -> Result<Option<MeasurementDefinitionRecord>, RepositoryError> {
        match &self.backend {
            Backend::Database(pool) => DatabaseStorage::get_definition(pool, id).await,
            Backend::Memory(storage) => storage.get_definition(id).await,
        }
    }

    async fn get_definition_by_code(&self, code: &str) -> Result<Option<MeasurementDefinitionRecord>, RepositoryError> {
        match &self.backend {
            Backend::Database(pool) => DatabaseStorage::get_definition_by_code(pool, code).await,
            Backend::Memory(storage) => storage.get_definition_by_code(code).await,
        }
    }

    async fn create_test(
        &self,
        test: NewTestEventRecord,
        measurements: Vec<NewMeasurementRecord>,
    ) -> Result<(TestEventRecord, Vec<MeasurementRecord>), RepositoryError> {
        validate_test_date(&test.test_date)?;

        let record = TestEventRecord {
            id: Uuid::new_v4().to_string(),
            test_date: test.test_date,
            lab_name: test.lab_name,
            doctor_name: test.doctor_name,
            notes: test.notes,
            created_at: Utc::now().to_rfc3339(),
        };
        debug!("Creating test event {} with {} measurements", record.id, measurements.len());

        match &self.backend {
            Backend::Database(pool) => DatabaseStorage::create_test(pool, record, measurements).await,
            Backend::Memory(storage) => storage.create_test(record, measurements).await,
        }
    }

    async fn get_test(&self, id: Uuid) -> Result<Option<TestEventRecord>, RepositoryError> {
        match &self.backend {
            Backend::Database(pool) => DatabaseStorage::get_test(pool, &id).await,
            Backend::Memory(storage) => storage.get_test(&id).await,
        }
    }

    async fn list_tests(
        &self,
        start_date: Option<String>,
        end_date: Option<String>,
    ) -> Result<Vec<TestEventRecord>, RepositoryError> {
        for date in start_date.iter().chain(end_date.iter()) {
            validate_test_date(date)?;
        }

        match &self.backend {
            Backend::Database(pool) => {
                DatabaseStorage::list_tests(pool, start_date.as_deref(), end_date.as_deref()).await
            }
            Backend::Memory(storage) => storage.list_tests(start_date.as_deref(), end_date.as_deref()).await,
        }
    }

    async fn status_counts(
        &self,
        start_date: Option<String>,
        end_date: Option<String>,
    ) -> Result<Vec<StatusCountRecord>, RepositoryError> {
        for date in start_date.iter().chain(end_date.iter()) {
            validate_test_date(date)?;
        }

        match &self.backend {
            Backend::Database(pool) => {
                DatabaseStorage::status_counts(pool, start_date.as_deref(), end_date.as_deref()).await
            }
            Backend::Memory(storage) => storage.status_counts(start_date.as_deref(), end_date.as_deref()).await,
        }
    }

    async fn update_test(&self, id: Uuid, update: NewTestEventRecord) -> Result<Option<TestEventRecord>, RepositoryError> {
        validate_test_date(&update.test_date)?;

        match &self.backend {
            Backend::Database(pool) => DatabaseStorage::update_test(pool, &id, update).await,
            Backend::Memory(storage) => storage.update_test(&id, update).await,
        }
    }

    async fn delete_test(&self, id: Uuid) -> Result<bool, RepositoryError> {
        match &self.backend {
            Backend::Database(pool) => DatabaseStorage::delete_test(pool, &id).await,
            Backend::Memory(storage) => storage.delete_test(&id).await,
        }
    }

    async fn upsert_measurement(&self, test_id: Uuid, input: NewMeasurementRecord) -> Result<MeasurementRecord, RepositoryError> {
        match &self.backend {
            Backend::Database(pool) => DatabaseStorage::upsert_measurement(pool, &test_id, input).await,
            Backend::Memory(storage) => storage.upsert_measurement(&test_id, input).await,
        }
    }

    async fn get_measurement(&self, id: Uuid) -> Result<Option<MeasurementRecord>, RepositoryError> {
        match &self.backend {
            Backend::Database(pool) => DatabaseStorage::get_measurement(pool, &id).await,
            Backend::Memory(storage) => storage.get_measurement(&id).await,
        }
    }

    async fn update_measurement(
        &self,
        id: Uuid,
        value: f64,
        status: String,
        notes: Option<String>,
    ) -> Result<Option<MeasurementRecord>, RepositoryError> {
        match &self.backend {
            Backend::Database(pool) => DatabaseStorage::update_measurement(pool, &id, value, &status, notes).await,
            Backend::Memory(storage) => storage.update_measurement(&id, value, &status, notes).await,
        }
    }

    async fn delete_measurement(&self, id: Uuid) -> Result<bool, RepositoryError> {
        match &self.backend {
            Backend::Database(pool) => DatabaseStorage::delete_measurement(pool, &id).await,
            Backend::Memory(storage) => storage.delete_measurement(&id).await,
        }
    }

    async fn measurements_for_test(&self, test_id: Uuid) -> Result<Vec<MeasurementWithDefinitionRecord>, RepositoryError> {
        match &self.backend {
            Backend::Database(pool) => DatabaseStorage::measurements_for_test(pool, &test_id).await,
            Backend::Memory(storage) => storage.measurements_for_test(&test_id).await,
        }
    }

    async fn history_for_definition(&self, definition_id: i64) -> Result<Vec<HistoryPointRecord>, RepositoryError> {
        match &self.backend {
            Backend::Database(pool) => DatabaseStorage::history_for_definition(pool, definition_id).await,
            Backend::Memory(storage) => storage.history_for_definition(definition_id).await,
        }
    }
}

/// Test doubles for the repository
#[cfg(any(test, feature = "mock"))]
pub mod tests {
    use super::*;

    /// Repository whose storage is permanently unreachable; every call fails with a database error
    #[derive(Debug, Clone, Default)]
    pub struct UnavailableRepository;

    impl UnavailableRepository {
        pub fn new() -> Self {
            Self
        }

        fn failure<T>(&self) -> Result<T, RepositoryError> {
            Err(RepositoryError::Database(crate::database::DatabaseError::ConfigError(
                "storage is unavailable".to_string(),
            )))
        }
    }

    #[async_trait]
    impl BloodworkRepositoryTrait for UnavailableRepository {
        async fn list_definitions(&self) -> Result<Vec<MeasurementDefinitionRecord>, RepositoryError> {
            self.failure()
        }

        async fn search_definitions(&self, _query: &str) -> Result<Vec<MeasurementDefinitionRecord>, RepositoryError> {
            self.failure()
        }

        async fn get_definition(&self, _id: i64) -> Result<Option<MeasurementDefinitionRecord>, RepositoryError> {
            self.failure()
        }

        async fn get_definition_by_code(&self, _code: &str) -> Result<Option<MeasurementDefinitionRecord>, RepositoryError> {
            self.failure()
        }

        async fn create_test(
            &self,
            _test: NewTestEventRecord,
            _measurements: Vec<NewMeasurementRecord>,
        ) -> Result<(TestEventRecord, Vec<MeasurementRecord>), RepositoryError> {
            self.failure()
        }

        async fn get_test(&self, _id: Uuid) -> Result<Option<TestEventRecord>, RepositoryError> {
            self.failure()
        }

        async fn list_tests(
            &self,
            _start_date: Option<String>,
            _end_date: Option<String>,
        ) -> Result<Vec<TestEventRecord>, RepositoryError> {
            self.failure()
        }

        async fn status_counts(
            &self,
            _start_date: Option<String>,
            _end_date: Option<String>,
        ) -> Result<Vec<StatusCountRecord>, RepositoryError> {
            self.failure()
        }

        async fn update_test(&self, _id: Uuid, _update: NewTestEventRecord) -> Result<Option<TestEventRecord>, RepositoryError> {
            self.failure()
        }

        async fn delete_test(&self, _id: Uuid) -> Result<bool, RepositoryError> {
            self.failure()
        }

        async fn upsert_measurement(&self, _test_id: Uuid, _input: NewMeasurementRecord) -> Result<MeasurementRecord, RepositoryError> {
            self.failure()
        }

        async fn get_measurement(&self, _id: Uuid) -> Result<Option<MeasurementRecord>, RepositoryError> {
            self.failure()
        }

        async fn update_measurement(
            &self,
            _id: Uuid,
            _value: f64,
            _status: String,
            _notes: Option<String>,
        ) -> Result<Option<MeasurementRecord>, RepositoryError> {
            self.failure()
        }

        async fn delete_measurement(&self, _id: Uuid) -> Result<bool, RepositoryError> {
            self.failure()
        }

        async fn measurements_for_test(&self, _test_id: Uuid) -> Result<Vec<MeasurementWithDefinitionRecord>, RepositoryError> {
            self.failure()
        }

        async fn history_for_definition(&self, _definition_id: i64) -> Result<Vec<HistoryPointRecord>, RepositoryError> {
            self.failure()
        }
    }
}
