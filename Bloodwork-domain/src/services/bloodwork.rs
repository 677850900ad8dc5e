use std::collections::{HashMap, HashSet};

use async_trait::async_trait;
use chrono::NaiveDate;
use thiserror::Error;
use tracing::{debug, info, warn};
use uuid::Uuid;
use validator::{Validate, ValidationErrors};

use bloodwork_data::models::{MeasurementWithDefinitionRecord, NewMeasurementRecord};
use bloodwork_data::repository::{BloodworkRepository, BloodworkRepositoryTrait, RepositoryError};

use crate::config::EvaluationSettings;
use crate::entities::conversions;
use crate::entities::{
    CatalogCategory, ClassifiedMeasurement, ConstellationFinding, CreateTestEventRequest, MeasurementDefinition,
    MeasurementDetail, RecordMeasurementRequest, Sex, Status, StatusCounts, TestEvent, TestEventDetail,
    TestEventSummary, UpdateMeasurementRequest, UpdateTestEventRequest, ValueHistory,
};
use crate::services::{constellation, evaluator};

/// Bloodwork service errors
#[derive(Debug, Error)]
pub enum BloodworkServiceError {
    /// The request is malformed or references unknown catalog entries
    #[error("Validation error: {0}")]
    ValidationError(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Repository error: {0}")]
    RepositoryError(String),

    /// A stored row could not be read back, e.g. an unknown status name
    #[error("Corrupt record: {0}")]
    CorruptRecord(String),
}

/// Trait for bloodwork service operations
#[async_trait]
pub trait BloodworkServiceTrait {
    /// Sex applied when a request does not name one
    fn default_sex(&self) -> Sex;

    /// Classify a value against a catalog entry
    fn classify_value(&self, value: f64, definition: &MeasurementDefinition, sex: Sex) -> Status;

    /// Run the constellation rules over already classified values
    fn analyze_measurements(&self, measurements: &[ClassifiedMeasurement]) -> Vec<ConstellationFinding>;

    /// Catalog grouped by category, optionally filtered by a search term
    async fn get_catalog(&self, query: Option<String>) -> Result<Vec<CatalogCategory>, BloodworkServiceError>;

    async fn get_definition(&self, id: i64) -> Result<MeasurementDefinition, BloodworkServiceError>;

    async fn get_definition_by_code(&self, code: &str) -> Result<MeasurementDefinition, BloodworkServiceError>;

    /// Record a test event with its values, classifying each one
    async fn create_test(&self, request: CreateTestEventRequest) -> Result<TestEventDetail, BloodworkServiceError>;

    async fn get_test(&self, id: &str) -> Result<TestEventDetail, BloodworkServiceError>;

    /// Test events newest first with per-status counts, optionally bounded by inclusive dates
    async fn list_tests(
        &self,
        start_date: Option<NaiveDate>,
        end_date: Option<NaiveDate>,
    ) -> Result<Vec<TestEventSummary>, BloodworkServiceError>;

    async fn update_test(&self, id: &str, request: UpdateTestEventRequest) -> Result<TestEvent, BloodworkServiceError>;

    async fn delete_test(&self, id: &str) -> Result<(), BloodworkServiceError>;

    /// Add a value to a test, replacing any value stored for the same definition
    async fn record_measurement(
        &self,
        test_id: &str,
        request: RecordMeasurementRequest,
    ) -> Result<MeasurementDetail, BloodworkServiceError>;

    async fn update_measurement(
        &self,
        id: &str,
        request: UpdateMeasurementRequest,
    ) -> Result<MeasurementDetail, BloodworkServiceError>;

    async fn delete_measurement(&self, id: &str) -> Result<(), BloodworkServiceError>;

    /// Constellation findings for the stored values of one test
    async fn analyze_test(&self, test_id: &str) -> Result<Vec<ConstellationFinding>, BloodworkServiceError>;

    /// Stored values of one definition across all tests, oldest first
    async fn value_history(&self, definition_id: i64) -> Result<ValueHistory, BloodworkServiceError>;
}

/// Bloodwork service for domain logic
pub struct BloodworkService<R: BloodworkRepositoryTrait> {
    repository: R,
    settings: EvaluationSettings,
}

/// Flatten validator errors into one message
fn validation_message(errors: &ValidationErrors) -> String {
    let message = errors
        .field_errors()
        .iter()
        .map(|(field, errors)| {
            let messages: Vec<String> = errors
                .iter()
                .map(|err| match &err.message {
                    Some(msg) => msg.to_string(),
                    None => format!("Invalid {}", field),
                })
                .collect();
            format!("{}: {}", field, messages.join(", "))
        })
        .collect::<Vec<String>>()
        .join("; ");

    // Errors inside nested measurements are not field errors of the outer struct
    if message.is_empty() {
        errors.to_string()
    } else {
        message
    }
}

fn check_value(value: f64) -> Result<(), BloodworkServiceError> {
    if value.is_finite() {
        Ok(())
    } else {
        Err(BloodworkServiceError::ValidationError(format!("Value {} is not a finite number", value)))
    }
}

fn parse_id(id: &str) -> Result<Uuid, BloodworkServiceError> {
    conversions::parse_string_to_uuid(id).map_err(BloodworkServiceError::ValidationError)
}

fn classified(record: &MeasurementWithDefinitionRecord) -> Result<ClassifiedMeasurement, BloodworkServiceError> {
    let status = conversions::parse_status(&record.measurement.status).map_err(BloodworkServiceError::CorruptRecord)?;
    Ok(ClassifiedMeasurement::new(
        record.definition.category.clone(),
        record.definition.code.clone(),
        record.measurement.value,
        status,
    ))
}

impl<R: BloodworkRepositoryTrait + Send + Sync> BloodworkService<R> {
    pub fn new(repository: R, settings: EvaluationSettings) -> Self {
        Self { repository, settings }
    }

    /// Map repository errors to service errors
    fn map_repo_error(&self, err: RepositoryError) -> BloodworkServiceError {
        match err {
            RepositoryError::NotFound(msg) => BloodworkServiceError::NotFound(msg),
            RepositoryError::Validation(msg) | RepositoryError::DateParse(msg) => {
                BloodworkServiceError::ValidationError(msg)
            }
            _ => BloodworkServiceError::RepositoryError(err.to_string()),
        }
    }

    fn resolve_sex(&self, sex: Option<Sex>) -> Sex {
        sex.unwrap_or(self.settings.default_sex)
    }

    /// Look up a definition a request refers to; an unknown id is a request error
    async fn referenced_definition(&self, id: i64) -> Result<MeasurementDefinition, BloodworkServiceError> {
        self.repository
            .get_definition(id)
            .await
            .map_err(|e| self.map_repo_error(e))?
            .map(conversions::convert_to_domain_definition)
            .ok_or_else(|| BloodworkServiceError::ValidationError(format!("Unknown measurement definition {}", id)))
    }

    async fn load_test(&self, id: Uuid) -> Result<TestEvent, BloodworkServiceError> {
        let record = self
            .repository
            .get_test(id)
            .await
            .map_err(|e| self.map_repo_error(e))?
            .ok_or_else(|| BloodworkServiceError::NotFound(format!("Test event with ID {} not found", id)))?;
        conversions::convert_to_domain_test(record).map_err(BloodworkServiceError::CorruptRecord)
    }

    async fn load_detail(&self, id: Uuid) -> Result<TestEventDetail, BloodworkServiceError> {
        let test = self.load_test(id).await?;
        let measurements = self
            .repository
            .measurements_for_test(id)
            .await
            .map_err(|e| self.map_repo_error(e))?
            .into_iter()
            .map(|record| conversions::convert_to_domain_detail(record).map_err(BloodworkServiceError::CorruptRecord))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(TestEventDetail { test, measurements })
    }

    fn validate_create_request(&self, request: &CreateTestEventRequest) -> Result<(), BloodworkServiceError> {
        request
            .validate()
            .map_err(|errors| BloodworkServiceError::ValidationError(validation_message(&errors)))?;

        if request.measurements.is_empty() {
            return Err(BloodworkServiceError::ValidationError(
                "At least one measurement is required".to_string(),
            ));
        }

        let mut seen = HashSet::new();
        for input in &request.measurements {
            check_value(input.value)?;
            if !seen.insert(input.definition_id) {
                return Err(BloodworkServiceError::ValidationError(format!(
                    "Measurement definition {} appears more than once",
                    input.definition_id
                )));
            }
        }

        Ok(())
    }
}

#[async_trait]
impl<R: BloodworkRepositoryTrait + Send + Sync> BloodworkServiceTrait for BloodworkService<R> {
    fn default_sex(&self) -> Sex {
        self.settings.default_sex
    }

    fn classify_value(&self, value: f64, definition: &MeasurementDefinition, sex: Sex) -> Status {
        evaluator::classify(value, definition, sex)
    }

    fn analyze_measurements(&self, measurements: &[ClassifiedMeasurement]) -> Vec<ConstellationFinding> {
        constellation::analyze(measurements)
    }

    async fn get_catalog(&self, query: Option<String>) -> Result<Vec<CatalogCategory>, BloodworkServiceError> {
        let query = query.map(|q| q.trim().to_string()).filter(|q| !q.is_empty());
        let records = match &query {
            Some(q) => self.repository.search_definitions(q).await,
            None => self.repository.list_definitions().await,
        }
        .map_err(|e| self.map_repo_error(e))?;

        let definitions = records.into_iter().map(conversions::convert_to_domain_definition).collect();
        Ok(CatalogCategory::group(definitions))
    }

    async fn get_definition(&self, id: i64) -> Result<MeasurementDefinition, BloodworkServiceError> {
        self.repository
            .get_definition(id)
            .await
            .map_err(|e| self.map_repo_error(e))?
            .map(conversions::convert_to_domain_definition)
            .ok_or_else(|| BloodworkServiceError::NotFound(format!("Measurement definition {} not found", id)))
    }

    async fn get_definition_by_code(&self, code: &str) -> Result<MeasurementDefinition, BloodworkServiceError> {
        self.repository
            .get_definition_by_code(code)
            .await
            .map_err(|e| self.map_repo_error(e))?
            .map(conversions::convert_to_domain_definition)
            .ok_or_else(|| BloodworkServiceError::NotFound(format!("Measurement definition '{}' not found", code)))
    }

    async fn create_test(&self, request: CreateTestEventRequest) -> Result<TestEventDetail, BloodworkServiceError> {
        self.validate_create_request(&request)?;
        let sex = self.resolve_sex(request.sex);

        let mut measurements = Vec::with_capacity(request.measurements.len());
        for input in request.measurements {
            let definition = self.referenced_definition(input.definition_id).await?;
            let status = evaluator::classify(input.value, &definition, sex);
            debug!("{} = {} {} classified as {}", definition.code, input.value, definition.unit, status);
            measurements.push(NewMeasurementRecord {
                definition_id: definition.id,
                value: input.value,
                status: status.as_str().to_string(),
                notes: input.notes,
            });
        }

        let test = conversions::convert_to_data_test(request.test_date, request.lab_name, request.doctor_name, request.notes);
        let (record, stored) = self
            .repository
            .create_test(test, measurements)
            .await
            .map_err(|e| self.map_repo_error(e))?;
        info!("Created test event {} with {} measurements", record.id, stored.len());

        let id = conversions::parse_string_to_uuid(&record.id).map_err(BloodworkServiceError::CorruptRecord)?;
        self.load_detail(id).await
    }

    async fn get_test(&self, id: &str) -> Result<TestEventDetail, BloodworkServiceError> {
        let id = parse_id(id)?;
        self.load_detail(id).await
    }

    async fn list_tests(
        &self,
        start_date: Option<NaiveDate>,
        end_date: Option<NaiveDate>,
    ) -> Result<Vec<TestEventSummary>, BloodworkServiceError> {
        if let (Some(start), Some(end)) = (start_date, end_date) {
            if start > end {
                return Err(BloodworkServiceError::ValidationError(format!(
                    "Start date {} is after end date {}",
                    start, end
                )));
            }
        }

        let start_date = start_date.map(conversions::format_date);
        let end_date = end_date.map(conversions::format_date);

        let records = self
            .repository
            .list_tests(start_date.clone(), end_date.clone())
            .await
            .map_err(|e| self.map_repo_error(e))?;

        let mut statuses_by_test: HashMap<String, Vec<Status>> = HashMap::new();
        for row in self
            .repository
            .status_counts(start_date, end_date)
            .await
            .map_err(|e| self.map_repo_error(e))?
        {
            let status = conversions::parse_status(&row.status).map_err(BloodworkServiceError::CorruptRecord)?;
            statuses_by_test
                .entry(row.test_id)
                .or_default()
                .extend(std::iter::repeat(status).take(row.count.max(0) as usize));
        }

        let mut summaries = Vec::with_capacity(records.len());
        for record in records {
            let statuses = statuses_by_test.remove(&record.id).unwrap_or_default();
            let test = conversions::convert_to_domain_test(record).map_err(BloodworkServiceError::CorruptRecord)?;
            summaries.push(TestEventSummary {
                test,
                counts: StatusCounts::tally(statuses),
            });
        }

        Ok(summaries)
    }

    async fn update_test(&self, id: &str, request: UpdateTestEventRequest) -> Result<TestEvent, BloodworkServiceError> {
        request
            .validate()
            .map_err(|errors| BloodworkServiceError::ValidationError(validation_message(&errors)))?;
        let id = parse_id(id)?;

        let record = self
            .repository
            .update_test(id, conversions::convert_to_data_test_update(request))
            .await
            .map_err(|e| self.map_repo_error(e))?
            .ok_or_else(|| BloodworkServiceError::NotFound(format!("Test event with ID {} not found", id)))?;
        conversions::convert_to_domain_test(record).map_err(BloodworkServiceError::CorruptRecord)
    }

    async fn delete_test(&self, id: &str) -> Result<(), BloodworkServiceError> {
        let id = parse_id(id)?;
        let deleted = self.repository.delete_test(id).await.map_err(|e| self.map_repo_error(e))?;
        if !deleted {
            return Err(BloodworkServiceError::NotFound(format!("Test event with ID {} not found", id)));
        }
        info!("Deleted test event {}", id);
        Ok(())
    }

    async fn record_measurement(
        &self,
        test_id: &str,
        request: RecordMeasurementRequest,
    ) -> Result<MeasurementDetail, BloodworkServiceError> {
        request
            .validate()
            .map_err(|errors| BloodworkServiceError::ValidationError(validation_message(&errors)))?;
        check_value(request.value)?;
        let test_id = parse_id(test_id)?;

        let definition = self.referenced_definition(request.definition_id).await?;
        let status = evaluator::classify(request.value, &definition, self.resolve_sex(request.sex));

        let record = self
            .repository
            .upsert_measurement(
                test_id,
                NewMeasurementRecord {
                    definition_id: definition.id,
                    value: request.value,
                    status: status.as_str().to_string(),
                    notes: request.notes,
                },
            )
            .await
            .map_err(|e| self.map_repo_error(e))?;

        let measurement =
            conversions::convert_to_domain_measurement(record).map_err(BloodworkServiceError::CorruptRecord)?;
        Ok(MeasurementDetail { measurement, definition })
    }

    async fn update_measurement(
        &self,
        id: &str,
        request: UpdateMeasurementRequest,
    ) -> Result<MeasurementDetail, BloodworkServiceError> {
        request
            .validate()
            .map_err(|errors| BloodworkServiceError::ValidationError(validation_message(&errors)))?;
        check_value(request.value)?;
        let id = parse_id(id)?;

        let existing = self
            .repository
            .get_measurement(id)
            .await
            .map_err(|e| self.map_repo_error(e))?
            .ok_or_else(|| BloodworkServiceError::NotFound(format!("Measurement with ID {} not found", id)))?;

        let definition = self
            .repository
            .get_definition(existing.definition_id)
            .await
            .map_err(|e| self.map_repo_error(e))?
            .map(conversions::convert_to_domain_definition)
            .ok_or_else(|| {
                BloodworkServiceError::CorruptRecord(format!(
                    "Measurement {} refers to missing definition {}",
                    id, existing.definition_id
                ))
            })?;

        let status = evaluator::classify(request.value, &definition, self.resolve_sex(request.sex));
        let notes = request.notes.or(existing.notes);

        let record = self
            .repository
            .update_measurement(id, request.value, status.as_str().to_string(), notes)
            .await
            .map_err(|e| self.map_repo_error(e))?
            .ok_or_else(|| BloodworkServiceError::NotFound(format!("Measurement with ID {} not found", id)))?;

        let measurement =
            conversions::convert_to_domain_measurement(record).map_err(BloodworkServiceError::CorruptRecord)?;
        Ok(MeasurementDetail { measurement, definition })
    }

    async fn delete_measurement(&self, id: &str) -> Result<(), BloodworkServiceError> {
        let id = parse_id(id)?;
        let deleted = self.repository.delete_measurement(id).await.map_err(|e| self.map_repo_error(e))?;
        if !deleted {
            return Err(BloodworkServiceError::NotFound(format!("Measurement with ID {} not found", id)));
        }
        Ok(())
    }

    async fn analyze_test(&self, test_id: &str) -> Result<Vec<ConstellationFinding>, BloodworkServiceError> {
        let test_id = parse_id(test_id)?;
        self.load_test(test_id).await?;

        let records = self
            .repository
            .measurements_for_test(test_id)
            .await
            .map_err(|e| self.map_repo_error(e))?;

        let measurements = records.iter().map(classified).collect::<Result<Vec<_>, _>>().map_err(|e| {
            warn!("Cannot analyze test event {}: {}", test_id, e);
            e
        })?;

        let findings = constellation::analyze(&measurements);
        debug!("Test event {} produced {} findings", test_id, findings.len());
        Ok(findings)
    }

    async fn value_history(&self, definition_id: i64) -> Result<ValueHistory, BloodworkServiceError> {
        let definition = self.get_definition(definition_id).await?;
        let points = self
            .repository
            .history_for_definition(definition_id)
            .await
            .map_err(|e| self.map_repo_error(e))?
            .into_iter()
            .map(|record| conversions::convert_to_domain_history_point(record).map_err(BloodworkServiceError::CorruptRecord))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(ValueHistory { definition, points })
    }
}

/// Create a bloodwork service on top of the given repository
pub fn create_default_bloodwork_service(
    repository: BloodworkRepository,
    settings: EvaluationSettings,
) -> BloodworkService<BloodworkRepository> {
    BloodworkService::new(repository, settings)
}
