use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use uuid::Uuid;

use crate::models::{
    HistoryPointRecord, MeasurementDefinitionRecord, MeasurementRecord, MeasurementWithDefinitionRecord,
    NewMeasurementRecord, NewTestEventRecord, StatusCountRecord, TestEventRecord,
};
use super::errors::RepositoryError;

#[derive(Debug, Default)]
struct MemoryState {
    definitions: Vec<MeasurementDefinitionRecord>,
    tests: HashMap<String, TestEventRecord>,
    measurements: HashMap<String, MeasurementRecord>,
}

impl MemoryState {
    fn definition(&self, id: i64) -> Option<&MeasurementDefinitionRecord> {
        self.definitions.iter().find(|d| d.id == id)
    }

    fn require_definition(&self, id: i64) -> Result<(), RepositoryError> {
        self.definition(id)
            .map(|_| ())
            .ok_or_else(|| RepositoryError::NotFound(format!("Measurement definition {} not found", id)))
    }

    fn measurement_for(&self, test_id: &str, definition_id: i64) -> Option<&MeasurementRecord> {
        self.measurements
            .values()
            .find(|m| m.test_id == test_id && m.definition_id == definition_id)
    }
}

/// In-memory storage with the same semantics as the SQLite schema:
/// one measurement per (test, definition), cascade on test deletion
#[derive(Debug, Clone, Default)]
pub struct InMemoryStorage {
    state: Arc<Mutex<MemoryState>>,
}

fn catalog_order(a: &MeasurementDefinitionRecord, b: &MeasurementDefinitionRecord) -> std::cmp::Ordering {
    a.category
        .cmp(&b.category)
        .then(a.sort_order.cmp(&b.sort_order))
        .then(a.name_de.cmp(&b.name_de))
}

impl InMemoryStorage {
    /// Create storage holding the given catalog; ids are assigned in order starting at 1
    pub fn with_catalog(definitions: Vec<MeasurementDefinitionRecord>) -> Self {
        let definitions = definitions
            .into_iter()
            .enumerate()
            .map(|(index, mut definition)| {
                definition.id = index as i64 + 1;
                definition
            })
            .collect();

        Self {
            state: Arc::new(Mutex::new(MemoryState {
                definitions,
                ..MemoryState::default()
            })),
        }
    }

    pub async fn list_definitions(&self) -> Result<Vec<MeasurementDefinitionRecord>, RepositoryError> {
        let state = self.state.lock()?;
        let mut definitions = state.definitions.clone();
        definitions.sort_by(catalog_order);
        Ok(definitions)
    }

    pub async fn search_definitions(&self, query: &str) -> Result<Vec<MeasurementDefinitionRecord>, RepositoryError> {
        let needle = query.to_lowercase();
        let state = self.state.lock()?;
        let mut definitions: Vec<MeasurementDefinitionRecord> = state
            .definitions
            .iter()
            .filter(|d| {
                [&d.name_de, &d.name_en, &d.code, &d.category]
                    .iter()
                    .any(|field| field.to_lowercase().contains(&needle))
            })
            .cloned()
            .collect();
        definitions.sort_by(catalog_order);
        Ok(definitions)
    }

    pub async fn get_definition(&self, id: i64) -> Result<Option<MeasurementDefinitionRecord>, RepositoryError> {
        let state = self.state.lock()?;
        Ok(state.definition(id).cloned())
    }

    pub async fn get_definition_by_code(&self, code: &str) -> Result<Option<MeasurementDefinitionRecord>, RepositoryError> {
        let state = self.state.lock()?;
        Ok(state.definitions.iter().find(|d| d.code == code).cloned())
    }

    pub async fn create_test(
        &self,
        test: TestEventRecord,
        measurements: Vec<NewMeasurementRecord>,
    ) -> Result<(TestEventRecord, Vec<MeasurementRecord>), RepositoryError> {
        let mut state = self.state.lock()?;

        // Check everything before touching the maps so a failure leaves no partial test behind
        for (index, input) in measurements.iter().enumerate() {
            state.require_definition(input.definition_id)?;
            if measurements[..index].iter().any(|m| m.definition_id == input.definition_id) {
                return Err(RepositoryError::Validation(format!(
                    "Measurement definition {} appears more than once",
                    input.definition_id
                )));
            }
        }

        let stored: Vec<MeasurementRecord> = measurements
            .into_iter()
            .map(|input| MeasurementRecord {
                id: Uuid::new_v4().to_string(),
                test_id: test.id.clone(),
                definition_id: input.definition_id,
                value: input.value,
                status: input.status,
                notes: input.notes,
            })
            .collect();

        state.tests.insert(test.id.clone(), test.clone());
        for measurement in &stored {
            state.measurements.insert(measurement.id.clone(), measurement.clone());
        }

        Ok((test, stored))
    }

    pub async fn get_test(&self, id: &Uuid) -> Result<Option<TestEventRecord>, RepositoryError> {
        let state = self.state.lock()?;
        Ok(state.tests.get(&id.to_string()).cloned())
    }

    pub async fn list_tests(
        &self,
        start_date: Option<&str>,
        end_date: Option<&str>,
    ) -> Result<Vec<TestEventRecord>, RepositoryError> {
        let state = self.state.lock()?;

        let mut tests: Vec<TestEventRecord> = state
            .tests
            .values()
            .filter(|test| {
                if let Some(start_date) = start_date {
                    if test.test_date.as_str() < start_date {
                        return false;
                    }
                }

                if let Some(end_date) = end_date {
                    if test.test_date.as_str() > end_date {
                        return false;
                    }
                }

                true
            })
            .cloned()
            .collect();

        tests.sort_by(|a, b| b.test_date.cmp(&a.test_date).then(b.created_at.cmp(&a.created_at)));
        Ok(tests)
    }

    pub async fn status_counts(
        &self,
        start_date: Option<&str>,
        end_date: Option<&str>,
    ) -> Result<Vec<StatusCountRecord>, RepositoryError> {
        let state = self.state.lock()?;

        let mut counts: HashMap<(String, String), i64> = HashMap::new();
        for measurement in state.measurements.values() {
            let in_bounds = state.tests.get(&measurement.test_id).map_or(false, |test| {
                start_date.map_or(true, |start| test.test_date.as_str() >= start)
                    && end_date.map_or(true, |end| test.test_date.as_str() <= end)
            });
            if in_bounds {
                *counts
                    .entry((measurement.test_id.clone(), measurement.status.clone()))
                    .or_insert(0) += 1;
            }
        }

        Ok(counts
            .into_iter()
            .map(|((test_id, status), count)| StatusCountRecord { test_id, status, count })
            .collect())
    }

    pub async fn update_test(
        &self,
        id: &Uuid,
        update: NewTestEventRecord,
    ) -> Result<Option<TestEventRecord>, RepositoryError> {
        let mut state = self.state.lock()?;
        Ok(state.tests.get_mut(&id.to_string()).map(|test| {
            test.test_date = update.test_date;
            test.lab_name = update.lab_name;
            test.doctor_name = update.doctor_name;
            test.notes = update.notes;
            test.clone()
        }))
    }

    pub async fn delete_test(&self, id: &Uuid) -> Result<bool, RepositoryError> {
        let id = id.to_string();
        let mut state = self.state.lock()?;
        if state.tests.remove(&id).is_none() {
            return Ok(false);
        }
        state.measurements.retain(|_, m| m.test_id != id);
        Ok(true)
    }

    pub async fn upsert_measurement(
        &self,
        test_id: &Uuid,
        input: NewMeasurementRecord,
    ) -> Result<MeasurementRecord, RepositoryError> {
        let test_id = test_id.to_string();
        let mut state = self.state.lock()?;

        if !state.tests.contains_key(&test_id) {
            return Err(RepositoryError::NotFound(format!("Test event {} not found", test_id)));
        }
        state.require_definition(input.definition_id)?;

        let id = state
            .measurement_for(&test_id, input.definition_id)
            .map(|existing| existing.id.clone())
            .unwrap_or_else(|| Uuid::new_v4().to_string());

        let record = MeasurementRecord {
            id: id.clone(),
            test_id,
            definition_id: input.definition_id,
            value: input.value,
            status: input.status,
            notes: input.notes,
        };
        state.measurements.insert(id, record.clone());
        Ok(record)
    }

    pub async fn get_measurement(&self, id: &Uuid) -> Result<Option<MeasurementRecord>, RepositoryError> {
        let state = self.state.lock()?;
        Ok(state.measurements.get(&id.to_string()).cloned())
    }

    pub async fn update_measurement(
        &self,
        id: &Uuid,
        value: f64,
        status: &str,
        notes: Option<String>,
    ) -> Result<Option<MeasurementRecord>, RepositoryError> {
        let mut state = self.state.lock()?;
        Ok(state.measurements.get_mut(&id.to_string()).map(|measurement| {
            measurement.value = value;
            measurement.status = status.to_string();
            measurement.notes = notes;
            measurement.clone()
        }))
    }

    pub async fn delete_measurement(&self, id: &Uuid) -> Result<bool, RepositoryError> {
        let mut state = self.state.lock()?;
        Ok(state.measurements.remove(&id.to_string()).is_some())
    }

    pub async fn measurements_for_test(
        &self,
        test_id: &Uuid,
    ) -> Result<Vec<MeasurementWithDefinitionRecord>, RepositoryError> {
        let test_id = test_id.to_string();
        let state = self.state.lock()?;

        let mut joined = Vec::new();
        for measurement in state.measurements.values().filter(|m| m.test_id == test_id) {
            let definition = state.definition(measurement.definition_id).cloned().ok_or_else(|| {
                RepositoryError::NotFound(format!("Measurement definition {} not found", measurement.definition_id))
            })?;
            joined.push(MeasurementWithDefinitionRecord {
                measurement: measurement.clone(),
                definition,
            });
        }

        joined.sort_by(|a, b| catalog_order(&a.definition, &b.definition));
        Ok(joined)
    }

    pub async fn history_for_definition(&self, definition_id: i64) -> Result<Vec<HistoryPointRecord>, RepositoryError> {
        let state = self.state.lock()?;

        let mut points: Vec<(String, HistoryPointRecord)> = state
            .measurements
            .values()
            .filter(|m| m.definition_id == definition_id)
            .filter_map(|m| {
                state.tests.get(&m.test_id).map(|test| {
                    (
                        test.created_at.clone(),
                        HistoryPointRecord {
                            measurement_id: m.id.clone(),
                            test_id: m.test_id.clone(),
                            test_date: test.test_date.clone(),
                            value: m.value,
                            status: m.status.clone(),
                        },
                    )
                })
            })
            .collect();

        points.sort_by(|(created_a, a), (created_b, b)| a.test_date.cmp(&b.test_date).then(created_a.cmp(created_b)));
        Ok(points.into_iter().map(|(_, point)| point).collect())
    }
}
