use chrono::{DateTime, NaiveDate, Utc};
use uuid::Uuid;

use bloodwork_data::models::{
    HistoryPointRecord, MeasurementDefinitionRecord, MeasurementRecord, MeasurementWithDefinitionRecord,
    NewTestEventRecord, TestEventRecord,
};

use crate::entities::{
    HistoryPoint, Measurement, MeasurementDefinition, MeasurementDetail, Status, TestEvent, UpdateTestEventRequest,
};

/// Conversion functions between domain entities and data models.
/// Stored text columns are parsed here; a failure means the stored row is corrupt.

/// Parse a string ID to UUID with a descriptive error
pub fn parse_string_to_uuid(id: &str) -> Result<Uuid, String> {
    Uuid::parse_str(id).map_err(|_| format!("Invalid UUID format: {}", id))
}

/// Format a date the way it is stored
pub fn format_date(date: NaiveDate) -> String {
    date.format("%Y-%m-%d").to_string()
}

fn parse_date(date: &str) -> Result<NaiveDate, String> {
    NaiveDate::parse_from_str(date, "%Y-%m-%d").map_err(|_| format!("Invalid stored date: {}", date))
}

fn parse_timestamp(timestamp: &str) -> Result<DateTime<Utc>, String> {
    DateTime::parse_from_rfc3339(timestamp)
        .map(|ts| ts.with_timezone(&Utc))
        .map_err(|_| format!("Invalid stored timestamp: {}", timestamp))
}

pub fn parse_status(status: &str) -> Result<Status, String> {
    status.parse::<Status>().map_err(|e| e.to_string())
}

pub fn convert_to_domain_definition(record: MeasurementDefinitionRecord) -> MeasurementDefinition {
    MeasurementDefinition {
        id: record.id,
        code: record.code,
        name_de: record.name_de,
        name_en: record.name_en,
        description_de: record.description_de,
        description_en: record.description_en,
        unit: record.unit,
        category: record.category,
        min_male: record.min_male,
        max_male: record.max_male,
        min_female: record.min_female,
        max_female: record.max_female,
        min_normal: record.min_normal,
        max_normal: record.max_normal,
        critical_low: record.critical_low,
        critical_high: record.critical_high,
        high_meaning_de: record.high_meaning_de,
        high_meaning_en: record.high_meaning_en,
        low_meaning_de: record.low_meaning_de,
        low_meaning_en: record.low_meaning_en,
        sort_order: record.sort_order,
    }
}

pub fn convert_to_domain_test(record: TestEventRecord) -> Result<TestEvent, String> {
    Ok(TestEvent {
        id: parse_string_to_uuid(&record.id)?,
        test_date: parse_date(&record.test_date)?,
        lab_name: record.lab_name,
        doctor_name: record.doctor_name,
        notes: record.notes,
        created_at: parse_timestamp(&record.created_at)?,
    })
}

pub fn convert_to_domain_measurement(record: MeasurementRecord) -> Result<Measurement, String> {
    Ok(Measurement {
        id: parse_string_to_uuid(&record.id)?,
        test_id: parse_string_to_uuid(&record.test_id)?,
        definition_id: record.definition_id,
        value: record.value,
        status: parse_status(&record.status)?,
        notes: record.notes,
    })
}

pub fn convert_to_domain_detail(record: MeasurementWithDefinitionRecord) -> Result<MeasurementDetail, String> {
    Ok(MeasurementDetail {
        measurement: convert_to_domain_measurement(record.measurement)?,
        definition: convert_to_domain_definition(record.definition),
    })
}

pub fn convert_to_domain_history_point(record: HistoryPointRecord) -> Result<HistoryPoint, String> {
    Ok(HistoryPoint {
        measurement_id: parse_string_to_uuid(&record.measurement_id)?,
        test_id: parse_string_to_uuid(&record.test_id)?,
        test_date: parse_date(&record.test_date)?,
        value: record.value,
        status: parse_status(&record.status)?,
    })
}

pub fn convert_to_data_test(
    test_date: NaiveDate,
    lab_name: Option<String>,
    doctor_name: Option<String>,
    notes: Option<String>,
) -> NewTestEventRecord {
    NewTestEventRecord {
        test_date: format_date(test_date),
        lab_name,
        doctor_name,
        notes,
    }
}

pub fn convert_to_data_test_update(request: UpdateTestEventRequest) -> NewTestEventRecord {
    convert_to_data_test(request.test_date, request.lab_name, request.doctor_name, request.notes)
}
