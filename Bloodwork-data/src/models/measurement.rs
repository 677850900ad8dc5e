use serde::{Deserialize, Serialize};

use super::catalog::MeasurementDefinitionRecord;

/// Storage model for a single measured value within a test event
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MeasurementRecord {
    /// UUID of the measurement
    pub id: String,

    /// Owning test event
    pub test_id: String,

    /// Catalog entry this value belongs to
    pub definition_id: i64,

    /// Measured value in the definition's unit
    pub value: f64,

    /// Upper-case status name computed when the value was written
    pub status: String,

    /// Optional free-text notes
    pub notes: Option<String>,
}

/// Input for inserting or replacing a measurement
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewMeasurementRecord {
    pub definition_id: i64,
    pub value: f64,
    pub status: String,
    pub notes: Option<String>,
}

/// A measurement joined with its catalog entry
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MeasurementWithDefinitionRecord {
    pub measurement: MeasurementRecord,
    pub definition: MeasurementDefinitionRecord,
}

/// One stored value of a definition, tagged with the date of its test
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HistoryPointRecord {
    pub measurement_id: String,
    pub test_id: String,
    pub test_date: String,
    pub value: f64,
    pub status: String,
}

/// Number of measurements of one test event that share a status
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StatusCountRecord {
    pub test_id: String,
    pub status: String,
    pub count: i64,
}
