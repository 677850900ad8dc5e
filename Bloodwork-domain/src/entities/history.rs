use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[cfg(feature = "with-api")]
use utoipa::ToSchema;

use super::catalog::MeasurementDefinition;
use super::status::Status;

/// One stored value of a definition
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "with-api", derive(ToSchema))]
pub struct HistoryPoint {
    pub measurement_id: Uuid,
    pub test_id: Uuid,
    pub test_date: NaiveDate,
    pub value: f64,
    pub status: Status,
}

/// All values of one definition across test events, oldest first
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "with-api", derive(ToSchema))]
pub struct ValueHistory {
    pub definition: MeasurementDefinition,
    pub points: Vec<HistoryPoint>,
}
