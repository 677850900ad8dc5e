use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

#[cfg(feature = "with-api")]
use utoipa::ToSchema;

use super::catalog::MeasurementDefinition;
use super::status::{Sex, Status};

/// A measured value within a test event
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "with-api", derive(ToSchema))]
pub struct Measurement {
    pub id: Uuid,

    /// Owning test event
    pub test_id: Uuid,

    /// Catalog entry the value belongs to
    pub definition_id: i64,

    /// Value in the definition's unit
    pub value: f64,

    /// Classification computed when the value was written
    pub status: Status,

    pub notes: Option<String>,
}

/// A measurement together with its catalog entry
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "with-api", derive(ToSchema))]
pub struct MeasurementDetail {
    pub measurement: Measurement,
    pub definition: MeasurementDefinition,
}

/// One value supplied when creating a test event
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
#[cfg_attr(feature = "with-api", derive(ToSchema))]
pub struct MeasurementInput {
    /// Catalog entry the value belongs to
    pub definition_id: i64,

    /// Value in the definition's unit
    pub value: f64,

    #[validate(length(max = 1000, message = "Notes cannot exceed 1000 characters"))]
    pub notes: Option<String>,
}

/// Request payload for adding a value to an existing test event
///
/// A value for a definition the test already holds replaces the old one.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
#[cfg_attr(feature = "with-api", derive(ToSchema))]
pub struct RecordMeasurementRequest {
    pub definition_id: i64,

    pub value: f64,

    #[validate(length(max = 1000, message = "Notes cannot exceed 1000 characters"))]
    pub notes: Option<String>,

    /// Sex used to pick the reference range; the configured default applies when omitted
    pub sex: Option<Sex>,
}

/// Request payload for correcting a stored value
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
#[cfg_attr(feature = "with-api", derive(ToSchema))]
pub struct UpdateMeasurementRequest {
    pub value: f64,

    /// Replaces the stored notes when present
    #[validate(length(max = 1000, message = "Notes cannot exceed 1000 characters"))]
    pub notes: Option<String>,

    pub sex: Option<Sex>,
}

/// Minimal view of a classified value, as consumed by the constellation rules
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "with-api", derive(ToSchema))]
pub struct ClassifiedMeasurement {
    pub category: String,
    pub code: String,
    pub value: f64,
    pub status: Status,
}

impl ClassifiedMeasurement {
    pub fn new(category: impl Into<String>, code: impl Into<String>, value: f64, status: Status) -> Self {
        Self {
            category: category.into(),
            code: code.into(),
            value,
            status,
        }
    }
}
