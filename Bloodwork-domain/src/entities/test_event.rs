use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

#[cfg(feature = "with-api")]
use utoipa::ToSchema;

use super::measurement::{MeasurementDetail, MeasurementInput};
use super::status::{Sex, Status};

/// One blood draw on a given day
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "with-api", derive(ToSchema))]
pub struct TestEvent {
    pub id: Uuid,

    /// Day the blood was drawn
    pub test_date: NaiveDate,

    pub lab_name: Option<String>,
    pub doctor_name: Option<String>,
    pub notes: Option<String>,

    /// When the event was recorded
    pub created_at: DateTime<Utc>,
}

/// Request payload for recording a test event together with its values
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
#[cfg_attr(feature = "with-api", derive(ToSchema))]
pub struct CreateTestEventRequest {
    /// Day the blood was drawn (YYYY-MM-DD)
    pub test_date: NaiveDate,

    #[validate(length(max = 200, message = "Lab name cannot exceed 200 characters"))]
    pub lab_name: Option<String>,

    #[validate(length(max = 200, message = "Doctor name cannot exceed 200 characters"))]
    pub doctor_name: Option<String>,

    #[validate(length(max = 2000, message = "Notes cannot exceed 2000 characters"))]
    pub notes: Option<String>,

    /// Sex used to pick reference ranges; the configured default applies when omitted
    pub sex: Option<Sex>,

    /// At least one value, each definition at most once
    #[validate]
    pub measurements: Vec<MeasurementInput>,
}

/// Request payload for replacing a test event's metadata
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
#[cfg_attr(feature = "with-api", derive(ToSchema))]
pub struct UpdateTestEventRequest {
    pub test_date: NaiveDate,

    #[validate(length(max = 200, message = "Lab name cannot exceed 200 characters"))]
    pub lab_name: Option<String>,

    #[validate(length(max = 200, message = "Doctor name cannot exceed 200 characters"))]
    pub doctor_name: Option<String>,

    #[validate(length(max = 2000, message = "Notes cannot exceed 2000 characters"))]
    pub notes: Option<String>,
}

/// Counts of stored statuses within one test event
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "with-api", derive(ToSchema))]
pub struct StatusCounts {
    pub total: usize,
    pub normal: usize,
    /// HIGH or LOW
    pub abnormal: usize,
    /// CRITICAL_HIGH or CRITICAL_LOW
    pub critical: usize,
}

impl StatusCounts {
    pub fn tally<I: IntoIterator<Item = Status>>(statuses: I) -> Self {
        statuses.into_iter().fold(Self::default(), |mut counts, status| {
            counts.total += 1;
            if status.is_critical() {
                counts.critical += 1;
            } else if status.is_abnormal() {
                counts.abnormal += 1;
            } else {
                counts.normal += 1;
            }
            counts
        })
    }
}

/// List entry for a test event
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "with-api", derive(ToSchema))]
pub struct TestEventSummary {
    pub test: TestEvent,
    pub counts: StatusCounts,
}

/// A test event with all of its values, in catalog order
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "with-api", derive(ToSchema))]
pub struct TestEventDetail {
    pub test: TestEvent,
    pub measurements: Vec<MeasurementDetail>,
}
