// Domain entities and value objects
pub mod catalog;
pub mod conversions;
pub mod finding;
pub mod history;
pub mod measurement;
pub mod status;
pub mod test_event;

// Re-export common types for easier imports
pub use catalog::{CatalogCategory, MeasurementDefinition, ReferenceRange};
pub use finding::ConstellationFinding;
pub use history::{HistoryPoint, ValueHistory};
pub use measurement::{
    ClassifiedMeasurement, Measurement, MeasurementDetail, MeasurementInput, RecordMeasurementRequest,
    UpdateMeasurementRequest,
};
pub use status::{ParseStatusError, Severity, Sex, Status};
pub use test_event::{
    CreateTestEventRequest, StatusCounts, TestEvent, TestEventDetail, TestEventSummary, UpdateTestEventRequest,
};
