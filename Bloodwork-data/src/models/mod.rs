// Storage models shared by the SQLite and in-memory backends
pub mod catalog;
pub mod measurement;
pub mod test_event;

pub use catalog::MeasurementDefinitionRecord;
pub use measurement::{HistoryPointRecord, MeasurementRecord, MeasurementWithDefinitionRecord, NewMeasurementRecord, StatusCountRecord};
pub use test_event::{NewTestEventRecord, TestEventRecord};
