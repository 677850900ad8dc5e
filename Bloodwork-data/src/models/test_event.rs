use serde::{Deserialize, Serialize};

/// Storage model for one blood test event
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TestEventRecord {
    /// UUID of the test event
    pub id: String,

    /// Day the blood was drawn, formatted as YYYY-MM-DD
    pub test_date: String,

    /// Optional laboratory name
    pub lab_name: Option<String>,

    /// Optional ordering doctor
    pub doctor_name: Option<String>,

    /// Optional free-text notes
    pub notes: Option<String>,

    /// RFC 3339 creation timestamp
    pub created_at: String,
}

/// Metadata for creating or replacing a test event
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewTestEventRecord {
    pub test_date: String,
    pub lab_name: Option<String>,
    pub doctor_name: Option<String>,
    pub notes: Option<String>,
}
