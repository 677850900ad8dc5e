use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

#[cfg(feature = "with-api")]
use utoipa::ToSchema;

/// Classification of a single measured value against its reference range
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[cfg_attr(feature = "with-api", derive(ToSchema))]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Status {
    Normal,
    High,
    Low,
    CriticalHigh,
    CriticalLow,
}

/// A stored status string that is not one of the known names
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Unknown measurement status: {0}")]
pub struct ParseStatusError(pub String);

impl Status {
    /// Upper-case name used for storage and on the wire
    pub fn as_str(&self) -> &'static str {
        match self {
            Status::Normal => "NORMAL",
            Status::High => "HIGH",
            Status::Low => "LOW",
            Status::CriticalHigh => "CRITICAL_HIGH",
            Status::CriticalLow => "CRITICAL_LOW",
        }
    }

    /// HIGH or CRITICAL_HIGH
    pub fn is_elevated(&self) -> bool {
        matches!(self, Status::High | Status::CriticalHigh)
    }

    /// HIGH or LOW, the non-critical deviations
    pub fn is_abnormal(&self) -> bool {
        matches!(self, Status::High | Status::Low)
    }

    pub fn is_critical(&self) -> bool {
        matches!(self, Status::CriticalHigh | Status::CriticalLow)
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Status {
    type Err = ParseStatusError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "NORMAL" => Ok(Status::Normal),
            "HIGH" => Ok(Status::High),
            "LOW" => Ok(Status::Low),
            "CRITICAL_HIGH" => Ok(Status::CriticalHigh),
            "CRITICAL_LOW" => Ok(Status::CriticalLow),
            other => Err(ParseStatusError(other.to_string())),
        }
    }
}

/// Severity of a constellation finding
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[cfg_attr(feature = "with-api", derive(ToSchema))]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Severity {
    Info,
    Warning,
    Critical,
}

/// Sex of the subject, used to pick a sex-specific reference range
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[cfg_attr(feature = "with-api", derive(ToSchema))]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Sex {
    Male,
    Female,
    /// Only the sex-independent range applies
    Unspecified,
}

impl FromStr for Sex {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "male" | "m" => Ok(Sex::Male),
            "female" | "f" => Ok(Sex::Female),
            "unspecified" | "none" | "" => Ok(Sex::Unspecified),
            other => Err(format!("Unknown sex '{}', expected male, female or unspecified", other)),
        }
    }
}
