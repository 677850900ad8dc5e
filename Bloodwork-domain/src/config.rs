//! Evaluation settings read from the environment

use std::env;

use thiserror::Error;
use tracing::debug;

use crate::entities::Sex;

pub const DEFAULT_SEX_VAR: &str = "BLOODWORK_DEFAULT_SEX";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Invalid value for {name}: {message}")]
    InvalidValue { name: &'static str, message: String },
}

/// Settings that influence how values are classified
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EvaluationSettings {
    /// Sex used when a request does not name one
    pub default_sex: Sex,
}

impl Default for EvaluationSettings {
    fn default() -> Self {
        Self { default_sex: Sex::Male }
    }
}

impl EvaluationSettings {
    pub fn new(default_sex: Sex) -> Self {
        Self { default_sex }
    }

    /// Read `BLOODWORK_DEFAULT_SEX`; unset keeps the default of male
    pub fn from_env() -> Result<Self, ConfigError> {
        match env::var(DEFAULT_SEX_VAR) {
            Ok(value) => Self::parse(&value),
            Err(_) => Ok(Self::default()),
        }
    }

    fn parse(value: &str) -> Result<Self, ConfigError> {
        let default_sex = value.parse::<Sex>().map_err(|message| ConfigError::InvalidValue {
            name: DEFAULT_SEX_VAR,
            message,
        })?;
        debug!("Default sex for classification: {:?}", default_sex);
        Ok(Self { default_sex })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_is_male() {
        assert_eq!(EvaluationSettings::default().default_sex, Sex::Male);
    }

    #[test]
    fn test_parse_setting() {
        assert_eq!(EvaluationSettings::parse("female").unwrap().default_sex, Sex::Female);
        assert_eq!(EvaluationSettings::parse("UNSPECIFIED").unwrap().default_sex, Sex::Unspecified);

        let err = EvaluationSettings::parse("robot").unwrap_err();
        assert!(err.to_string().contains(DEFAULT_SEX_VAR));
    }
}
