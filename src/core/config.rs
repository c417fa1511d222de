use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::core::errors::{JobsError, Result};

/// Registry configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct JobsConfig {
    /// Label used in registry logs
    pub name: String,
    /// Upper bound for each per-job wait during a registry run (None = wait forever)
    pub wait_timeout_ms: Option<u64>,
    /// Install a tracing hook on every job when no explicit hook is given
    pub trace_events: bool,
}

impl Default for JobsConfig {
    fn default() -> Self {
        Self {
            name: "jobs".to_string(),
            wait_timeout_ms: None,
            trace_events: false,
        }
    }
}

impl JobsConfig {
    pub fn named<S: Into<String>>(name: S) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.name.trim().is_empty() {
            return Err(JobsError::configuration("name must not be empty"));
        }
        if self.wait_timeout_ms == Some(0) {
            return Err(JobsError::configuration(
                "wait_timeout_ms must be greater than 0",
            ));
        }
        Ok(())
    }

    pub fn wait_timeout(&self) -> Option<Duration> {
        self.wait_timeout_ms.map(Duration::from_millis)
    }

    /// Parse and validate a JSON configuration document
    pub fn from_json_str(json: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_json_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path)
            .map_err(|e| JobsError::io(format!("read {}", path.display()), e))?;
        Self::from_json_str(&raw)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_defaults_fill_missing_fields() {
        let config = JobsConfig::from_json_str(r#"{ "wait_timeout_ms": 250 }"#).unwrap();
        assert_eq!(config.name, "jobs");
        assert_eq!(config.wait_timeout(), Some(Duration::from_millis(250)));
        assert!(!config.trace_events);
    }

    #[test]
    fn test_validation_rejects_zero_timeout() {
        let err = JobsConfig::from_json_str(r#"{ "wait_timeout_ms": 0 }"#).unwrap_err();
        assert_eq!(err.category(), "configuration");
    }

    #[test]
    fn test_validation_rejects_blank_name() {
        let config = JobsConfig::named("  ");
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_malformed_json() {
        let err = JobsConfig::from_json_str("{ not json").unwrap_err();
        assert_eq!(err.category(), "serialization");
    }

    #[test]
    fn test_missing_file() {
        let err = JobsConfig::from_json_file("definitely/not/here.json").unwrap_err();
        assert_eq!(err.category(), "io");
    }
}
