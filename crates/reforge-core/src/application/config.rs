//! Explicit configuration handed to the orchestrator at construction.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::domain::{ComplianceWeights, DomainError, ExtractionPolicy};

/// Upper bound for the default worker count.
pub const MAX_DEFAULT_WORKERS: usize = 8;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RegenerationConfig {
    /// Environment context to render against.
    pub environment: String,
    #[serde(rename = "artifact_timeout_secs", with = "duration_secs")]
    pub artifact_timeout: Duration,
    #[serde(rename = "batch_timeout_secs", with = "duration_secs")]
    pub batch_timeout: Duration,
    pub max_workers: usize,
    pub extraction: ExtractionPolicy,
    pub weights: ComplianceWeights,
}

impl Default for RegenerationConfig {
    fn default() -> Self {
        Self {
            environment: "production".into(),
            artifact_timeout: Duration::from_secs(30),
            batch_timeout: Duration::from_secs(300),
            max_workers: default_workers(),
            extraction: ExtractionPolicy::default(),
            weights: ComplianceWeights::default(),
        }
    }
}

impl RegenerationConfig {
    pub fn with_environment(mut self, environment: impl Into<String>) -> Self {
        self.environment = environment.into();
        self
    }

    pub fn with_workers(mut self, workers: usize) -> Self {
        self.max_workers = workers;
        self
    }

    pub fn with_artifact_timeout(mut self, timeout: Duration) -> Self {
        self.artifact_timeout = timeout;
        self
    }

    pub fn with_batch_timeout(mut self, timeout: Duration) -> Self {
        self.batch_timeout = timeout;
        self
    }

    pub fn validate(&self) -> Result<(), DomainError> {
        if self.environment.trim().is_empty() {
            return Err(DomainError::InvalidPolicy("environment cannot be empty".into()));
        }
        if self.max_workers == 0 {
            return Err(DomainError::InvalidPolicy("max_workers must be at least 1".into()));
        }
        if self.artifact_timeout.is_zero() || self.batch_timeout.is_zero() {
            return Err(DomainError::InvalidPolicy("timeouts must be positive".into()));
        }
        self.extraction.validate()?;
        self.weights.validate()
    }
}

fn default_workers() -> usize {
    std::thread::available_parallelism()
        .map_or(1, |n| n.get())
        .min(MAX_DEFAULT_WORKERS)
}

/// (De)serialize a `Duration` as fractional seconds.
pub mod duration_secs {
    use std::time::Duration;

    use serde::{Deserialize, Deserializer, Serializer, de::Error};

    pub fn serialize<S: Serializer>(value: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_f64(value.as_secs_f64())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Duration, D::Error> {
        let secs = f64::deserialize(deserializer)?;
        Duration::try_from_secs_f64(secs).map_err(D::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_valid() {
        let config = RegenerationConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.environment, "production");
        assert_eq!(config.artifact_timeout, Duration::from_secs(30));
        assert_eq!(config.batch_timeout, Duration::from_secs(300));
        assert!((1..=MAX_DEFAULT_WORKERS).contains(&config.max_workers));
    }

    #[test]
    fn zero_workers_rejected() {
        assert!(RegenerationConfig::default().with_workers(0).validate().is_err());
    }

    #[test]
    fn serializes_timeouts_as_seconds() {
        let json = serde_json::to_value(RegenerationConfig::default()).unwrap();
        assert_eq!(json["artifact_timeout_secs"], 30.0);
        assert_eq!(json["batch_timeout_secs"], 300.0);

        let parsed: RegenerationConfig =
            serde_json::from_str(r#"{"environment":"staging","artifact_timeout_secs":1.5}"#).unwrap();
        assert_eq!(parsed.environment, "staging");
        assert_eq!(parsed.artifact_timeout, Duration::from_millis(1500));
        assert_eq!(parsed.batch_timeout, Duration::from_secs(300));
    }
}
