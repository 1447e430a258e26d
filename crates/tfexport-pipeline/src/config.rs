//! Configuration for the export pipeline

use crate::error::{ExportError, Result};
use serde::{Deserialize, Serialize};

/// What a population group does once one of its producers fails
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailurePolicy {
    /// Abort the producers still running and report the failure
    FailFast,
    /// Let every dispatched producer finish and report all failures
    #[default]
    RunToCompletion,
}

/// Pipeline configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PipelineConfig {
    /// Maximum number of producers running at the same time
    #[serde(default = "default_max_concurrent")]
    pub max_concurrent_producers: usize,

    /// Behaviour of a population group after a producer fails
    #[serde(default)]
    pub failure_policy: FailurePolicy,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            max_concurrent_producers: default_max_concurrent(),
            failure_policy: FailurePolicy::default(),
        }
    }
}

impl PipelineConfig {
    pub fn with_max_concurrent_producers(mut self, max: usize) -> Self {
        self.max_concurrent_producers = max;
        self
    }

    pub fn with_failure_policy(mut self, policy: FailurePolicy) -> Self {
        self.failure_policy = policy;
        self
    }

    /// Reject settings the pipeline cannot run with
    pub fn validate(&self) -> Result<()> {
        if self.max_concurrent_producers == 0 {
            return Err(ExportError::InvalidConfig(
                "max_concurrent_producers must be at least 1".into(),
            ));
        }
        Ok(())
    }
}

fn default_max_concurrent() -> usize {
    10
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = PipelineConfig::default();
        assert_eq!(config.max_concurrent_producers, 10);
        assert_eq!(config.failure_policy, FailurePolicy::RunToCompletion);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_zero_concurrency_rejected() {
        let config = PipelineConfig::default().with_max_concurrent_producers(0);
        assert!(matches!(config.validate(), Err(ExportError::InvalidConfig(_))));
    }

    #[test]
    fn test_deserialize_partial_config() {
        let config: PipelineConfig =
            serde_json::from_str(r#"{ "failure_policy": "fail_fast" }"#).unwrap();
        assert_eq!(config.max_concurrent_producers, 10);
        assert_eq!(config.failure_policy, FailurePolicy::FailFast);
    }
}
