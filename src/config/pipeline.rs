//! Stage timeout and retry configuration

use serde::Deserialize;
use std::time::Duration;

use super::error::ValidationError;
use crate::application::RetryPolicy;

/// Bounds applied to every stage call
#[derive(Debug, Clone, Deserialize)]
pub struct PipelineConfig {
    /// Per-attempt timeout in seconds
    #[serde(default = "default_stage_timeout")]
    pub stage_timeout_secs: u64,

    /// Extra attempts after a retryable failure
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,

    /// First backoff delay in milliseconds
    #[serde(default = "default_base_delay")]
    pub retry_base_delay_ms: u64,

    /// Backoff cap in milliseconds
    #[serde(default = "default_max_delay")]
    pub retry_max_delay_ms: u64,
}

impl PipelineConfig {
    pub fn stage_timeout(&self) -> Duration {
        Duration::from_secs(self.stage_timeout_secs)
    }

    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy {
            max_retries: self.max_retries,
            base_delay: Duration::from_millis(self.retry_base_delay_ms),
            max_delay: Duration::from_millis(self.retry_max_delay_ms),
        }
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.stage_timeout_secs == 0 {
            return Err(ValidationError::InvalidTimeout);
        }
        if self.retry_base_delay_ms > self.retry_max_delay_ms {
            return Err(ValidationError::InvalidRetryDelays);
        }
        Ok(())
    }
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            stage_timeout_secs: default_stage_timeout(),
            max_retries: default_max_retries(),
            retry_base_delay_ms: default_base_delay(),
            retry_max_delay_ms: default_max_delay(),
        }
    }
}

fn default_stage_timeout() -> u64 {
    30
}

fn default_max_retries() -> u32 {
    2
}

fn default_base_delay() -> u64 {
    500
}

fn default_max_delay() -> u64 {
    8_000
}
