//! AI provider and stage client configuration

use secrecy::{ExposeSecret, Secret};
use serde::Deserialize;
use std::collections::HashMap;
use std::time::Duration;

use super::error::ValidationError;
use crate::domain::workflow::StageKind;

/// AI provider configuration
#[derive(Debug, Clone, Deserialize)]
pub struct AiConfig {
    /// Which completion service backs the stages
    #[serde(default)]
    pub provider: AiProvider,

    /// Anthropic API key
    pub anthropic_api_key: Option<Secret<String>>,

    /// Model name passed to the provider
    #[serde(default = "default_model")]
    pub model: String,

    /// Override for the provider's API base URL
    pub base_url: Option<String>,

    /// Transport timeout for a single request, in seconds
    #[serde(default = "default_timeout")]
    pub timeout_secs: u64,

    /// Sampling temperature for stage calls
    #[serde(default = "default_temperature")]
    pub temperature: f32,

    /// Token limit for stages without a specific limit
    #[serde(default = "default_max_tokens")]
    pub default_max_tokens: u32,

    /// Per-stage token limits, e.g. `AI__STAGE_MAX_TOKENS__RECOMMEND=4096`
    #[serde(default)]
    pub stage_max_tokens: HashMap<StageKind, u32>,
}

/// AI provider type
#[derive(Debug, Clone, Copy, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum AiProvider {
    #[default]
    Anthropic,
    /// Canned replies; for local runs without network access.
    Mock,
}

impl AiConfig {
    /// Get timeout as Duration
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    /// Check if Anthropic is configured
    pub fn has_anthropic(&self) -> bool {
        self.anthropic_api_key
            .as_ref()
            .is_some_and(|k| !k.expose_secret().is_empty())
    }

    /// Validate AI configuration
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.provider == AiProvider::Anthropic && !self.has_anthropic() {
            return Err(ValidationError::MissingRequired("ANTHROPIC_API_KEY"));
        }
        if self.model.trim().is_empty() {
            return Err(ValidationError::MissingRequired("AI__MODEL"));
        }
        if self.timeout_secs == 0 {
            return Err(ValidationError::InvalidTimeout);
        }
        if !(0.0..=1.0).contains(&self.temperature) {
            return Err(ValidationError::InvalidTemperature);
        }
        if self.default_max_tokens == 0 || self.stage_max_tokens.values().any(|t| *t == 0) {
            return Err(ValidationError::InvalidTokenLimit);
        }
        Ok(())
    }
}

impl Default for AiConfig {
    fn default() -> Self {
        Self {
            provider: AiProvider::default(),
            anthropic_api_key: None,
            model: default_model(),
            base_url: None,
            timeout_secs: default_timeout(),
            temperature: default_temperature(),
            default_max_tokens: default_max_tokens(),
            stage_max_tokens: HashMap::new(),
        }
    }
}

fn default_model() -> String {
    "claude-sonnet-4-20250514".to_string()
}

fn default_timeout() -> u64 {
    60
}

fn default_temperature() -> f32 {
    0.2
}

fn default_max_tokens() -> u32 {
    1024
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ai_config_defaults() {
        let config = AiConfig::default();
        assert_eq!(config.provider, AiProvider::Anthropic);
        assert_eq!(config.timeout_secs, 60);
        assert_eq!(config.default_max_tokens, 1024);
    }

    #[test]
    fn test_timeout_duration() {
        let config = AiConfig {
            timeout_secs: 15,
            ..Default::default()
        };
        assert_eq!(config.timeout(), Duration::from_secs(15));
    }

    #[test]
    fn test_validation_missing_key() {
        let config = AiConfig::default();
        assert!(matches!(
            config.validate(),
            Err(ValidationError::MissingRequired("ANTHROPIC_API_KEY"))
        ));
    }

    #[test]
    fn test_mock_provider_needs_no_key() {
        let config = AiConfig {
            provider: AiProvider::Mock,
            ..Default::default()
        };
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_validation_temperature_range() {
        let config = AiConfig {
            anthropic_api_key: Some(Secret::new("sk-ant-xxx".to_string())),
            temperature: 1.5,
            ..Default::default()
        };
        assert!(matches!(config.validate(), Err(ValidationError::InvalidTemperature)));
    }

    #[test]
    fn test_zero_stage_limit_rejected() {
        let config = AiConfig {
            anthropic_api_key: Some(Secret::new("sk-ant-xxx".to_string())),
            stage_max_tokens: HashMap::from([(StageKind::Recommend, 0)]),
            ..Default::default()
        };
        assert!(matches!(config.validate(), Err(ValidationError::InvalidTokenLimit)));
    }
}
