//! Application configuration module
//!
//! This module provides type-safe configuration loading from environment variables
//! using the `config` and `dotenvy` crates. Configuration is loaded with the
//! `MOCKUP_SHERPA` prefix and nested values use double underscores as separators.
//!
//! # Example
//!
//! ```no_run
//! use mockup_sherpa::config::AppConfig;
//!
//! let config = AppConfig::load().expect("Failed to load configuration");
//! config.validate().expect("Invalid configuration");
//!
//! println!("Sessions stored in {:?}", config.storage.backend);
//! ```

mod ai;
mod catalog;
mod error;
mod intent;
mod logging;
mod pipeline;
mod storage;

pub use ai::{AiConfig, AiProvider};
pub use catalog::CatalogConfig;
pub use error::{ConfigError, ValidationError};
pub use intent::IntentConfig;
pub use logging::{LogFormat, LoggingConfig};
pub use pipeline::PipelineConfig;
pub use storage::{StorageBackend, StorageConfig};

use serde::Deserialize;

/// Root application configuration
///
/// Every section has defaults, so an empty environment loads; the Anthropic
/// key is then the only thing [`AppConfig::validate`] insists on.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AppConfig {
    /// Completion provider and per-call settings
    #[serde(default)]
    pub ai: AiConfig,

    /// Stage timeout and retry bounds
    #[serde(default)]
    pub pipeline: PipelineConfig,

    /// Guardrails and model fallback
    #[serde(default)]
    pub intent: IntentConfig,

    /// Session persistence backend
    #[serde(default)]
    pub storage: StorageConfig,

    /// Template catalog source
    #[serde(default)]
    pub catalog: CatalogConfig,

    #[serde(default)]
    pub logging: LoggingConfig,
}

impl AppConfig {
    /// Load configuration from environment variables
    ///
    /// This function:
    /// 1. Loads `.env` file if present (for development)
    /// 2. Reads environment variables with `MOCKUP_SHERPA` prefix
    /// 3. Uses `__` (double underscore) to separate nested values
    /// 4. Deserializes into typed configuration structs
    ///
    /// # Environment Variable Format
    ///
    /// - `MOCKUP_SHERPA__AI__ANTHROPIC_API_KEY=...` -> `ai.anthropic_api_key = ...`
    /// - `MOCKUP_SHERPA__STORAGE__BACKEND=redis` -> `storage.backend = redis`
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if values cannot be parsed into expected types.
    pub fn load() -> Result<Self, ConfigError> {
        // Load .env file if present (development)
        dotenvy::dotenv().ok();

        let config = config::Config::builder()
            .add_source(
                config::Environment::default()
                    .prefix("MOCKUP_SHERPA")
                    .separator("__"),
            )
            .build()?
            .try_deserialize()?;

        Ok(config)
    }

    /// Validate all configuration values
    ///
    /// # Errors
    ///
    /// Returns `ValidationError` if any configuration value is invalid.
    pub fn validate(&self) -> Result<(), ValidationError> {
        self.ai.validate()?;
        self.pipeline.validate()?;
        self.intent.validate()?;
        self.storage.validate()?;
        self.catalog.validate()?;
        self.logging.validate()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::env;
    use std::sync::Mutex;

    // Mutex to ensure tests don't run in parallel (env vars are global)
    static ENV_MUTEX: Mutex<()> = Mutex::new(());

    const VARS: &[&str] = &[
        "MOCKUP_SHERPA__AI__ANTHROPIC_API_KEY",
        "MOCKUP_SHERPA__AI__PROVIDER",
        "MOCKUP_SHERPA__STORAGE__BACKEND",
        "MOCKUP_SHERPA__STORAGE__REDIS_URL",
        "MOCKUP_SHERPA__PIPELINE__MAX_RETRIES",
        "MOCKUP_SHERPA__LOGGING__FORMAT",
    ];

    fn clear_env() {
        for var in VARS {
            env::remove_var(var);
        }
    }

    #[test]
    fn test_load_from_environment() {
        let _guard = ENV_MUTEX.lock().unwrap();
        env::set_var("MOCKUP_SHERPA__AI__ANTHROPIC_API_KEY", "sk-ant-xxx");
        env::set_var("MOCKUP_SHERPA__PIPELINE__MAX_RETRIES", "4");
        let result = AppConfig::load();
        clear_env();

        assert!(result.is_ok(), "Failed to load config: {:?}", result.err());
        let config = result.unwrap();
        assert!(config.ai.has_anthropic());
        assert_eq!(config.pipeline.max_retries, 4);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_defaults_without_environment() {
        let _guard = ENV_MUTEX.lock().unwrap();
        clear_env();
        let config = AppConfig::load().unwrap();

        assert_eq!(config.storage.backend, StorageBackend::Memory);
        assert_eq!(config.logging.format, LogFormat::Pretty);
        assert!(config.intent.model_fallback);
        assert!(config.catalog.path.is_none());
    }

    #[test]
    fn test_missing_key_fails_validation() {
        let _guard = ENV_MUTEX.lock().unwrap();
        clear_env();
        let config = AppConfig::load().unwrap();

        assert!(config.validate().is_err());
    }

    #[test]
    fn test_enum_sections_parse_lowercase() {
        let _guard = ENV_MUTEX.lock().unwrap();
        env::set_var("MOCKUP_SHERPA__AI__PROVIDER", "mock");
        env::set_var("MOCKUP_SHERPA__STORAGE__BACKEND", "redis");
        env::set_var("MOCKUP_SHERPA__STORAGE__REDIS_URL", "redis://localhost:6379");
        env::set_var("MOCKUP_SHERPA__LOGGING__FORMAT", "json");
        let result = AppConfig::load();
        clear_env();

        let config = result.unwrap();
        assert_eq!(config.ai.provider, AiProvider::Mock);
        assert_eq!(config.storage.backend, StorageBackend::Redis);
        assert_eq!(config.logging.format, LogFormat::Json);
        assert!(config.validate().is_ok());
    }
}
