//! Configuration error types

use std::path::PathBuf;
use thiserror::Error;

/// Errors that can occur during configuration loading
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Configuration loading failed: {0}")]
    LoadError(#[from] config::ConfigError),

    #[error("Validation failed: {0}")]
    ValidationFailed(#[from] ValidationError),
}

/// Errors that can occur during configuration validation
#[derive(Debug, Error)]
pub enum ValidationError {
    #[error("Required configuration missing: {0}")]
    MissingRequired(&'static str),

    #[error("Invalid timeout")]
    InvalidTimeout,

    #[error("Retry base delay exceeds max delay")]
    InvalidRetryDelays,

    #[error("Temperature must be between 0.0 and 1.0")]
    InvalidTemperature,

    #[error("Token limit must be positive")]
    InvalidTokenLimit,

    #[error("Invalid Redis URL format")]
    InvalidRedisUrl,

    #[error("File not found: {0}")]
    FileNotFound(PathBuf),
}
