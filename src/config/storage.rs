//! Session storage configuration

use serde::Deserialize;
use std::path::PathBuf;
use std::time::Duration;

use super::error::ValidationError;
use crate::adapters::storage::DEFAULT_KEY_PREFIX;

/// Where sessions are kept
#[derive(Debug, Clone, Copy, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum StorageBackend {
    #[default]
    Memory,
    File,
    Redis,
}

#[derive(Debug, Clone, Deserialize)]
pub struct StorageConfig {
    #[serde(default)]
    pub backend: StorageBackend,

    /// Directory for the file backend
    #[serde(default = "default_path")]
    pub path: PathBuf,

    /// Connection URL for the redis backend
    pub redis_url: Option<String>,

    /// Key namespace for the redis backend
    #[serde(default = "default_key_prefix")]
    pub key_prefix: String,

    /// Expiry for redis sessions in seconds; sessions never expire when unset
    pub ttl_secs: Option<u64>,
}

impl StorageConfig {
    pub fn ttl(&self) -> Option<Duration> {
        self.ttl_secs.map(Duration::from_secs)
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.backend != StorageBackend::Redis {
            return Ok(());
        }
        let url = self
            .redis_url
            .as_deref()
            .filter(|u| !u.is_empty())
            .ok_or(ValidationError::MissingRequired("STORAGE__REDIS_URL"))?;
        if !url.starts_with("redis://") && !url.starts_with("rediss://") {
            return Err(ValidationError::InvalidRedisUrl);
        }
        if self.ttl_secs == Some(0) {
            return Err(ValidationError::InvalidTimeout);
        }
        Ok(())
    }
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            backend: StorageBackend::default(),
            path: default_path(),
            redis_url: None,
            key_prefix: default_key_prefix(),
            ttl_secs: None,
        }
    }
}

fn default_path() -> PathBuf {
    PathBuf::from("./sessions")
}

fn default_key_prefix() -> String {
    DEFAULT_KEY_PREFIX.to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_memory_is_default() {
        let config = StorageConfig::default();
        assert_eq!(config.backend, StorageBackend::Memory);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_redis_requires_url() {
        let config = StorageConfig {
            backend: StorageBackend::Redis,
            ..Default::default()
        };
        assert!(matches!(
            config.validate(),
            Err(ValidationError::MissingRequired(_))
        ));
    }

    #[test]
    fn test_redis_url_scheme_checked() {
        let config = StorageConfig {
            backend: StorageBackend::Redis,
            redis_url: Some("http://localhost:6379".to_string()),
            ..Default::default()
        };
        assert!(matches!(config.validate(), Err(ValidationError::InvalidRedisUrl)));
    }

    #[test]
    fn test_ttl_duration() {
        let config = StorageConfig {
            ttl_secs: Some(3600),
            ..Default::default()
        };
        assert_eq!(config.ttl(), Some(Duration::from_secs(3600)));
    }
}
