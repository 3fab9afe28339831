//! Template catalog configuration

use serde::Deserialize;
use std::path::PathBuf;

use super::error::ValidationError;

#[derive(Debug, Clone, Default, Deserialize)]
pub struct CatalogConfig {
    /// YAML file listing the templates; no catalog when unset
    pub path: Option<PathBuf>,
}

impl CatalogConfig {
    pub fn validate(&self) -> Result<(), ValidationError> {
        match &self.path {
            Some(path) if !path.is_file() => Err(ValidationError::FileNotFound(path.clone())),
            _ => Ok(()),
        }
    }
}
