//! Intent classification configuration

use serde::Deserialize;
use std::path::PathBuf;

use super::error::ValidationError;

#[derive(Debug, Clone, Deserialize)]
pub struct IntentConfig {
    /// YAML guardrail table replacing the built-in rules
    pub guardrails_path: Option<PathBuf>,

    /// Ask the model when no guardrail matches
    #[serde(default = "default_model_fallback")]
    pub model_fallback: bool,
}

impl IntentConfig {
    pub fn validate(&self) -> Result<(), ValidationError> {
        if let Some(path) = &self.guardrails_path {
            if !path.is_file() {
                return Err(ValidationError::FileNotFound(path.clone()));
            }
        }
        Ok(())
    }
}

impl Default for IntentConfig {
    fn default() -> Self {
        Self {
            guardrails_path: None,
            model_fallback: default_model_fallback(),
        }
    }
}

fn default_model_fallback() -> bool {
    true
}
