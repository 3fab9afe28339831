use serde::{Deserialize, Serialize};

use crate::domain::workflow::StageKind;

/// A question the assistant asked because a stage could not decide on its
/// own. Stored on the session until the next turn answers it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClarificationRequest {
    pub reason: String,
    #[serde(default)]
    pub options: Vec<String>,
    pub originating_stage: StageKind,
}

impl ClarificationRequest {
    pub fn new(reason: impl Into<String>, originating_stage: StageKind) -> Self {
        Self {
            reason: reason.into(),
            options: Vec::new(),
            originating_stage,
        }
    }

    pub fn with_options(mut self, options: Vec<String>) -> Self {
        self.options = options;
        self
    }
}
