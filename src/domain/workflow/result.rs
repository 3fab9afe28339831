use serde::{Deserialize, Serialize};
use std::fmt;

use super::{StageKind, StagePayload};

/// Why a stage failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StageErrorKind {
    /// The service answered but no usable record could be recovered.
    InvalidOutput,
    /// The service could not be reached, failed, or timed out.
    ServiceUnavailable,
}

impl StageErrorKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::InvalidOutput => "invalid_output",
            Self::ServiceUnavailable => "service_unavailable",
        }
    }
}

impl fmt::Display for StageErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StageError {
    pub kind: StageErrorKind,
    /// Only ever true for `ServiceUnavailable`.
    pub retryable: bool,
    pub detail: String,
}

/// Outcome of one stage invocation. Produced once, never mutated after the
/// executor has recorded the attempt count.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StageResult {
    pub stage: StageKind,
    pub success: bool,
    pub payload: Option<StagePayload>,
    /// Unprocessed service output, kept for auditing.
    pub raw_text: Option<String>,
    pub error: Option<StageError>,
    pub attempts: u32,
}

impl StageResult {
    pub fn succeeded(stage: StageKind, payload: StagePayload, raw_text: impl Into<String>) -> Self {
        Self {
            stage,
            success: true,
            payload: Some(payload),
            raw_text: Some(raw_text.into()),
            error: None,
            attempts: 1,
        }
    }

    pub fn invalid_output(
        stage: StageKind,
        raw_text: impl Into<String>,
        detail: impl Into<String>,
    ) -> Self {
        Self {
            stage,
            success: false,
            payload: None,
            raw_text: Some(raw_text.into()),
            error: Some(StageError {
                kind: StageErrorKind::InvalidOutput,
                retryable: false,
                detail: detail.into(),
            }),
            attempts: 1,
        }
    }

    pub fn service_unavailable(stage: StageKind, retryable: bool, detail: impl Into<String>) -> Self {
        Self {
            stage,
            success: false,
            payload: None,
            raw_text: None,
            error: Some(StageError {
                kind: StageErrorKind::ServiceUnavailable,
                retryable,
                detail: detail.into(),
            }),
            attempts: 1,
        }
    }

    pub fn with_attempts(mut self, attempts: u32) -> Self {
        self.attempts = attempts;
        self
    }

    pub fn error_kind(&self) -> Option<StageErrorKind> {
        self.error.as_ref().map(|e| e.kind)
    }

    /// True for transport or timeout failures the executor may retry.
    pub fn is_retryable_failure(&self) -> bool {
        self.error
            .as_ref()
            .map(|e| e.kind == StageErrorKind::ServiceUnavailable && e.retryable)
            .unwrap_or(false)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_kinds_use_wire_names() {
        assert_eq!(StageErrorKind::InvalidOutput.to_string(), "invalid_output");
        assert_eq!(
            serde_json::to_string(&StageErrorKind::ServiceUnavailable).unwrap(),
            "\"service_unavailable\""
        );
    }

    #[test]
    fn invalid_output_is_never_retryable() {
        let result = StageResult::invalid_output(StageKind::Recommend, "garbage", "no record");
        assert!(!result.success);
        assert!(!result.is_retryable_failure());
        assert_eq!(result.raw_text.as_deref(), Some("garbage"));
    }

    #[test]
    fn service_unavailable_respects_retryable_flag() {
        assert!(StageResult::service_unavailable(StageKind::Edit, true, "503").is_retryable_failure());
        assert!(!StageResult::service_unavailable(StageKind::Edit, false, "401").is_retryable_failure());
    }

    #[test]
    fn success_has_no_error() {
        let result = StageResult::succeeded(StageKind::Format, StagePayload::Text("hi".into()), "hi");
        assert!(result.success);
        assert_eq!(result.error_kind(), None);
        assert!(!result.is_retryable_failure());
    }
}
