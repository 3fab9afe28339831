//! Intent labels and their phase-scoped vocabularies.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::domain::session::Phase;

/// What the user wants from this turn.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IntentLabel {
    CreateMockup,
    RequestRecommendations,
    QuestionAnswer,
    SelectTemplate,
    Clarification,
    Modification,
    Confirmation,
    /// Explicit modification of an already selected template. Bypasses the
    /// phase table and jumps to editing.
    EditOverride,
    EditRequest,
    Report,
    NotUnderstood,
    General,
}

impl IntentLabel {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::CreateMockup => "create_mockup",
            Self::RequestRecommendations => "request_recommendations",
            Self::QuestionAnswer => "question_answer",
            Self::SelectTemplate => "select_template",
            Self::Clarification => "clarification",
            Self::Modification => "modification",
            Self::Confirmation => "confirmation",
            Self::EditOverride => "edit_override",
            Self::EditRequest => "edit_request",
            Self::Report => "report",
            Self::NotUnderstood => "not_understood",
            Self::General => "general",
        }
    }

    /// Parses a label as written by the classification stage.
    ///
    /// Accepts the older label names the stage prompts used to produce.
    pub fn parse(raw: &str) -> Option<Self> {
        let normalized = raw.trim().to_ascii_lowercase().replace(['-', ' '], "_");
        let label = match normalized.as_str() {
            "create_mockup" | "create_ui_mockup" | "requirements_analysis" => Self::CreateMockup,
            "request_recommendations" | "template_recommendation" => Self::RequestRecommendations,
            "question_answer" => Self::QuestionAnswer,
            "select_template" | "template_selection" => Self::SelectTemplate,
            "clarification" => Self::Clarification,
            "modification" => Self::Modification,
            "confirmation" => Self::Confirmation,
            "edit_override" => Self::EditOverride,
            "edit_request" | "editing" => Self::EditRequest,
            "report" | "report_generation" => Self::Report,
            "not_understood" | "not_understand" => Self::NotUnderstood,
            "general" => Self::General,
            _ => return None,
        };
        Some(label)
    }
}

impl fmt::Display for IntentLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Labels the classifier may return in `phase`.
pub fn vocabulary(phase: Phase) -> &'static [IntentLabel] {
    use IntentLabel::*;
    match phase {
        Phase::Initial => &[
            CreateMockup,
            RequestRecommendations,
            SelectTemplate,
            EditRequest,
            Report,
            General,
        ],
        Phase::Recommendation => &[
            QuestionAnswer,
            SelectTemplate,
            Clarification,
            Modification,
            Confirmation,
            NotUnderstood,
            General,
        ],
        Phase::Selection => &[
            EditRequest,
            Modification,
            Report,
            Confirmation,
            NotUnderstood,
            General,
        ],
        Phase::Editing => &[
            Modification,
            Clarification,
            Confirmation,
            Report,
            NotUnderstood,
            General,
        ],
        Phase::RequirementsGathering | Phase::ReportReady => &[
            Clarification,
            Modification,
            Confirmation,
            NotUnderstood,
            General,
        ],
    }
}

/// Label used when the classifier produced something outside the
/// vocabulary of `phase`.
pub fn phase_default(_phase: Phase) -> IntentLabel {
    IntentLabel::General
}

/// Keeps `label` if `phase` allows it, otherwise returns the phase default.
///
/// `EditOverride` is out-of-band and always survives.
pub fn coerce(phase: Phase, label: IntentLabel) -> IntentLabel {
    if label == IntentLabel::EditOverride || vocabulary(phase).contains(&label) {
        label
    } else {
        phase_default(phase)
    }
}
