use serde::{Deserialize, Serialize};
use std::fmt;

/// The reasoning stages a pipeline can run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StageKind {
    /// Open-ended intent classification.
    Classify,
    /// Turns the conversation into structured requirements.
    Requirements,
    /// Ranks catalog templates against the requirements.
    Recommend,
    /// Asks questions that narrow down the candidates.
    Questions,
    /// Picks one candidate from the user's reply.
    Select,
    /// Plans modifications to the selected template.
    Edit,
    /// Summarizes the finished mockup.
    Report,
    /// Writes a free-form conversational reply.
    Format,
}

impl StageKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Classify => "classify",
            Self::Requirements => "requirements",
            Self::Recommend => "recommend",
            Self::Questions => "questions",
            Self::Select => "select",
            Self::Edit => "edit",
            Self::Report => "report",
            Self::Format => "format",
        }
    }

    /// Name used when talking to the user about a stage.
    pub fn display_name(&self) -> &'static str {
        match self {
            Self::Classify => "intent analysis",
            Self::Requirements => "requirements analysis",
            Self::Recommend => "template recommendation",
            Self::Questions => "question generation",
            Self::Select => "template selection",
            Self::Edit => "template editing",
            Self::Report => "report generation",
            Self::Format => "response writing",
        }
    }
}

impl fmt::Display for StageKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
