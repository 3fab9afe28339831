//! Normalized stage payloads.

use serde::{Deserialize, Serialize};

use crate::domain::mockup::{
    Candidate, ClarifyingQuestion, EditPlan, Report, Requirements, SelectedArtifact,
};

/// Raw answer of the classification stage, before vocabulary coercion.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IntentPayload {
    pub label: String,
    #[serde(default)]
    pub page_type: Option<String>,
}

/// A stage could not decide and wants the user to choose.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Ambiguity {
    pub reason: String,
    #[serde(default)]
    pub options: Vec<String>,
}

/// The normalized output of one stage.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "data", rename_all = "snake_case")]
pub enum StagePayload {
    Intent(IntentPayload),
    Requirements(Requirements),
    Recommendations(Vec<Candidate>),
    Questions(Vec<ClarifyingQuestion>),
    Selection(SelectedArtifact),
    Edit(EditPlan),
    Report(Report),
    Text(String),
    Ambiguous(Ambiguity),
}

impl StagePayload {
    pub fn is_ambiguous(&self) -> bool {
        matches!(self, Self::Ambiguous(_))
    }

    /// The single candidate, if this is a recommendation list of length one.
    pub fn single_candidate(&self) -> Option<&Candidate> {
        match self {
            Self::Recommendations(candidates) if candidates.len() == 1 => candidates.first(),
            _ => None,
        }
    }
}
