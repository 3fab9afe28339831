//! Named session slots and the diffs that change them.
//!
//! Slots are never edited in place by pipeline code. Stages produce
//! [`SlotUpdate`]s which are buffered into a [`SlotDiff`] and applied by the
//! orchestrator in one step once the turn has an outcome.

use serde::{Deserialize, Serialize};

use super::ClarificationRequest;
use crate::domain::mockup::{
    Candidate, ClarifyingQuestion, EditPlan, Report, Requirements, SelectedArtifact,
};

/// Everything the workflow remembers between turns, apart from history.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Slots {
    pub requirements: Option<Requirements>,
    pub recommendations: Vec<Candidate>,
    pub clarifying_questions: Vec<ClarifyingQuestion>,
    pub selected_artifact: Option<SelectedArtifact>,
    pub pending_clarification: Option<ClarificationRequest>,
    /// Page category detected by the classifier or requirements stage.
    pub category: Option<String>,
    pub modifications: Vec<EditPlan>,
    pub report: Option<Report>,
}

impl Slots {
    pub fn has_selected_artifact(&self) -> bool {
        self.selected_artifact.is_some()
    }

    /// Applies a single update.
    pub fn apply(&mut self, update: SlotUpdate) {
        match update {
            SlotUpdate::SetRequirements(requirements) => {
                if let Some(page_type) = &requirements.page_type {
                    self.category = Some(page_type.clone());
                }
                self.requirements = Some(requirements);
            }
            SlotUpdate::SetRecommendations(candidates) => self.recommendations = candidates,
            SlotUpdate::SetClarifyingQuestions(questions) => {
                self.clarifying_questions = questions
            }
            SlotUpdate::SelectArtifact(artifact) => self.selected_artifact = Some(artifact),
            SlotUpdate::SetCategory(category) => self.category = Some(category),
            SlotUpdate::AppendModification(plan) => self.modifications.push(plan),
            SlotUpdate::SetReport(report) => self.report = Some(report),
            SlotUpdate::SetPendingClarification(request) => {
                self.pending_clarification = Some(request)
            }
            SlotUpdate::ClearPendingClarification => self.pending_clarification = None,
        }
    }
}

/// A single change to the session slots.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "op", content = "value", rename_all = "snake_case")]
pub enum SlotUpdate {
    /// Also sets the category when the requirements carry a page type.
    SetRequirements(Requirements),
    SetRecommendations(Vec<Candidate>),
    SetClarifyingQuestions(Vec<ClarifyingQuestion>),
    SelectArtifact(SelectedArtifact),
    SetCategory(String),
    AppendModification(EditPlan),
    SetReport(Report),
    SetPendingClarification(ClarificationRequest),
    ClearPendingClarification,
}

/// Ordered list of slot updates. Later updates win over earlier ones.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SlotDiff(Vec<SlotUpdate>);

impl SlotDiff {
    pub fn new() -> Self {
        Self(Vec::new())
    }

    pub fn push(&mut self, update: SlotUpdate) {
        self.0.push(update);
    }

    pub fn extend(&mut self, other: SlotDiff) {
        self.0.extend(other.0);
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = &SlotUpdate> {
        self.0.iter()
    }

    /// Applies every update in order.
    pub fn apply_to(self, slots: &mut Slots) {
        for update in self.0 {
            slots.apply(update);
        }
    }
}

impl From<Vec<SlotUpdate>> for SlotDiff {
    fn from(updates: Vec<SlotUpdate>) -> Self {
        Self(updates)
    }
}
