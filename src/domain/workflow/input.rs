//! What a stage gets to see.

use serde::Serialize;

use super::{StageKind, StagePayload};
use crate::domain::mockup::{Candidate, EditPlan, Requirements, SelectedArtifact};
use crate::domain::session::{ClarificationRequest, HistoryEntry, Phase, Slots};

/// The slice of session state a particular stage is allowed to read.
///
/// Stages never see the whole session. Each kind gets a fixed subset so
/// that changing the session layout does not ripple into stage prompts.
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct SlotProjection {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub requirements: Option<Requirements>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub recommendations: Vec<Candidate>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub selected_artifact: Option<SelectedArtifact>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub modifications: Vec<EditPlan>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub recent_history: Vec<HistoryEntry>,
}

impl SlotProjection {
    /// Builds the projection for `stage` from the given slots and history.
    pub fn for_stage(stage: StageKind, slots: &Slots, history: &[HistoryEntry]) -> Self {
        let tail = |n: usize| history[history.len().saturating_sub(n)..].to_vec();

        match stage {
            StageKind::Classify => Self {
                category: slots.category.clone(),
                selected_artifact: slots.selected_artifact.clone(),
                recent_history: tail(4),
                ..Default::default()
            },
            StageKind::Requirements => Self {
                category: slots.category.clone(),
                requirements: slots.requirements.clone(),
                recent_history: tail(6),
                ..Default::default()
            },
            StageKind::Recommend => Self {
                category: slots.category.clone(),
                requirements: slots.requirements.clone(),
                ..Default::default()
            },
            StageKind::Questions => Self {
                requirements: slots.requirements.clone(),
                recommendations: slots.recommendations.clone(),
                ..Default::default()
            },
            StageKind::Select => Self {
                recommendations: slots.recommendations.clone(),
                selected_artifact: slots.selected_artifact.clone(),
                ..Default::default()
            },
            StageKind::Edit => Self {
                requirements: slots.requirements.clone(),
                selected_artifact: slots.selected_artifact.clone(),
                modifications: slots.modifications.clone(),
                ..Default::default()
            },
            StageKind::Report => Self {
                requirements: slots.requirements.clone(),
                selected_artifact: slots.selected_artifact.clone(),
                modifications: slots.modifications.clone(),
                ..Default::default()
            },
            StageKind::Format => Self {
                category: slots.category.clone(),
                selected_artifact: slots.selected_artifact.clone(),
                recent_history: tail(4),
                ..Default::default()
            },
        }
    }
}

/// Everything one stage invocation receives.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StageInput {
    pub stage: StageKind,
    pub phase: Phase,
    pub utterance: String,
    /// Output of the stage that ran just before this one in the pipeline.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub previous: Option<StagePayload>,
    pub projection: SlotProjection,
    /// Structured context supplied by the caller alongside the utterance.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub context: Option<serde_json::Value>,
    /// Set when the utterance answers an earlier clarification request.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub answering: Option<ClarificationRequest>,
}

impl StageInput {
    pub fn new(stage: StageKind, phase: Phase, utterance: impl Into<String>) -> Self {
        Self {
            stage,
            phase,
            utterance: utterance.into(),
            previous: None,
            projection: SlotProjection::default(),
            context: None,
            answering: None,
        }
    }

    pub fn with_previous(mut self, previous: Option<StagePayload>) -> Self {
        self.previous = previous;
        self
    }

    pub fn with_projection(mut self, projection: SlotProjection) -> Self {
        self.projection = projection;
        self
    }

    pub fn with_context(mut self, context: Option<serde_json::Value>) -> Self {
        self.context = context;
        self
    }

    pub fn answering(mut self, request: Option<ClarificationRequest>) -> Self {
        self.answering = request;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn filled_slots() -> Slots {
        Slots {
            requirements: Some(Requirements {
                page_type: Some("login".to_string()),
                ..Default::default()
            }),
            recommendations: vec![Candidate::named("Clean Login")],
            selected_artifact: Some(SelectedArtifact::named("Clean Login")),
            category: Some("login".to_string()),
            modifications: vec![EditPlan::default()],
            ..Default::default()
        }
    }

    #[test]
    fn recommend_sees_requirements_but_not_history_or_selection() {
        let history = vec![HistoryEntry::user("hello", Phase::Initial)];
        let projection = SlotProjection::for_stage(StageKind::Recommend, &filled_slots(), &history);

        assert!(projection.requirements.is_some());
        assert_eq!(projection.category.as_deref(), Some("login"));
        assert!(projection.selected_artifact.is_none());
        assert!(projection.recent_history.is_empty());
    }

    #[test]
    fn select_sees_candidates() {
        let projection = SlotProjection::for_stage(StageKind::Select, &filled_slots(), &[]);
        assert_eq!(projection.recommendations.len(), 1);
        assert!(projection.requirements.is_none());
    }

    #[test]
    fn edit_sees_prior_modifications() {
        let projection = SlotProjection::for_stage(StageKind::Edit, &filled_slots(), &[]);
        assert_eq!(projection.modifications.len(), 1);
        assert!(projection.selected_artifact.is_some());
    }

    #[test]
    fn classify_history_is_capped() {
        let history: Vec<_> = (0..10)
            .map(|i| HistoryEntry::user(format!("line {}", i), Phase::Initial))
            .collect();
        let projection = SlotProjection::for_stage(StageKind::Classify, &Slots::default(), &history);
        assert_eq!(projection.recent_history.len(), 4);
        assert_eq!(projection.recent_history[3].text, "line 9");
    }

    #[test]
    fn empty_projection_serializes_compactly() {
        let json = serde_json::to_string(&SlotProjection::default()).unwrap();
        assert_eq!(json, "{}");
    }
}
