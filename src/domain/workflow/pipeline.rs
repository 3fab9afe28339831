//! Pipeline declarations and results.

use serde::Serialize;

use super::{StageKind, StagePayload, StageResult};
use crate::domain::session::{ClarificationRequest, Phase, SlotDiff};

/// Condition under which a step ends the pipeline early.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ShortCircuitWhen {
    /// The step returned exactly one recommendation.
    SingleCandidate,
}

/// Early exit attached to a pipeline step.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ShortCircuit {
    pub when: ShortCircuitWhen,
    /// Phase the conversation moves to when the rule fires.
    pub advance_to: Phase,
}

impl ShortCircuit {
    pub fn fires(&self, payload: &StagePayload) -> bool {
        match self.when {
            ShortCircuitWhen::SingleCandidate => payload.single_candidate().is_some(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StageStep {
    pub stage: StageKind,
    pub short_circuit: Option<ShortCircuit>,
}

impl StageStep {
    pub fn new(stage: StageKind) -> Self {
        Self {
            stage,
            short_circuit: None,
        }
    }

    pub fn short_circuit(mut self, when: ShortCircuitWhen, advance_to: Phase) -> Self {
        self.short_circuit = Some(ShortCircuit { when, advance_to });
        self
    }
}

impl From<StageKind> for StageStep {
    fn from(stage: StageKind) -> Self {
        Self::new(stage)
    }
}

/// An ordered list of stages plus the rules for picking the terminal
/// payload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PipelineSpec {
    pub name: String,
    pub stages: Vec<StageStep>,
    /// Stage whose payload becomes the terminal payload. Defaults to the
    /// last stage that ran.
    pub terminal_stage: Option<StageKind>,
    /// Reply used when the pipeline has no stages at all.
    pub canned_text: Option<String>,
}

impl PipelineSpec {
    pub fn new<I, S>(name: impl Into<String>, stages: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<StageStep>,
    {
        Self {
            name: name.into(),
            stages: stages.into_iter().map(Into::into).collect(),
            terminal_stage: None,
            canned_text: None,
        }
    }

    /// A pipeline that runs nothing and answers with fixed text.
    pub fn canned(name: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            stages: Vec::new(),
            terminal_stage: None,
            canned_text: Some(text.into()),
        }
    }

    pub fn with_terminal_stage(mut self, stage: StageKind) -> Self {
        self.terminal_stage = Some(stage);
        self
    }

    pub fn contains(&self, stage: StageKind) -> bool {
        self.stages.iter().any(|step| step.stage == stage)
    }

    pub fn stage_kinds(&self) -> impl Iterator<Item = StageKind> + '_ {
        self.stages.iter().map(|step| step.stage)
    }

    /// Phases any step of this pipeline may short-circuit to.
    pub fn short_circuit_targets(&self) -> impl Iterator<Item = Phase> + '_ {
        self.stages
            .iter()
            .filter_map(|step| step.short_circuit.map(|sc| sc.advance_to))
    }
}

/// What the synthesizer renders at the end of a pipeline.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum TerminalPayload {
    /// A stage's normalized output.
    Stage { payload: StagePayload },
    /// A stage failed; ask the user to rephrase.
    AskToClarify { stage: StageKind },
    /// Fixed text from a stage-less pipeline.
    Canned { text: String },
}

/// The outcome of one pipeline run.
///
/// # Invariants
///
/// - any failed stage result forces `success == false`
/// - `clarification` and `terminal` are never both set
/// - `slot_updates` is empty when `success` is false, and holds only the
///   pending clarification when `clarification` is set
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PipelineResult {
    pub pipeline: String,
    pub success: bool,
    /// Results in execution order.
    pub stage_results: Vec<StageResult>,
    pub terminal: Option<TerminalPayload>,
    pub clarification: Option<ClarificationRequest>,
    pub slot_updates: SlotDiff,
    /// Set when a short-circuit rule fired.
    pub phase_override: Option<Phase>,
}

impl PipelineResult {
    pub fn stage(&self, stage: StageKind) -> Option<&StageResult> {
        self.stage_results.iter().find(|r| r.stage == stage)
    }

    pub fn payload_of(&self, stage: StageKind) -> Option<&StagePayload> {
        self.stage(stage).and_then(|r| r.payload.as_ref())
    }

    pub fn failed_stage(&self) -> Option<StageKind> {
        self.stage_results.iter().find(|r| !r.success).map(|r| r.stage)
    }

    pub fn needs_clarification(&self) -> bool {
        self.clarification.is_some()
    }

    pub fn executed_stages(&self) -> Vec<StageKind> {
        self.stage_results.iter().map(|r| r.stage).collect()
    }
}
