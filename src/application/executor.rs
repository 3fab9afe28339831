//! PipelineExecutor - runs a pipeline's stages in order.
//!
//! The executor never touches the session. Slot updates produced by the
//! stages are buffered into the result's [`SlotDiff`] and a working copy of
//! the slots is kept so later stages see what earlier ones produced.
//!
//! Outcomes:
//! - every stage succeeds: terminal payload is the designated stage's (or
//!   the last one's) payload, `slot_updates` holds the seed plus all stage
//!   updates
//! - a stage is ambiguous: halts, `clarification` is set and the slot
//!   updates are the seed followed by the pending clarification
//! - a stage fails: halts, terminal payload asks the user to clarify and
//!   `slot_updates` is empty

use std::sync::Arc;

use crate::domain::session::{ClarificationRequest, Phase, Session, SlotDiff, SlotUpdate};
use crate::domain::workflow::{
    PipelineResult, PipelineSpec, SlotProjection, StageInput, StagePayload, TerminalPayload,
};
use crate::ports::{InvocationContext, StageInvoker};

/// What one run of a pipeline works from.
#[derive(Debug, Clone)]
pub struct PipelineInput {
    pub ctx: InvocationContext,
    /// Phase whose pipeline is running.
    pub phase: Phase,
    pub utterance: String,
    pub context: Option<serde_json::Value>,
    /// Set when this run answers a pending clarification.
    pub answering: Option<ClarificationRequest>,
    /// Updates decided before the pipeline started, applied first.
    pub seed: SlotDiff,
}

impl PipelineInput {
    pub fn new(ctx: InvocationContext, phase: Phase, utterance: impl Into<String>) -> Self {
        Self {
            ctx,
            phase,
            utterance: utterance.into(),
            context: None,
            answering: None,
            seed: SlotDiff::new(),
        }
    }

    pub fn with_context(mut self, context: Option<serde_json::Value>) -> Self {
        self.context = context;
        self
    }

    pub fn answering(mut self, request: Option<ClarificationRequest>) -> Self {
        self.answering = request;
        self
    }

    pub fn with_seed(mut self, seed: SlotDiff) -> Self {
        self.seed = seed;
        self
    }
}

/// The slot update a successful stage payload produces, if any.
pub fn slot_update_for(payload: &StagePayload) -> Option<SlotUpdate> {
    match payload {
        StagePayload::Requirements(r) => Some(SlotUpdate::SetRequirements(r.clone())),
        StagePayload::Recommendations(c) => Some(SlotUpdate::SetRecommendations(c.clone())),
        StagePayload::Questions(q) => Some(SlotUpdate::SetClarifyingQuestions(q.clone())),
        StagePayload::Selection(s) => Some(SlotUpdate::SelectArtifact(s.clone())),
        StagePayload::Edit(plan) => Some(SlotUpdate::AppendModification(plan.clone())),
        StagePayload::Report(report) => Some(SlotUpdate::SetReport(report.clone())),
        StagePayload::Intent(_) | StagePayload::Text(_) | StagePayload::Ambiguous(_) => None,
    }
}

/// Runs [`PipelineSpec`]s against a [`StageInvoker`].
pub struct PipelineExecutor {
    invoker: Arc<dyn StageInvoker>,
}

impl PipelineExecutor {
    pub fn new(invoker: Arc<dyn StageInvoker>) -> Self {
        Self { invoker }
    }

    pub async fn run(
        &self,
        spec: &PipelineSpec,
        input: &PipelineInput,
        session: &Session,
    ) -> PipelineResult {
        let mut result = PipelineResult {
            pipeline: spec.name.clone(),
            success: true,
            stage_results: Vec::new(),
            terminal: None,
            clarification: None,
            slot_updates: SlotDiff::new(),
            phase_override: None,
        };

        if spec.stages.is_empty() {
            result.terminal = Some(TerminalPayload::Canned {
                text: spec.canned_text.clone().unwrap_or_default(),
            });
            result.slot_updates = input.seed.clone();
            return result;
        }

        let mut working = session.slots().clone();
        let mut buffered = input.seed.clone();
        for update in buffered.iter() {
            working.apply(update.clone());
        }

        let mut previous: Option<StagePayload> = None;
        let mut short_circuit_payload: Option<StagePayload> = None;

        for step in &spec.stages {
            let stage_input = StageInput::new(step.stage, input.phase, input.utterance.clone())
                .with_previous(previous.clone())
                .with_projection(SlotProjection::for_stage(step.stage, &working, session.history()))
                .with_context(input.context.clone())
                .answering(input.answering.clone());

            let stage_result = self.invoker.invoke(&input.ctx, &stage_input).await;
            let payload = stage_result.payload.clone();
            let stage_ok = stage_result.success;
            result.stage_results.push(stage_result);

            let payload = match (stage_ok, payload) {
                (true, Some(payload)) => payload,
                _ => {
                    tracing::info!(
                        pipeline = %spec.name,
                        stage = %step.stage,
                        "Stage failed; asking the user to clarify"
                    );
                    result.success = false;
                    result.terminal = Some(TerminalPayload::AskToClarify { stage: step.stage });
                    return result;
                }
            };

            if let StagePayload::Ambiguous(ambiguity) = &payload {
                tracing::info!(
                    pipeline = %spec.name,
                    stage = %step.stage,
                    "Stage asked for clarification"
                );
                let request = ClarificationRequest::new(ambiguity.reason.clone(), step.stage)
                    .with_options(ambiguity.options.clone());
                result.slot_updates = input.seed.clone();
                result
                    .slot_updates
                    .push(SlotUpdate::SetPendingClarification(request.clone()));
                result.clarification = Some(request);
                return result;
            }

            if let Some(update) = slot_update_for(&payload) {
                working.apply(update.clone());
                buffered.push(update);
            }

            if let Some(rule) = step.short_circuit.filter(|rule| rule.fires(&payload)) {
                if let Some(candidate) = payload.single_candidate() {
                    let select = SlotUpdate::SelectArtifact(candidate.to_selected());
                    working.apply(select.clone());
                    buffered.push(select);
                }
                tracing::debug!(
                    pipeline = %spec.name,
                    stage = %step.stage,
                    advance_to = %rule.advance_to,
                    "Short-circuit fired"
                );
                result.phase_override = Some(rule.advance_to);
                short_circuit_payload = Some(payload);
                break;
            }

            previous = Some(payload);
        }

        let terminal = short_circuit_payload
            .or_else(|| {
                spec.terminal_stage
                    .and_then(|stage| result.payload_of(stage).cloned())
            })
            .or(previous);

        result.terminal = terminal.map(|payload| TerminalPayload::Stage { payload });
        result.slot_updates = buffered;
        result
    }
}

impl std::fmt::Debug for PipelineExecutor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PipelineExecutor").finish_non_exhaustive()
    }
}
