//! Workflow domain: stages, pipelines, intents and phase routing.
//!
//! # Module Organization
//!
//! - `stage` / `payload` / `result` - what a reasoning stage is and returns
//! - `input` - the per-stage projection of session state
//! - `shape` - required-field checks for raw stage records
//! - `pipeline` - ordered stage lists and their results
//! - `intent` / `guardrails` - intent vocabulary and deterministic rules
//! - `phase_machine` - the declarative phase table
//! - `synthesizer` - rendering of pipeline results for the user

mod errors;
mod guardrails;
mod input;
mod intent;
mod payload;
mod phase_machine;
mod pipeline;
mod result;
mod shape;
mod stage;
mod synthesizer;

pub use errors::WorkflowError;
pub use guardrails::{GuardrailError, GuardrailMatch, GuardrailRule, GuardrailSet, GuardrailTable};
pub use input::{SlotProjection, StageInput};
pub use intent::{coerce, phase_default, vocabulary, IntentLabel};
pub use payload::{Ambiguity, IntentPayload, StagePayload};
pub use phase_machine::{
    IntentRoute, OverrideRule, PhaseRoutes, PhaseStateMachine, PhaseTable, Route, RouteSource,
};
pub use pipeline::{
    PipelineResult, PipelineSpec, ShortCircuit, ShortCircuitWhen, StageStep, TerminalPayload,
};
pub use result::{StageError, StageErrorKind, StageResult};
pub use shape::{normalize_stage_output, ShapeError, MAX_FIELD_LENGTH};
pub use stage::StageKind;
pub use synthesizer::{MessageKind, ResponseSynthesizer, UserMessage, GENERIC_FALLBACK, MAX_LISTED};
