//! Application layer - orchestration over the domain and ports.
//!
//! - `stage_client` / `resilient_invoker` - stage invocation with timeouts and retries
//! - `executor` - runs a pipeline and buffers its slot updates
//! - `intent_classifier` - guardrails first, model second
//! - `session_locks` - one turn at a time per session
//! - `handlers` - the turn, reset and status entry points
//! - `bootstrap` - wiring from configuration

mod bootstrap;
mod executor;
mod intent_classifier;
mod prompts;
mod resilient_invoker;
mod session_locks;
mod stage_client;

pub mod handlers;

pub use bootstrap::{build_orchestrator, BootstrapError};
pub use executor::{slot_update_for, PipelineExecutor, PipelineInput};
pub use handlers::{
    ConversationOrchestrator, ResetSessionResult, SessionStatus, StageOutcome, TurnDiagnostics,
    TurnError, TurnFailure, TurnRequest, TurnResponse,
};
pub use intent_classifier::{Classification, ClassificationSource, IntentClassifier};
pub use prompts::{system_prompt, user_prompt};
pub use resilient_invoker::{ResilientStageInvoker, RetryPolicy};
pub use session_locks::{SessionGuard, SessionLocks};
pub use stage_client::{ReasoningStageClient, StageClientConfig, MAX_CATALOG_ENTRIES};
