//! HandleTurn - the conversation orchestrator.
//!
//! One turn runs under the session's lock:
//!
//! 1. load (or create) the session
//! 2. resume a pending clarification, or classify the utterance and route it
//! 3. run the routed pipeline
//! 4. compute the next phase and render the reply
//! 5. apply history, phase and slot diff to a copy and persist it
//!
//! The store write is the last await of a turn. A turn that is dropped
//! before it leaves nothing behind; a turn whose pipeline fails leaves the
//! stored session exactly as it was.

use serde::{Deserialize, Serialize};
use std::sync::Arc;
use thiserror::Error;
use tracing::Instrument;

use super::reset_session::{ResetSessionCommand, ResetSessionError, ResetSessionHandler, ResetSessionResult};
use super::session_status::{SessionStatus, SessionStatusError, SessionStatusHandler, SessionStatusQuery};
use crate::application::executor::{PipelineExecutor, PipelineInput};
use crate::application::intent_classifier::{Classification, IntentClassifier};
use crate::application::session_locks::SessionLocks;
use crate::domain::foundation::{SessionId, TurnId};
use crate::domain::session::{ClarificationRequest, Phase, Session, SessionChange, SlotDiff, SlotUpdate};
use crate::domain::workflow::{
    GuardrailSet, IntentLabel, MessageKind, PhaseStateMachine, PipelineResult, ResponseSynthesizer,
    Route, RouteSource, StageErrorKind, StageKind, UserMessage, WorkflowError,
};
use crate::ports::{InvocationContext, SessionStore, StageInvoker};

/// Longest accepted utterance, in bytes after trimming.
pub const MAX_UTTERANCE_LENGTH: usize = 10_000;

/// Shown when the turn could not be completed for reasons the user cannot fix.
pub const APOLOGY: &str = "Sorry, something went wrong on my side and I couldn't \
process that message. Please try again in a moment.";

// ════════════════════════════════════════════════════════════════════════════════
// Request / Response
// ════════════════════════════════════════════════════════════════════════════════

/// One user turn.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TurnRequest {
    /// Omitted on the first turn; a new session is created.
    #[serde(default)]
    pub session_id: Option<SessionId>,
    pub utterance: String,
    /// Opaque client context handed to the stages unchanged.
    #[serde(default)]
    pub context: Option<serde_json::Value>,
}

impl TurnRequest {
    pub fn new(utterance: impl Into<String>) -> Self {
        Self {
            session_id: None,
            utterance: utterance.into(),
            context: None,
        }
    }

    pub fn for_session(session_id: SessionId, utterance: impl Into<String>) -> Self {
        Self {
            session_id: Some(session_id),
            ..Self::new(utterance)
        }
    }

    pub fn with_context(mut self, context: serde_json::Value) -> Self {
        self.context = Some(context);
        self
    }
}

/// Why a turn did not complete normally.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum TurnFailure {
    /// A stage failed after retries; the user is asked to rephrase.
    Stage { stage: StageKind, kind: StageErrorKind },
    /// The phase table would have been violated.
    Workflow,
    /// The session could not be loaded or saved.
    Store,
}

/// Per-stage summary for diagnostics.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StageOutcome {
    pub stage: StageKind,
    pub success: bool,
    pub attempts: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<StageErrorKind>,
}

/// How a turn was handled, for logs and clients that want to show it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TurnDiagnostics {
    pub turn_id: TurnId,
    pub phase_before: Phase,
    pub intent: Option<IntentLabel>,
    pub intent_source: Option<String>,
    pub route: Option<String>,
    pub pipeline: Option<String>,
    pub stages: Vec<StageOutcome>,
    pub clarification_requested: bool,
    pub resumed_clarification: bool,
    pub committed: bool,
    pub failure: Option<TurnFailure>,
}

impl TurnDiagnostics {
    fn new(turn_id: TurnId, phase_before: Phase) -> Self {
        Self {
            turn_id,
            phase_before,
            intent: None,
            intent_source: None,
            route: None,
            pipeline: None,
            stages: Vec::new(),
            clarification_requested: false,
            resumed_clarification: false,
            committed: false,
            failure: None,
        }
    }

    fn record_classification(&mut self, classification: &Classification) {
        self.intent = Some(classification.label);
        self.intent_source = Some(classification.source.as_str().to_string());
    }

    fn record_route(&mut self, route: &Route) {
        self.route = Some(describe_source(&route.source));
        self.pipeline = Some(route.pipeline.name.clone());
    }

    fn record_pipeline(&mut self, result: &PipelineResult) {
        self.stages = result
            .stage_results
            .iter()
            .map(|r| StageOutcome {
                stage: r.stage,
                success: r.success,
                attempts: r.attempts,
                error: r.error_kind(),
            })
            .collect();
        self.clarification_requested = result.needs_clarification();
        self.failure = result
            .stage_results
            .iter()
            .find(|r| !r.success)
            .and_then(|r| r.error_kind().map(|kind| TurnFailure::Stage { stage: r.stage, kind }));
    }
}

/// The reply to one turn.
#[derive(Debug, Clone, Serialize)]
pub struct TurnResponse {
    /// True when the pipeline succeeded (or asked for clarification) and
    /// the session was saved.
    pub success: bool,
    pub session_id: SessionId,
    pub message: UserMessage,
    /// The session's phase after this turn.
    pub phase: Phase,
    pub diagnostics: TurnDiagnostics,
}

/// Requests rejected before any work is done.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum TurnError {
    #[error("Utterance cannot be empty")]
    EmptyUtterance,

    #[error("Utterance is {actual} bytes; the limit is {max}")]
    UtteranceTooLong { max: usize, actual: usize },
}

// ════════════════════════════════════════════════════════════════════════════════
// Orchestrator
// ════════════════════════════════════════════════════════════════════════════════

/// Runs conversation turns against a session store.
pub struct ConversationOrchestrator {
    classifier: IntentClassifier,
    executor: PipelineExecutor,
    machine: PhaseStateMachine,
    synthesizer: ResponseSynthesizer,
    store: Arc<dyn SessionStore>,
    locks: SessionLocks,
    reset: ResetSessionHandler,
    status: SessionStatusHandler,
}

impl ConversationOrchestrator {
    /// Uses the built-in guardrails and the standard phase table. The same
    /// invoker serves the classifier and the pipelines.
    pub fn new(invoker: Arc<dyn StageInvoker>, store: Arc<dyn SessionStore>) -> Self {
        let locks = SessionLocks::new();
        Self {
            classifier: IntentClassifier::new(GuardrailSet::builtin(), invoker.clone()),
            executor: PipelineExecutor::new(invoker),
            machine: PhaseStateMachine::standard(),
            synthesizer: ResponseSynthesizer::new(),
            reset: ResetSessionHandler::new(store.clone(), locks.clone()),
            status: SessionStatusHandler::new(store.clone()),
            store,
            locks,
        }
    }

    pub fn with_classifier(mut self, classifier: IntentClassifier) -> Self {
        self.classifier = classifier;
        self
    }

    pub fn with_machine(mut self, machine: PhaseStateMachine) -> Self {
        self.machine = machine;
        self
    }

    pub fn locks(&self) -> &SessionLocks {
        &self.locks
    }

    /// Runs one turn.
    ///
    /// Only malformed requests are errors. Everything that goes wrong
    /// after validation is reported as an unsuccessful [`TurnResponse`].
    pub async fn handle_turn(&self, request: TurnRequest) -> Result<TurnResponse, TurnError> {
        let utterance = request.utterance.trim();
        if utterance.is_empty() {
            return Err(TurnError::EmptyUtterance);
        }
        if utterance.len() > MAX_UTTERANCE_LENGTH {
            return Err(TurnError::UtteranceTooLong {
                max: MAX_UTTERANCE_LENGTH,
                actual: utterance.len(),
            });
        }

        let session_id = request.session_id.unwrap_or_default();
        let turn_id = TurnId::new();
        let span = tracing::info_span!(
            "turn",
            session_id = %session_id,
            turn_id = %turn_id,
            phase = tracing::field::Empty,
        );

        let utterance = utterance.to_string();
        async move {
            let _guard = self.locks.acquire(session_id).await;
            Ok(self
                .run_turn(session_id, turn_id, utterance, request.context)
                .await)
        }
        .instrument(span)
        .await
    }

    /// Deletes a session so the next turn starts from scratch.
    pub async fn reset_session(&self, session_id: SessionId) -> Result<ResetSessionResult, ResetSessionError> {
        self.reset.handle(ResetSessionCommand::new(session_id)).await
    }

    /// Summarizes a stored session, or `None` if it does not exist.
    pub async fn session_status(&self, session_id: SessionId) -> Result<Option<SessionStatus>, SessionStatusError> {
        self.status.handle(SessionStatusQuery::new(session_id)).await
    }

    async fn run_turn(
        &self,
        session_id: SessionId,
        turn_id: TurnId,
        utterance: String,
        context: Option<serde_json::Value>,
    ) -> TurnResponse {
        let session = match self.store.get(session_id).await {
            Ok(Some(session)) => session,
            Ok(None) => {
                tracing::info!("Starting new session");
                Session::new(session_id)
            }
            Err(e) => {
                tracing::error!(error = %e, "Failed to load session");
                let mut diagnostics = TurnDiagnostics::new(turn_id, Phase::Initial);
                diagnostics.failure = Some(TurnFailure::Store);
                return apology(session_id, Phase::Initial, diagnostics);
            }
        };

        let phase = session.phase();
        tracing::Span::current().record("phase", tracing::field::display(phase));
        let ctx = InvocationContext::new(session_id, turn_id);
        let mut diagnostics = TurnDiagnostics::new(turn_id, phase);

        let (route, seed, answering) = match self
            .choose_route(&ctx, &utterance, &session, context.as_ref(), &mut diagnostics)
            .await
        {
            Ok(chosen) => chosen,
            Err(e) => {
                tracing::error!(error = %e, "No route for turn");
                diagnostics.failure = Some(TurnFailure::Workflow);
                return apology(session_id, phase, diagnostics);
            }
        };
        diagnostics.record_route(&route);

        let input = PipelineInput::new(ctx, route.working_phase, utterance.as_str())
            .with_context(context)
            .answering(answering)
            .with_seed(seed);
        let result = self.executor.run(&route.pipeline, &input, &session).await;
        diagnostics.record_pipeline(&result);

        let next_phase = match self.machine.next_phase(&route, &result) {
            Ok(next) => next,
            Err(e) => {
                tracing::error!(error = %e, pipeline = %route.pipeline.name, "Rejected phase transition");
                diagnostics.failure = Some(TurnFailure::Workflow);
                return apology(session_id, phase, diagnostics);
            }
        };

        let message = self.synthesizer.synthesize(&result, &session);

        if !result.success {
            tracing::warn!(
                failed_stage = ?result.failed_stage(),
                "Pipeline failed; session left unchanged"
            );
            return TurnResponse {
                success: false,
                session_id,
                message,
                phase,
                diagnostics,
            };
        }

        let mut updated = session;
        updated.apply(SessionChange {
            user_text: utterance,
            assistant_text: message.text.clone(),
            next_phase,
            diff: result.slot_updates,
        });

        match self.store.put(session_id, &updated).await {
            Ok(()) => {
                diagnostics.committed = true;
                if next_phase != phase {
                    tracing::info!(from = %phase, to = %next_phase, "Phase transition");
                }
                tracing::info!(
                    pipeline = %result.pipeline,
                    clarification = diagnostics.clarification_requested,
                    "Turn committed"
                );
                TurnResponse {
                    success: true,
                    session_id,
                    message,
                    phase: next_phase,
                    diagnostics,
                }
            }
            Err(e) => {
                tracing::error!(error = %e, "Failed to save session");
                diagnostics.failure = Some(TurnFailure::Store);
                apology(session_id, phase, diagnostics)
            }
        }
    }

    /// Picks the route for this turn and the slot updates that go before
    /// the pipeline's own.
    async fn choose_route(
        &self,
        ctx: &InvocationContext,
        utterance: &str,
        session: &Session,
        context: Option<&serde_json::Value>,
        diagnostics: &mut TurnDiagnostics,
    ) -> Result<(Route, SlotDiff, Option<ClarificationRequest>), WorkflowError> {
        let phase = session.phase();
        let mut seed = SlotDiff::new();

        if let Some(pending) = &session.slots().pending_clarification {
            seed.push(SlotUpdate::ClearPendingClarification);
            if let Some(route) = self.machine.resume(phase, pending.originating_stage) {
                tracing::info!(stage = %pending.originating_stage, "Resuming after clarification");
                diagnostics.resumed_clarification = true;
                return Ok((route, seed, Some(pending.clone())));
            }
            tracing::warn!(
                stage = %pending.originating_stage,
                "No route can resume the pending clarification; dropping it"
            );
        }

        let classification = self.classifier.classify(ctx, utterance, session, context).await;
        diagnostics.record_classification(&classification);
        tracing::debug!(
            intent = %classification.label,
            source = classification.source.as_str(),
            "Classified utterance"
        );

        if let Some(category) = classification.category {
            seed.push(SlotUpdate::SetCategory(category));
        }

        let route = match self.machine.check_override(
            phase,
            classification.label,
            session.slots().has_selected_artifact(),
        ) {
            Some(route) => route,
            None => self.machine.route(phase, classification.label)?,
        };
        Ok((route, seed, None))
    }
}

fn apology(session_id: SessionId, phase: Phase, diagnostics: TurnDiagnostics) -> TurnResponse {
    TurnResponse {
        success: false,
        session_id,
        message: UserMessage::new(MessageKind::Fallback, APOLOGY),
        phase,
        diagnostics,
    }
}

fn describe_source(source: &RouteSource) -> String {
    match source {
        RouteSource::Override(rule) => format!("override:{}", rule),
        RouteSource::Intent(label) => format!("intent:{}", label),
        RouteSource::Fallback(label) => format!("fallback:{}", label),
        RouteSource::Resume(stage) => format!("resume:{}", stage),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::ai::{MockAIProvider, MockError};
    use crate::adapters::storage::InMemorySessionStore;
    use crate::application::ReasoningStageClient;
    use crate::domain::mockup::SelectedArtifact;
    use crate::domain::session::Slots;
    use async_trait::async_trait;
    use crate::ports::SessionStoreError;

    fn orchestrator(provider: &MockAIProvider, store: &InMemorySessionStore) -> ConversationOrchestrator {
        ConversationOrchestrator::new(
            Arc::new(ReasoningStageClient::new(Arc::new(provider.clone()))),
            Arc::new(store.clone()),
        )
    }

    async fn seed(store: &InMemorySessionStore, session: Session) -> SessionId {
        let id = session.id();
        store.put(id, &session).await.unwrap();
        id
    }

    /// A store whose writes always fail.
    struct ReadOnlyStore;

    #[async_trait]
    impl SessionStore for ReadOnlyStore {
        async fn get(&self, _id: SessionId) -> Result<Option<Session>, SessionStoreError> {
            Ok(None)
        }

        async fn put(&self, _id: SessionId, _session: &Session) -> Result<(), SessionStoreError> {
            Err(SessionStoreError::Backend("read only".to_string()))
        }

        async fn delete(&self, _id: SessionId) -> Result<bool, SessionStoreError> {
            Ok(false)
        }
    }

    mod validation {
        use super::*;

        #[tokio::test]
        async fn blank_utterance_is_rejected() {
            let provider = MockAIProvider::new();
            let store = InMemorySessionStore::new();

            let result = orchestrator(&provider, &store)
                .handle_turn(TurnRequest::new("   \n"))
                .await;

            assert_eq!(result.unwrap_err(), TurnError::EmptyUtterance);
            assert!(store.is_empty().await);
        }

        #[tokio::test]
        async fn oversized_utterance_is_rejected() {
            let provider = MockAIProvider::new();
            let store = InMemorySessionStore::new();

            let result = orchestrator(&provider, &store)
                .handle_turn(TurnRequest::new("a".repeat(MAX_UTTERANCE_LENGTH + 1)))
                .await;

            assert!(matches!(result, Err(TurnError::UtteranceTooLong { .. })));
            assert_eq!(provider.call_count(), 0);
        }
    }

    mod commits {
        use super::*;

        #[tokio::test]
        async fn first_turn_creates_and_saves_session() {
            let provider = MockAIProvider::new();
            let store = InMemorySessionStore::new();

            let response = orchestrator(&provider, &store)
                .handle_turn(TurnRequest::new("hello there"))
                .await
                .unwrap();

            assert!(response.success);
            assert!(response.diagnostics.committed);
            let saved = store.get(response.session_id).await.unwrap().unwrap();
            assert_eq!(saved.history().len(), 2);
            assert_eq!(saved.turn_count(), 1);
        }

        #[tokio::test]
        async fn welcome_turn_needs_only_the_classifier() {
            let provider = MockAIProvider::new()
                .with_stage_response(StageKind::Classify, r#"{"intent": "general"}"#);
            let store = InMemorySessionStore::new();

            let response = orchestrator(&provider, &store)
                .handle_turn(TurnRequest::new("hi"))
                .await
                .unwrap();

            assert_eq!(response.phase, Phase::Initial);
            assert_eq!(response.diagnostics.pipeline.as_deref(), Some("welcome"));
            assert_eq!(provider.called_stages(), vec![StageKind::Classify]);
        }

        #[tokio::test]
        async fn classifier_category_is_stored() {
            let provider = MockAIProvider::new()
                .with_stage_response(
                    StageKind::Classify,
                    r#"{"intent": "general", "page_type": "pricing"}"#,
                );
            let store = InMemorySessionStore::new();

            let response = orchestrator(&provider, &store)
                .handle_turn(TurnRequest::new("hi"))
                .await
                .unwrap();

            let saved = store.get(response.session_id).await.unwrap().unwrap();
            assert_eq!(saved.slots().category.as_deref(), Some("pricing"));
        }
    }

    mod failures {
        use super::*;

        #[tokio::test]
        async fn stage_failure_leaves_session_untouched() {
            let provider = MockAIProvider::new()
                .with_stage_error(StageKind::Format, MockError::AuthenticationFailed);
            let store = InMemorySessionStore::new();
            let session = Session::new(SessionId::new()).with_phase(Phase::Selection);
            let id = seed(&store, session.clone()).await;

            let response = orchestrator(&provider, &store)
                .handle_turn(TurnRequest::for_session(id, "what's the weather"))
                .await
                .unwrap();

            assert!(!response.success);
            assert_eq!(response.message.kind, MessageKind::AskToRephrase);
            assert_eq!(response.phase, Phase::Selection);
            assert!(matches!(
                response.diagnostics.failure,
                Some(TurnFailure::Stage { stage: StageKind::Format, .. })
            ));
            assert_eq!(store.get(id).await.unwrap().unwrap(), session);
        }

        #[tokio::test]
        async fn failed_save_is_reported_with_apology() {
            let provider = MockAIProvider::new();
            let orchestrator = ConversationOrchestrator::new(
                Arc::new(ReasoningStageClient::new(Arc::new(provider.clone()))),
                Arc::new(ReadOnlyStore),
            );

            let response = orchestrator.handle_turn(TurnRequest::new("hi")).await.unwrap();

            assert!(!response.success);
            assert_eq!(response.message.text, APOLOGY);
            assert_eq!(response.diagnostics.failure, Some(TurnFailure::Store));
            assert!(!response.diagnostics.committed);
        }
    }

    mod routing {
        use super::*;

        #[tokio::test]
        async fn modification_with_artifact_overrides_into_editing() {
            let provider = MockAIProvider::new().with_stage_response(
                StageKind::Edit,
                r#"{"changes": [{"target": "header", "action": "recolor", "value": "blue"}]}"#,
            );
            let store = InMemorySessionStore::new();
            let slots = Slots {
                selected_artifact: Some(SelectedArtifact::named("Clean Login")),
                ..Default::default()
            };
            let id = seed(
                &store,
                Session::new(SessionId::new())
                    .with_phase(Phase::Recommendation)
                    .with_slots(slots),
            )
            .await;

            let response = orchestrator(&provider, &store)
                .handle_turn(TurnRequest::for_session(id, "change the header color to blue"))
                .await
                .unwrap();

            assert_eq!(response.phase, Phase::Editing);
            assert_eq!(
                response.diagnostics.route.as_deref(),
                Some("override:edit_selected_template")
            );
            let saved = store.get(id).await.unwrap().unwrap();
            assert_eq!(saved.slots().modifications.len(), 1);
        }
    }
}
