//! IntentClassifier - guardrail rules first, model second.
//!
//! The guardrail pass is deterministic and cheap; when it matches, the
//! model is not consulted. Otherwise the `classify` stage is invoked. Any
//! label outside the phase vocabulary becomes the phase default, and a
//! failed or unparseable model answer does too.

use std::sync::Arc;

use crate::domain::session::Session;
use crate::domain::workflow::{
    coerce, phase_default, GuardrailSet, IntentLabel, SlotProjection, StageInput, StageKind,
    StagePayload,
};
use crate::ports::{InvocationContext, StageInvoker};

/// Where a label came from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ClassificationSource {
    /// A guardrail rule matched; holds the rule name.
    Guardrail(String),
    /// The classify stage answered.
    Model,
    /// Nothing usable; the phase default was used.
    Default,
}

impl ClassificationSource {
    pub fn as_str(&self) -> &str {
        match self {
            Self::Guardrail(rule) => rule,
            Self::Model => "model",
            Self::Default => "default",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Classification {
    pub label: IntentLabel,
    pub source: ClassificationSource,
    /// Page type the model noticed, such as "login".
    pub category: Option<String>,
}

impl Classification {
    fn fallback(session: &Session) -> Self {
        Self {
            label: phase_default(session.phase()),
            source: ClassificationSource::Default,
            category: None,
        }
    }
}

pub struct IntentClassifier {
    guardrails: GuardrailSet,
    invoker: Arc<dyn StageInvoker>,
    model_fallback: bool,
}

impl IntentClassifier {
    pub fn new(guardrails: GuardrailSet, invoker: Arc<dyn StageInvoker>) -> Self {
        Self {
            guardrails,
            invoker,
            model_fallback: true,
        }
    }

    /// Disables the model pass; unmatched utterances get the phase default.
    pub fn with_model_fallback(mut self, enabled: bool) -> Self {
        self.model_fallback = enabled;
        self
    }

    pub fn guardrails(&self) -> &GuardrailSet {
        &self.guardrails
    }

    pub async fn classify(
        &self,
        ctx: &InvocationContext,
        utterance: &str,
        session: &Session,
        context: Option<&serde_json::Value>,
    ) -> Classification {
        let phase = session.phase();
        let has_artifact = session.slots().has_selected_artifact();

        if let Some(hit) = self.guardrails.evaluate(utterance, phase, has_artifact) {
            tracing::info!(rule = %hit.rule, label = %hit.label, "Guardrail matched");
            return Classification {
                label: coerce(phase, hit.label),
                source: ClassificationSource::Guardrail(hit.rule),
                category: None,
            };
        }

        if !self.model_fallback {
            return Classification::fallback(session);
        }

        let input = StageInput::new(StageKind::Classify, phase, utterance)
            .with_projection(SlotProjection::for_stage(
                StageKind::Classify,
                session.slots(),
                session.history(),
            ))
            .with_context(context.cloned());

        let result = self.invoker.invoke(ctx, &input).await;
        let intent = match result.payload {
            Some(StagePayload::Intent(intent)) if result.success => intent,
            _ => {
                tracing::debug!(
                    error = ?result.error_kind(),
                    "Intent stage gave no usable label; using phase default"
                );
                return Classification::fallback(session);
            }
        };

        let label = match IntentLabel::parse(&intent.label) {
            Some(label) => coerce(phase, label),
            None => {
                tracing::debug!(raw = %intent.label, "Unknown intent label");
                phase_default(phase)
            }
        };

        Classification {
            label,
            source: ClassificationSource::Model,
            category: intent.page_type,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::ai::{MockAIProvider, MockError};
    use crate::application::ReasoningStageClient;
    use crate::domain::foundation::{SessionId, TurnId};
    use crate::domain::mockup::SelectedArtifact;
    use crate::domain::session::{Phase, Slots};

    fn ctx() -> InvocationContext {
        InvocationContext::new(SessionId::new(), TurnId::new())
    }

    fn classifier(provider: &MockAIProvider) -> IntentClassifier {
        IntentClassifier::new(
            GuardrailSet::builtin(),
            Arc::new(ReasoningStageClient::new(Arc::new(provider.clone()))),
        )
    }

    fn session_in(phase: Phase) -> Session {
        Session::new(SessionId::new()).with_phase(phase)
    }

    fn session_with_artifact(phase: Phase) -> Session {
        let slots = Slots {
            selected_artifact: Some(SelectedArtifact::named("Clean Login")),
            ..Default::default()
        };
        session_in(phase).with_slots(slots)
    }

    mod guardrails {
        use super::*;

        #[tokio::test]
        async fn create_request_in_initial_skips_model() {
            let provider = MockAIProvider::new();

            let result = classifier(&provider)
                .classify(&ctx(), "I want to build a login mockup", &session_in(Phase::Initial), None)
                .await;

            assert_eq!(result.label, IntentLabel::CreateMockup);
            assert_eq!(
                result.source,
                ClassificationSource::Guardrail("create_mockup".to_string())
            );
            assert_eq!(provider.call_count(), 0);
        }

        #[tokio::test]
        async fn modification_with_artifact_is_edit_override_in_any_phase() {
            let provider = MockAIProvider::new();

            let result = classifier(&provider)
                .classify(
                    &ctx(),
                    "change the button color to blue",
                    &session_with_artifact(Phase::Recommendation),
                    None,
                )
                .await;

            assert_eq!(result.label, IntentLabel::EditOverride);
        }

        #[tokio::test]
        async fn completion_phrase_is_never_a_modification() {
            let provider = MockAIProvider::new();

            let result = classifier(&provider)
                .classify(
                    &ctx(),
                    "looks great, please update and generate the report",
                    &session_with_artifact(Phase::Editing),
                    None,
                )
                .await;

            assert_eq!(result.label, IntentLabel::Report);
        }
    }

    mod model {
        use super::*;

        #[tokio::test]
        async fn unmatched_utterance_asks_model_and_keeps_page_type() {
            let provider = MockAIProvider::new().with_stage_response(
                StageKind::Classify,
                r#"{"intent": "request_recommendations", "page_type": "dashboard"}"#,
            );

            let result = classifier(&provider)
                .classify(&ctx(), "show me some options", &session_in(Phase::Initial), None)
                .await;

            assert_eq!(result.label, IntentLabel::RequestRecommendations);
            assert_eq!(result.source, ClassificationSource::Model);
            assert_eq!(result.category.as_deref(), Some("dashboard"));
        }

        #[tokio::test]
        async fn label_outside_phase_vocabulary_is_coerced() {
            let provider = MockAIProvider::new()
                .with_stage_response(StageKind::Classify, r#"{"intent": "create_mockup"}"#);

            let result = classifier(&provider)
                .classify(&ctx(), "hmm", &session_in(Phase::Editing), None)
                .await;

            assert_eq!(result.label, IntentLabel::General);
        }

        #[tokio::test]
        async fn unknown_label_becomes_phase_default() {
            let provider = MockAIProvider::new()
                .with_stage_response(StageKind::Classify, r#"{"intent": "dance"}"#);

            let result = classifier(&provider)
                .classify(&ctx(), "hmm", &session_in(Phase::Selection), None)
                .await;

            assert_eq!(result.label, IntentLabel::General);
            assert_eq!(result.source, ClassificationSource::Model);
        }

        #[tokio::test]
        async fn model_failure_is_phase_default_not_error() {
            let provider = MockAIProvider::new()
                .with_stage_error(StageKind::Classify, MockError::AuthenticationFailed);

            let result = classifier(&provider)
                .classify(&ctx(), "hmm", &session_in(Phase::Selection), None)
                .await;

            assert_eq!(result.label, IntentLabel::General);
            assert_eq!(result.source, ClassificationSource::Default);
        }

        #[tokio::test]
        async fn disabled_fallback_never_calls_model() {
            let provider = MockAIProvider::new();

            let result = classifier(&provider)
                .with_model_fallback(false)
                .classify(&ctx(), "hmm", &session_in(Phase::Recommendation), None)
                .await;

            assert_eq!(result.source, ClassificationSource::Default);
            assert_eq!(provider.call_count(), 0);
        }
    }
}
