//! Mock AI Provider for testing.
//!
//! Provides a configurable mock implementation of the AIProvider port,
//! allowing tests to drive whole conversations without a real
//! completion service.
//!
//! Responses can be queued globally or per stage. Per-stage queues are
//! consulted first, which keeps scripted conversations deterministic when
//! several sessions run concurrently.
//!
//! # Example
//!
//! ```ignore
//! let provider = MockAIProvider::new()
//!     .with_stage_response(StageKind::Classify, r#"{"intent": "create_mockup"}"#)
//!     .with_delay(Duration::from_millis(100));
//! ```

use async_trait::async_trait;
use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;
use tokio::time::sleep;

use crate::domain::workflow::StageKind;
use crate::ports::{
    AIError, AIProvider, CompletionRequest, CompletionResponse, FinishReason, ProviderInfo,
    TokenUsage,
};

/// Text returned once every queue is exhausted.
pub const MOCK_DEFAULT_RESPONSE: &str = "Mock response";

/// Mock AI provider for testing.
#[derive(Debug, Clone)]
pub struct MockAIProvider {
    state: Arc<Mutex<MockState>>,
    info: ProviderInfo,
    delay: Duration,
}

#[derive(Debug, Default)]
struct MockState {
    /// Responses consumed in order by any stage.
    responses: VecDeque<MockResponse>,
    /// Responses reserved for one stage.
    by_stage: HashMap<StageKind, VecDeque<MockResponse>>,
    /// Call history for verification.
    calls: Vec<CompletionRequest>,
}

/// A configured mock response.
#[derive(Debug, Clone)]
pub enum MockResponse {
    /// Return a successful completion.
    Success {
        content: String,
        usage: TokenUsage,
        finish_reason: FinishReason,
    },
    /// Return an error.
    Error(MockError),
}

/// Mock error types for testing error handling.
#[derive(Debug, Clone)]
pub enum MockError {
    RateLimited { retry_after_secs: u32 },
    ContextTooLong { tokens: u32, max: u32 },
    ContentFiltered { reason: String },
    Unavailable { message: String },
    AuthenticationFailed,
    Network { message: String },
    Timeout { timeout_secs: u32 },
}

impl From<MockError> for AIError {
    fn from(err: MockError) -> Self {
        match err {
            MockError::RateLimited { retry_after_secs } => AIError::rate_limited(retry_after_secs),
            MockError::ContextTooLong { tokens, max } => AIError::context_too_long(tokens, max),
            MockError::ContentFiltered { reason } => AIError::content_filtered(reason),
            MockError::Unavailable { message } => AIError::unavailable(message),
            MockError::AuthenticationFailed => AIError::AuthenticationFailed,
            MockError::Network { message } => AIError::network(message),
            MockError::Timeout { timeout_secs } => AIError::Timeout { timeout_secs },
        }
    }
}

impl Default for MockAIProvider {
    fn default() -> Self {
        Self::new()
    }
}

impl MockAIProvider {
    /// Creates a new mock provider with empty queues.
    pub fn new() -> Self {
        Self {
            state: Arc::new(Mutex::new(MockState::default())),
            info: ProviderInfo::new("mock", "mock-model-1", 128_000),
            delay: Duration::ZERO,
        }
    }

    /// Adds a successful response to the shared queue.
    pub fn with_response(self, content: impl Into<String>) -> Self {
        self.lock().responses.push_back(success(content));
        self
    }

    /// Adds an error response to the shared queue.
    pub fn with_error(self, error: MockError) -> Self {
        self.lock().responses.push_back(MockResponse::Error(error));
        self
    }

    /// Adds a successful response that only `stage` will consume.
    pub fn with_stage_response(self, stage: StageKind, content: impl Into<String>) -> Self {
        self.push_stage(stage, success(content));
        self
    }

    /// Adds an error that only `stage` will consume.
    pub fn with_stage_error(self, stage: StageKind, error: MockError) -> Self {
        self.push_stage(stage, MockResponse::Error(error));
        self
    }

    /// Queues a stage response on a provider that is already shared.
    pub fn push_stage_response(&self, stage: StageKind, content: impl Into<String>) {
        self.push_stage(stage, success(content));
    }

    /// Sets simulated latency per request.
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    /// Sets the provider info.
    pub fn with_provider_info(mut self, info: ProviderInfo) -> Self {
        self.info = info;
        self
    }

    /// Returns the number of calls made to this provider.
    pub fn call_count(&self) -> usize {
        self.lock().calls.len()
    }

    /// Returns the number of calls made for one stage.
    pub fn stage_call_count(&self, stage: StageKind) -> usize {
        self.lock()
            .calls
            .iter()
            .filter(|call| call.metadata.stage == stage)
            .count()
    }

    /// Returns all recorded calls.
    pub fn get_calls(&self) -> Vec<CompletionRequest> {
        self.lock().calls.clone()
    }

    /// Returns the stages called, in call order.
    pub fn called_stages(&self) -> Vec<StageKind> {
        self.lock()
            .calls
            .iter()
            .map(|call| call.metadata.stage)
            .collect()
    }

    /// Clears the call history.
    pub fn clear_calls(&self) {
        self.lock().calls.clear();
    }

    fn push_stage(&self, stage: StageKind, response: MockResponse) {
        self.lock()
            .by_stage
            .entry(stage)
            .or_default()
            .push_back(response);
    }

    fn lock(&self) -> MutexGuard<'_, MockState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn next_response(&self, stage: StageKind) -> MockResponse {
        let mut state = self.lock();
        if let Some(response) = state.by_stage.get_mut(&stage).and_then(VecDeque::pop_front) {
            return response;
        }
        state
            .responses
            .pop_front()
            .unwrap_or_else(|| success(MOCK_DEFAULT_RESPONSE))
    }
}

fn success(content: impl Into<String>) -> MockResponse {
    MockResponse::Success {
        content: content.into(),
        usage: TokenUsage::new(10, 20),
        finish_reason: FinishReason::Stop,
    }
}

#[async_trait]
impl AIProvider for MockAIProvider {
    async fn complete(&self, request: CompletionRequest) -> Result<CompletionResponse, AIError> {
        let stage = request.metadata.stage;
        self.lock().calls.push(request);

        if !self.delay.is_zero() {
            sleep(self.delay).await;
        }

        match self.next_response(stage) {
            MockResponse::Success {
                content,
                usage,
                finish_reason,
            } => Ok(CompletionResponse {
                content,
                usage,
                model: self.info.model.clone(),
                finish_reason,
            }),
            MockResponse::Error(err) => Err(err.into()),
        }
    }

    fn provider_info(&self) -> ProviderInfo {
        self.info.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::foundation::{SessionId, TurnId};
    use crate::ports::{MessageRole, RequestMetadata};

    fn request_for(stage: StageKind) -> CompletionRequest {
        CompletionRequest::new(RequestMetadata::new(SessionId::new(), TurnId::new(), stage))
            .with_message(MessageRole::User, "Hello")
    }

    fn test_request() -> CompletionRequest {
        request_for(StageKind::Format)
    }

    #[tokio::test]
    async fn mock_provider_returns_configured_response() {
        let provider = MockAIProvider::new().with_response("Hello from mock!");

        let response = provider.complete(test_request()).await.unwrap();

        assert_eq!(response.content, "Hello from mock!");
        assert_eq!(response.model, "mock-model-1");
        assert_eq!(response.finish_reason, FinishReason::Stop);
    }

    #[tokio::test]
    async fn mock_provider_returns_responses_in_order() {
        let provider = MockAIProvider::new()
            .with_response("First")
            .with_response("Second");

        let r1 = provider.complete(test_request()).await.unwrap();
        let r2 = provider.complete(test_request()).await.unwrap();

        assert_eq!(r1.content, "First");
        assert_eq!(r2.content, "Second");
    }

    #[tokio::test]
    async fn mock_provider_returns_default_after_exhausted() {
        let provider = MockAIProvider::new().with_response("Only one");

        provider.complete(test_request()).await.unwrap();
        let r2 = provider.complete(test_request()).await.unwrap();

        assert_eq!(r2.content, MOCK_DEFAULT_RESPONSE);
    }

    #[tokio::test]
    async fn stage_queues_take_priority_over_shared_queue() {
        let provider = MockAIProvider::new()
            .with_response("shared")
            .with_stage_response(StageKind::Classify, "classify only");

        let format = provider.complete(request_for(StageKind::Format)).await.unwrap();
        let classify = provider
            .complete(request_for(StageKind::Classify))
            .await
            .unwrap();

        assert_eq!(format.content, "shared");
        assert_eq!(classify.content, "classify only");
    }

    #[tokio::test]
    async fn stage_queue_falls_back_to_shared_queue_when_empty() {
        let provider = MockAIProvider::new().with_response("shared");

        let response = provider
            .complete(request_for(StageKind::Report))
            .await
            .unwrap();

        assert_eq!(response.content, "shared");
    }

    #[tokio::test]
    async fn mock_provider_returns_configured_error() {
        let provider = MockAIProvider::new().with_stage_error(
            StageKind::Edit,
            MockError::RateLimited {
                retry_after_secs: 30,
            },
        );

        let err = provider
            .complete(request_for(StageKind::Edit))
            .await
            .unwrap_err();

        assert!(matches!(err, AIError::RateLimited { retry_after_secs: 30 }));
        assert!(err.is_retryable());
    }

    #[tokio::test]
    async fn mock_provider_tracks_calls_per_stage() {
        let provider = MockAIProvider::new();

        provider.complete(request_for(StageKind::Classify)).await.unwrap();
        provider.complete(request_for(StageKind::Recommend)).await.unwrap();
        provider.complete(request_for(StageKind::Classify)).await.unwrap();

        assert_eq!(provider.call_count(), 3);
        assert_eq!(provider.stage_call_count(StageKind::Classify), 2);
        assert_eq!(
            provider.called_stages(),
            vec![StageKind::Classify, StageKind::Recommend, StageKind::Classify]
        );

        provider.clear_calls();
        assert_eq!(provider.call_count(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn mock_provider_applies_delay() {
        let provider = MockAIProvider::new()
            .with_response("slow")
            .with_delay(Duration::from_millis(200));

        let start = tokio::time::Instant::now();
        provider.complete(test_request()).await.unwrap();

        assert!(start.elapsed() >= Duration::from_millis(200));
    }

    #[test]
    fn clones_share_state() {
        let provider = MockAIProvider::new();
        let clone = provider.clone();

        clone.push_stage_response(StageKind::Select, "{}");

        assert_eq!(provider.lock().by_stage[&StageKind::Select].len(), 1);
    }
}
