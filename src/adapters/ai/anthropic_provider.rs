//! Anthropic Provider - Implementation of AIProvider for Anthropic's Messages API.
//!
//! One call to [`AIProvider::complete`] is exactly one HTTP request. Retries
//! and backoff belong to the pipeline executor, which knows whether a stage
//! may be repeated.
//!
//! # Configuration
//!
//! ```ignore
//! let config = AnthropicConfig::new(api_key)
//!     .with_model("claude-sonnet-4-20250514")
//!     .with_base_url("https://api.anthropic.com");
//!
//! let provider = AnthropicProvider::new(config)?;
//! ```

use async_trait::async_trait;
use reqwest::{Client, Response, StatusCode};
use secrecy::{ExposeSecret, Secret};
use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::ports::{
    AIError, AIProvider, CompletionRequest, CompletionResponse, FinishReason, MessageRole,
    ProviderInfo, TokenUsage,
};

/// Anthropic API version header value.
const ANTHROPIC_API_VERSION: &str = "2023-06-01";

/// Used when the caller sets no token limit.
const DEFAULT_MAX_TOKENS: u32 = 4096;

/// Retry-after reported when the error body carries no hint.
const DEFAULT_RETRY_AFTER_SECS: u32 = 60;

/// Configuration for the Anthropic provider.
#[derive(Debug, Clone)]
pub struct AnthropicConfig {
    api_key: Secret<String>,
    /// Model to use (e.g., "claude-sonnet-4-20250514").
    pub model: String,
    /// Base URL for the API (default: https://api.anthropic.com).
    pub base_url: String,
    /// Transport timeout for a single request.
    pub timeout: Duration,
}

impl AnthropicConfig {
    /// Creates a new configuration with the given API key.
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: Secret::new(api_key.into()),
            model: "claude-sonnet-4-20250514".to_string(),
            base_url: "https://api.anthropic.com".to_string(),
            timeout: Duration::from_secs(60),
        }
    }

    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into();
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    fn api_key(&self) -> &str {
        self.api_key.expose_secret()
    }
}

/// Anthropic API provider implementation.
pub struct AnthropicProvider {
    config: AnthropicConfig,
    client: Client,
}

impl std::fmt::Debug for AnthropicProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AnthropicProvider")
            .field("model", &self.config.model)
            .field("base_url", &self.config.base_url)
            .finish()
    }
}

impl AnthropicProvider {
    /// Creates a new Anthropic provider with the given configuration.
    pub fn new(config: AnthropicConfig) -> Result<Self, AIError> {
        let client = Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| AIError::InvalidRequest(format!("failed to build HTTP client: {}", e)))?;

        Ok(Self { config, client })
    }

    fn messages_url(&self) -> String {
        format!("{}/v1/messages", self.config.base_url.trim_end_matches('/'))
    }

    fn to_anthropic_request(&self, request: &CompletionRequest) -> AnthropicRequest {
        let mut messages: Vec<AnthropicMessage> = request
            .messages
            .iter()
            .map(|msg| AnthropicMessage {
                role: match msg.role {
                    MessageRole::User => "user",
                    MessageRole::Assistant => "assistant",
                }
                .to_string(),
                content: msg.content.clone(),
            })
            .collect();

        // The API rejects an empty message list.
        if messages.is_empty() {
            messages.push(AnthropicMessage {
                role: "user".to_string(),
                content: "Hello".to_string(),
            });
        }

        AnthropicRequest {
            model: self.config.model.clone(),
            messages,
            system: request.system_prompt.clone(),
            max_tokens: request.max_tokens.unwrap_or(DEFAULT_MAX_TOKENS),
            temperature: request.temperature,
        }
    }

    async fn send_request(&self, request: &CompletionRequest) -> Result<Response, AIError> {
        let body = self.to_anthropic_request(request);

        self.client
            .post(self.messages_url())
            .header("x-api-key", self.config.api_key())
            .header("anthropic-version", ANTHROPIC_API_VERSION)
            .header("Content-Type", "application/json")
            .json(&body)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    AIError::Timeout {
                        timeout_secs: self.config.timeout.as_secs() as u32,
                    }
                } else if e.is_connect() {
                    AIError::network(format!("Connection failed: {}", e))
                } else {
                    AIError::network(e.to_string())
                }
            })
    }

    async fn parse_response(&self, response: Response) -> Result<CompletionResponse, AIError> {
        let status = response.status();
        if !status.is_success() {
            let error_body = response.text().await.unwrap_or_default();
            return Err(status_error(status, &error_body));
        }

        let anthropic_response: AnthropicResponse = response
            .json()
            .await
            .map_err(|e| AIError::parse(format!("Failed to parse response: {}", e)))?;

        Ok(anthropic_response.into_completion())
    }
}

/// Maps a non-success status and its body to an [`AIError`].
fn status_error(status: StatusCode, error_body: &str) -> AIError {
    match status.as_u16() {
        401 | 403 => AIError::AuthenticationFailed,
        429 => AIError::rate_limited(parse_retry_after(error_body)),
        400 => {
            if error_body.contains("prompt is too long") {
                AIError::context_too_long(0, 0)
            } else {
                AIError::InvalidRequest(error_body.to_string())
            }
        }
        // 529 is Anthropic's "overloaded".
        500..=599 => AIError::unavailable(format!("Server error {}: {}", status, error_body)),
        // Unknown model, bad path and other statuses a retry cannot fix.
        _ => AIError::InvalidRequest(format!("Unexpected status {}: {}", status, error_body)),
    }
}

/// Reads "try again in Ns" out of an error message.
fn parse_retry_after(error_body: &str) -> u32 {
    serde_json::from_str::<serde_json::Value>(error_body)
        .ok()
        .and_then(|parsed| {
            let message = parsed.get("error")?.get("message")?.as_str()?.to_string();
            let rest = &message[message.find("try again in ")? + "try again in ".len()..];
            let digits: String = rest.chars().take_while(char::is_ascii_digit).collect();
            digits.parse::<u32>().ok()
        })
        .unwrap_or(DEFAULT_RETRY_AFTER_SECS)
}

#[async_trait]
impl AIProvider for AnthropicProvider {
    async fn complete(&self, request: CompletionRequest) -> Result<CompletionResponse, AIError> {
        tracing::debug!(
            session_id = %request.metadata.session_id,
            turn_id = %request.metadata.turn_id,
            stage = %request.metadata.stage,
            model = %self.config.model,
            "Sending completion request"
        );

        let response = self.send_request(&request).await?;
        let completion = self.parse_response(response).await?;

        tracing::debug!(
            stage = %request.metadata.stage,
            prompt_tokens = completion.usage.prompt_tokens,
            completion_tokens = completion.usage.completion_tokens,
            "Completion received"
        );
        Ok(completion)
    }

    fn provider_info(&self) -> ProviderInfo {
        ProviderInfo::new("anthropic", &self.config.model, 200_000)
    }
}

// ----- Anthropic API Types -----

#[derive(Debug, Serialize)]
struct AnthropicRequest {
    model: String,
    messages: Vec<AnthropicMessage>,
    #[serde(skip_serializing_if = "Option::is_none")]
    system: Option<String>,
    max_tokens: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
}

#[derive(Debug, Serialize, Deserialize)]
struct AnthropicMessage {
    role: String,
    content: String,
}

#[derive(Debug, Deserialize)]
struct AnthropicResponse {
    model: String,
    content: Vec<ContentBlock>,
    stop_reason: Option<String>,
    usage: AnthropicUsage,
}

impl AnthropicResponse {
    fn into_completion(self) -> CompletionResponse {
        let content = self
            .content
            .into_iter()
            .filter(|block| block.block_type == "text")
            .filter_map(|block| block.text)
            .collect::<Vec<_>>()
            .join("");

        let finish_reason = match self.stop_reason.as_deref() {
            Some("max_tokens") => FinishReason::Length,
            Some("refusal") => FinishReason::ContentFilter,
            _ => FinishReason::Stop,
        };

        CompletionResponse {
            content,
            usage: TokenUsage::new(self.usage.input_tokens, self.usage.output_tokens),
            model: self.model,
            finish_reason,
        }
    }
}

#[derive(Debug, Deserialize)]
struct ContentBlock {
    #[serde(rename = "type")]
    block_type: String,
    text: Option<String>,
}

#[derive(Debug, Deserialize)]
struct AnthropicUsage {
    input_tokens: u32,
    output_tokens: u32,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::foundation::{SessionId, TurnId};
    use crate::domain::workflow::StageKind;
    use crate::ports::RequestMetadata;

    fn provider() -> AnthropicProvider {
        AnthropicProvider::new(
            AnthropicConfig::new("test-key").with_base_url("https://custom.api.com/"),
        )
        .unwrap()
    }

    #[test]
    fn config_builder_works() {
        let config = AnthropicConfig::new("test-key")
            .with_model("claude-3-haiku-20240307")
            .with_base_url("https://custom.api.com")
            .with_timeout(Duration::from_secs(30));

        assert_eq!(config.model, "claude-3-haiku-20240307");
        assert_eq!(config.base_url, "https://custom.api.com");
        assert_eq!(config.timeout, Duration::from_secs(30));
        assert_eq!(config.api_key(), "test-key");
    }

    #[test]
    fn debug_output_hides_api_key() {
        let debug = format!("{:?}", provider());
        assert!(!debug.contains("test-key"));
    }

    #[test]
    fn messages_url_trims_trailing_slash() {
        assert_eq!(provider().messages_url(), "https://custom.api.com/v1/messages");
    }

    #[test]
    fn request_carries_system_prompt_and_default_max_tokens() {
        let request = CompletionRequest::new(RequestMetadata::new(
            SessionId::new(),
            TurnId::new(),
            StageKind::Classify,
        ))
        .with_system_prompt("Classify the intent")
        .with_message(MessageRole::User, "make me a login page");

        let body = provider().to_anthropic_request(&request);

        assert_eq!(body.system.as_deref(), Some("Classify the intent"));
        assert_eq!(body.max_tokens, DEFAULT_MAX_TOKENS);
        assert_eq!(body.messages.len(), 1);
        assert_eq!(body.messages[0].role, "user");
    }

    #[test]
    fn empty_message_list_gets_placeholder() {
        let request = CompletionRequest::new(RequestMetadata::new(
            SessionId::new(),
            TurnId::new(),
            StageKind::Format,
        ));

        let body = provider().to_anthropic_request(&request);

        assert_eq!(body.messages.len(), 1);
    }

    #[test]
    fn status_errors_map_to_ai_errors() {
        assert!(matches!(
            status_error(StatusCode::UNAUTHORIZED, ""),
            AIError::AuthenticationFailed
        ));
        assert!(matches!(
            status_error(StatusCode::TOO_MANY_REQUESTS, ""),
            AIError::RateLimited {
                retry_after_secs: DEFAULT_RETRY_AFTER_SECS
            }
        ));
        assert!(matches!(
            status_error(StatusCode::BAD_REQUEST, "prompt is too long"),
            AIError::ContextTooLong { .. }
        ));
        assert!(matches!(
            status_error(StatusCode::BAD_REQUEST, "bad field"),
            AIError::InvalidRequest(_)
        ));
        assert!(status_error(StatusCode::SERVICE_UNAVAILABLE, "").is_retryable());
    }

    #[test]
    fn unexpected_client_statuses_are_not_retried() {
        for status in [StatusCode::NOT_FOUND, StatusCode::IM_A_TEAPOT, StatusCode::UNPROCESSABLE_ENTITY] {
            let error = status_error(status, "{\"error\":{\"message\":\"model: nope\"}}");
            assert!(matches!(error, AIError::InvalidRequest(_)), "{status}");
            assert!(!error.is_retryable(), "{status}");
        }
        assert!(status_error(StatusCode::BAD_GATEWAY, "").is_retryable());
        assert!(status_error(StatusCode::from_u16(529).unwrap(), "").is_retryable());
        assert!(status_error(StatusCode::TOO_MANY_REQUESTS, "").is_retryable());
    }

    #[test]
    fn parse_retry_after_reads_hint() {
        let body = r#"{"error":{"message":"Rate limited, try again in 12s"}}"#;
        assert_eq!(parse_retry_after(body), 12);
    }

    #[test]
    fn parse_retry_after_default() {
        let body = r#"{"error":{"message":"Rate limit exceeded"}}"#;
        assert_eq!(parse_retry_after(body), DEFAULT_RETRY_AFTER_SECS);
    }

    #[test]
    fn response_joins_text_blocks() {
        let json = r#"{
            "model": "claude-3-haiku-20240307",
            "content": [
                {"type": "text", "text": "{\"intent\": "},
                {"type": "tool_use"},
                {"type": "text", "text": "\"report\"}"}
            ],
            "stop_reason": "end_turn",
            "usage": {"input_tokens": 12, "output_tokens": 8}
        }"#;
        let response: AnthropicResponse = serde_json::from_str(json).unwrap();

        let completion = response.into_completion();

        assert_eq!(completion.content, r#"{"intent": "report"}"#);
        assert_eq!(completion.usage.total_tokens, 20);
        assert_eq!(completion.finish_reason, FinishReason::Stop);
    }

    #[test]
    fn max_tokens_stop_reason_maps_to_length() {
        let json = r#"{
            "model": "m",
            "content": [],
            "stop_reason": "max_tokens",
            "usage": {"input_tokens": 1, "output_tokens": 1}
        }"#;
        let response: AnthropicResponse = serde_json::from_str(json).unwrap();

        assert_eq!(response.into_completion().finish_reason, FinishReason::Length);
    }
}
