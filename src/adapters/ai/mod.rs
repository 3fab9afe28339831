//! AI Provider Adapters.
//!
//! Implementations of the AIProvider port.
//!
//! - `MockAIProvider` - Scriptable provider for tests and local runs
//! - `AnthropicProvider` - Anthropic Messages API

mod anthropic_provider;
mod mock_provider;

pub use anthropic_provider::{AnthropicConfig, AnthropicProvider};
pub use mock_provider::{MockAIProvider, MockError, MockResponse, MOCK_DEFAULT_RESPONSE};
