//! Adapters - Implementations of port interfaces.
//!
//! Adapters connect the domain to external systems:
//! - `ai` - Completion service providers (Anthropic, mock)
//! - `storage` - Session stores (memory, YAML files, Redis)
//! - `catalog` - Template catalog lookups

pub mod ai;
pub mod catalog;
pub mod storage;

pub use ai::{AnthropicConfig, AnthropicProvider, MockAIProvider, MockError};
pub use catalog::InMemoryTemplateCatalog;
pub use storage::{FileSessionStore, InMemorySessionStore, RedisSessionStore};
