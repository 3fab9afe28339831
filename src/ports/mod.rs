//! Ports - Interfaces for external dependencies.
//!
//! Following hexagonal architecture, ports define the contracts between
//! the domain and the outside world. Adapters implement these ports.
//!
//! - `AIProvider` - the completion service
//! - `StageInvoker` - one reasoning stage, built on top of `AIProvider`
//! - `SessionStore` - session persistence
//! - `TemplateCatalog` - read-only template lookups

mod ai_provider;
mod session_store;
mod stage_invoker;
mod template_catalog;

pub use ai_provider::{
    AIError, AIProvider, CompletionRequest, CompletionResponse, FinishReason, Message,
    MessageRole, ProviderInfo, RequestMetadata, TokenUsage,
};
pub use session_store::{SessionStore, SessionStoreError};
pub use stage_invoker::{InvocationContext, StageInvoker};
pub use template_catalog::{CatalogError, TemplateCatalog, TemplateSummary};
