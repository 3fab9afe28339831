//! Session Store Port - Interface for persisting sessions.
//!
//! Writes are last-writer-wins. The orchestrator's per-session lock keeps
//! concurrent writers for one session from ever reaching the store.

use async_trait::async_trait;

use crate::domain::foundation::SessionId;
use crate::domain::session::Session;

/// Errors that can occur during session storage operations
#[derive(Debug, thiserror::Error)]
pub enum SessionStoreError {
    #[error("Failed to serialize session: {0}")]
    SerializationFailed(String),

    #[error("Failed to deserialize session {id}: {reason}")]
    DeserializationFailed { id: SessionId, reason: String },

    #[error("IO error: {0}")]
    IoError(String),

    #[error("Backend error: {0}")]
    Backend(String),
}

/// Port for loading and saving sessions.
#[async_trait]
pub trait SessionStore: Send + Sync {
    /// Loads a session, returning `None` if it does not exist.
    async fn get(&self, id: SessionId) -> Result<Option<Session>, SessionStoreError>;

    /// Stores a session, replacing any previous version.
    async fn put(&self, id: SessionId, session: &Session) -> Result<(), SessionStoreError>;

    /// Removes a session. Returns true if something was deleted.
    async fn delete(&self, id: SessionId) -> Result<bool, SessionStoreError>;
}
