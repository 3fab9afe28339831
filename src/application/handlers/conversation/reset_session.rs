//! ResetSession - drops a session so the next turn starts over.

use serde::Serialize;
use std::sync::Arc;
use thiserror::Error;

use crate::application::session_locks::SessionLocks;
use crate::domain::foundation::SessionId;
use crate::ports::{SessionStore, SessionStoreError};

pub const RESET_MESSAGE: &str = "Session reset successfully";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResetSessionCommand {
    pub session_id: SessionId,
}

impl ResetSessionCommand {
    pub fn new(session_id: SessionId) -> Self {
        Self { session_id }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ResetSessionResult {
    pub session_id: SessionId,
    /// False when there was nothing stored under the id.
    pub existed: bool,
    pub message: String,
}

#[derive(Debug, Error)]
pub enum ResetSessionError {
    #[error("Failed to reset session: {0}")]
    Store(#[from] SessionStoreError),
}

/// Deletes a session while holding its lock, so a reset never interleaves
/// with a running turn.
pub struct ResetSessionHandler {
    store: Arc<dyn SessionStore>,
    locks: SessionLocks,
}

impl ResetSessionHandler {
    pub fn new(store: Arc<dyn SessionStore>, locks: SessionLocks) -> Self {
        Self { store, locks }
    }

    pub async fn handle(&self, cmd: ResetSessionCommand) -> Result<ResetSessionResult, ResetSessionError> {
        let _guard = self.locks.acquire(cmd.session_id).await;
        let existed = self.store.delete(cmd.session_id).await?;
        tracing::info!(session_id = %cmd.session_id, existed, "Session reset");

        Ok(ResetSessionResult {
            session_id: cmd.session_id,
            existed,
            message: RESET_MESSAGE.to_string(),
        })
    }
}
