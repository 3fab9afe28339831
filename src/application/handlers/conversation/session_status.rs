//! SessionStatus - read-only summary of a stored session.

use serde::Serialize;
use std::sync::Arc;
use thiserror::Error;

use crate::domain::foundation::{SessionId, Timestamp};
use crate::domain::session::{Phase, Session};
use crate::ports::{SessionStore, SessionStoreError};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SessionStatusQuery {
    pub session_id: SessionId,
}

impl SessionStatusQuery {
    pub fn new(session_id: SessionId) -> Self {
        Self { session_id }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SessionStatus {
    pub session_id: SessionId,
    pub phase: Phase,
    pub turn_count: u64,
    pub history_length: usize,
    pub has_requirements: bool,
    pub has_recommendations: bool,
    pub selected_template: Option<String>,
    pub modification_count: usize,
    pub has_report: bool,
    /// The question the user still owes an answer to, if any.
    pub pending_clarification: Option<String>,
    pub category: Option<String>,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

impl From<&Session> for SessionStatus {
    fn from(session: &Session) -> Self {
        let slots = session.slots();
        Self {
            session_id: session.id(),
            phase: session.phase(),
            turn_count: session.turn_count(),
            history_length: session.history().len(),
            has_requirements: slots.requirements.is_some(),
            has_recommendations: !slots.recommendations.is_empty(),
            selected_template: slots.selected_artifact.as_ref().map(|a| a.name.clone()),
            modification_count: slots.modifications.len(),
            has_report: slots.report.is_some(),
            pending_clarification: slots.pending_clarification.as_ref().map(|c| c.reason.clone()),
            category: slots.category.clone(),
            created_at: *session.created_at(),
            updated_at: *session.updated_at(),
        }
    }
}

#[derive(Debug, Error)]
pub enum SessionStatusError {
    #[error("Failed to load session: {0}")]
    Store(#[from] SessionStoreError),
}

pub struct SessionStatusHandler {
    store: Arc<dyn SessionStore>,
}

impl SessionStatusHandler {
    pub fn new(store: Arc<dyn SessionStore>) -> Self {
        Self { store }
    }

    pub async fn handle(&self, query: SessionStatusQuery) -> Result<Option<SessionStatus>, SessionStatusError> {
        let session = self.store.get(query.session_id).await?;
        Ok(session.as_ref().map(SessionStatus::from))
    }
}
