//! In-Memory Session Store Adapter
//!
//! Keeps sessions in a process-local map. Useful for tests and development.

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;

use crate::domain::foundation::SessionId;
use crate::domain::session::Session;
use crate::ports::{SessionStore, SessionStoreError};

/// In-memory storage for sessions
#[derive(Debug, Clone, Default)]
pub struct InMemorySessionStore {
    sessions: Arc<RwLock<HashMap<SessionId, Session>>>,
}

impl InMemorySessionStore {
    /// Create a new, empty store
    pub fn new() -> Self {
        Self::default()
    }

    /// Clear all stored sessions (useful for tests)
    pub async fn clear(&self) {
        self.sessions.write().await.clear();
    }

    /// Get the number of stored sessions
    pub async fn len(&self) -> usize {
        self.sessions.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.sessions.read().await.is_empty()
    }
}

#[async_trait]
impl SessionStore for InMemorySessionStore {
    async fn get(&self, id: SessionId) -> Result<Option<Session>, SessionStoreError> {
        Ok(self.sessions.read().await.get(&id).cloned())
    }

    async fn put(&self, id: SessionId, session: &Session) -> Result<(), SessionStoreError> {
        self.sessions.write().await.insert(id, session.clone());
        Ok(())
    }

    async fn delete(&self, id: SessionId) -> Result<bool, SessionStoreError> {
        Ok(self.sessions.write().await.remove(&id).is_some())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::session::Phase;

    #[tokio::test]
    async fn get_missing_session_returns_none() {
        let store = InMemorySessionStore::new();

        assert!(store.get(SessionId::new()).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn put_then_get_returns_same_session() {
        let store = InMemorySessionStore::new();
        let id = SessionId::new();
        let session = Session::new(id).with_phase(Phase::Recommendation);

        store.put(id, &session).await.unwrap();

        assert_eq!(store.get(id).await.unwrap(), Some(session));
    }

    #[tokio::test]
    async fn put_replaces_previous_version() {
        let store = InMemorySessionStore::new();
        let id = SessionId::new();

        store.put(id, &Session::new(id)).await.unwrap();
        store
            .put(id, &Session::new(id).with_phase(Phase::Editing))
            .await
            .unwrap();

        let loaded = store.get(id).await.unwrap().unwrap();
        assert_eq!(loaded.phase(), Phase::Editing);
        assert_eq!(store.len().await, 1);
    }

    #[tokio::test]
    async fn delete_reports_whether_anything_was_removed() {
        let store = InMemorySessionStore::new();
        let id = SessionId::new();
        store.put(id, &Session::new(id)).await.unwrap();

        assert!(store.delete(id).await.unwrap());
        assert!(!store.delete(id).await.unwrap());
        assert!(store.is_empty().await);
    }

    #[tokio::test]
    async fn clones_share_storage() {
        let store = InMemorySessionStore::new();
        let clone = store.clone();
        let id = SessionId::new();

        clone.put(id, &Session::new(id)).await.unwrap();

        assert!(store.get(id).await.unwrap().is_some());
        store.clear().await;
        assert!(clone.is_empty().await);
    }
}
