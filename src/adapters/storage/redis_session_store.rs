//! Redis-backed session store for multi-process deployments.
//!
//! Sessions are stored as JSON strings under `{prefix}:session:{id}`. When a
//! TTL is configured every write refreshes it, so idle sessions expire on
//! their own.

use async_trait::async_trait;
use redis::aio::MultiplexedConnection;
use redis::AsyncCommands;
use std::time::Duration;

use crate::domain::foundation::SessionId;
use crate::domain::session::Session;
use crate::ports::{SessionStore, SessionStoreError};

/// Default key prefix.
pub const DEFAULT_KEY_PREFIX: &str = "mockup_sherpa";

/// Redis-backed session store.
#[derive(Clone)]
pub struct RedisSessionStore {
    conn: MultiplexedConnection,
    key_prefix: String,
    ttl: Option<Duration>,
}

impl std::fmt::Debug for RedisSessionStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RedisSessionStore")
            .field("key_prefix", &self.key_prefix)
            .field("ttl", &self.ttl)
            .finish()
    }
}

impl RedisSessionStore {
    /// Create a store over an existing connection.
    pub fn new(conn: MultiplexedConnection) -> Self {
        Self {
            conn,
            key_prefix: DEFAULT_KEY_PREFIX.to_string(),
            ttl: None,
        }
    }

    /// Open a connection to `url` and create a store over it.
    pub async fn connect(url: &str) -> Result<Self, SessionStoreError> {
        let client = redis::Client::open(url).map_err(backend_error)?;
        let conn = client
            .get_multiplexed_tokio_connection()
            .await
            .map_err(backend_error)?;
        Ok(Self::new(conn))
    }

    pub fn with_key_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.key_prefix = prefix.into();
        self
    }

    /// Expire sessions after `ttl` without writes. Sub-second TTLs round up.
    pub fn with_ttl(mut self, ttl: Duration) -> Self {
        self.ttl = Some(ttl);
        self
    }

    fn key(&self, id: SessionId) -> String {
        session_key(&self.key_prefix, id)
    }
}

fn session_key(prefix: &str, id: SessionId) -> String {
    format!("{}:session:{}", prefix, id)
}

fn ttl_secs(ttl: Duration) -> i64 {
    let secs = ttl.as_secs() + u64::from(ttl.subsec_nanos() > 0);
    i64::try_from(secs.max(1)).unwrap_or(i64::MAX)
}

fn backend_error(e: redis::RedisError) -> SessionStoreError {
    SessionStoreError::Backend(e.to_string())
}

#[async_trait]
impl SessionStore for RedisSessionStore {
    async fn get(&self, id: SessionId) -> Result<Option<Session>, SessionStoreError> {
        let mut conn = self.conn.clone();

        let json: Option<String> = conn.get(self.key(id)).await.map_err(backend_error)?;

        json.map(|json| {
            serde_json::from_str(&json).map_err(|e| SessionStoreError::DeserializationFailed {
                id,
                reason: e.to_string(),
            })
        })
        .transpose()
    }

    async fn put(&self, id: SessionId, session: &Session) -> Result<(), SessionStoreError> {
        let json = serde_json::to_string(session)
            .map_err(|e| SessionStoreError::SerializationFailed(e.to_string()))?;
        let key = self.key(id);
        let mut conn = self.conn.clone();

        match self.ttl {
            Some(ttl) => redis::pipe()
                .atomic()
                .set(&key, json)
                .ignore()
                .expire(&key, ttl_secs(ttl))
                .ignore()
                .query_async::<_, ()>(&mut conn)
                .await
                .map_err(backend_error),
            None => conn.set::<_, _, ()>(&key, json).await.map_err(backend_error),
        }
    }

    async fn delete(&self, id: SessionId) -> Result<bool, SessionStoreError> {
        let mut conn = self.conn.clone();
        let removed: i64 = conn.del(self.key(id)).await.map_err(backend_error)?;
        Ok(removed > 0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn session_key_is_namespaced() {
        let id: SessionId = "7f9c2ba4-e88f-4d8a-9c3b-0d1e2f3a4b5c".parse().unwrap();

        assert_eq!(
            session_key(DEFAULT_KEY_PREFIX, id),
            "mockup_sherpa:session:7f9c2ba4-e88f-4d8a-9c3b-0d1e2f3a4b5c"
        );
    }

    #[test]
    fn ttl_rounds_up_to_whole_seconds() {
        assert_eq!(ttl_secs(Duration::from_secs(3600)), 3600);
        assert_eq!(ttl_secs(Duration::from_millis(1500)), 2);
        assert_eq!(ttl_secs(Duration::from_millis(10)), 1);
        assert_eq!(ttl_secs(Duration::ZERO), 1);
    }

    // Requires a running Redis instance.
    #[tokio::test]
    #[ignore]
    async fn round_trips_session_through_redis() {
        let store = RedisSessionStore::connect("redis://127.0.0.1/")
            .await
            .unwrap()
            .with_key_prefix("mockup_sherpa_test")
            .with_ttl(Duration::from_secs(60));
        let id = SessionId::new();
        let session = Session::new(id);

        store.put(id, &session).await.unwrap();

        assert_eq!(store.get(id).await.unwrap(), Some(session));
        assert!(store.delete(id).await.unwrap());
        assert!(store.get(id).await.unwrap().is_none());
    }
}
