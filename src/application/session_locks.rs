//! Per-session mutual exclusion.
//!
//! Each session id maps to a tokio mutex. Tokio mutexes hand out the lock
//! in request order, so turns for one session run in submission order
//! while turns for different sessions never wait on each other. Entries
//! nobody holds or waits for are removed when a guard is dropped and on
//! every acquire.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tokio::sync::{Mutex as AsyncMutex, OwnedMutexGuard};

use crate::domain::foundation::SessionId;

type Registry = Arc<Mutex<HashMap<SessionId, Arc<AsyncMutex<()>>>>>;

/// Registry of per-session locks.
#[derive(Debug, Clone, Default)]
pub struct SessionLocks {
    registry: Registry,
}

/// Held for the duration of one turn.
#[derive(Debug)]
pub struct SessionGuard {
    id: SessionId,
    guard: Option<OwnedMutexGuard<()>>,
    registry: Registry,
}

impl SessionLocks {
    pub fn new() -> Self {
        Self::default()
    }

    /// Waits for exclusive access to `id`.
    pub async fn acquire(&self, id: SessionId) -> SessionGuard {
        let lock = {
            let mut map = lock_registry(&self.registry);
            prune(&mut map);
            map.entry(id).or_default().clone()
        };

        let guard = lock.lock_owned().await;
        SessionGuard {
            id,
            guard: Some(guard),
            registry: self.registry.clone(),
        }
    }

    /// Number of sessions with a live entry.
    pub fn tracked(&self) -> usize {
        lock_registry(&self.registry).len()
    }
}

impl SessionGuard {
    pub fn session_id(&self) -> SessionId {
        self.id
    }
}

impl Drop for SessionGuard {
    fn drop(&mut self) {
        drop(self.guard.take());
        let mut map = lock_registry(&self.registry);
        if map.get(&self.id).is_some_and(|lock| Arc::strong_count(lock) == 1) {
            map.remove(&self.id);
        }
    }
}

fn lock_registry(
    registry: &Registry,
) -> MutexGuard<'_, HashMap<SessionId, Arc<AsyncMutex<()>>>> {
    registry.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Drops entries only the registry still references.
fn prune(map: &mut HashMap<SessionId, Arc<AsyncMutex<()>>>) {
    map.retain(|_, lock| Arc::strong_count(lock) > 1);
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;
    use tokio::sync::mpsc;

    #[tokio::test]
    async fn guard_is_pruned_after_release() {
        let locks = SessionLocks::new();
        let id = SessionId::new();

        let guard = locks.acquire(id).await;
        assert_eq!(locks.tracked(), 1);
        assert_eq!(guard.session_id(), id);

        drop(guard);
        assert_eq!(locks.tracked(), 0);
    }

    #[tokio::test]
    async fn same_session_turns_run_in_submission_order() {
        let locks = SessionLocks::new();
        let id = SessionId::new();
        let (tx, mut rx) = mpsc::unbounded_channel();

        let first = locks.acquire(id).await;

        let mut handles = Vec::new();
        for n in 1..=3 {
            let locks = locks.clone();
            let tx = tx.clone();
            handles.push(tokio::spawn(async move {
                let _guard = locks.acquire(id).await;
                tx.send(n).unwrap();
            }));
            // Let each task queue on the mutex before spawning the next.
            tokio::time::sleep(Duration::from_millis(10)).await;
        }

        drop(first);
        for handle in handles {
            handle.await.unwrap();
        }
        drop(tx);

        let mut order = Vec::new();
        while let Some(n) = rx.recv().await {
            order.push(n);
        }
        assert_eq!(order, vec![1, 2, 3]);
        assert_eq!(locks.tracked(), 0);
    }

    #[tokio::test]
    async fn different_sessions_do_not_block_each_other() {
        let locks = SessionLocks::new();

        let _held = locks.acquire(SessionId::new()).await;
        let other = tokio::time::timeout(
            Duration::from_millis(100),
            locks.acquire(SessionId::new()),
        )
        .await;

        assert!(other.is_ok());
    }

    #[tokio::test]
    async fn cancelled_waiter_leaves_no_entry_behind() {
        let locks = SessionLocks::new();
        let id = SessionId::new();

        let held = locks.acquire(id).await;
        let waiter = tokio::time::timeout(Duration::from_millis(20), locks.acquire(id)).await;
        assert!(waiter.is_err());

        drop(held);
        assert_eq!(locks.tracked(), 0);
    }
}
