//! File-based Session Store Adapter
//!
//! Stores each session as a YAML file named after its id. Writes go to a
//! temporary file first and are renamed into place, so a reader never sees
//! a half-written session.

use async_trait::async_trait;
use std::path::{Path, PathBuf};
use tokio::fs;

use crate::domain::foundation::SessionId;
use crate::domain::session::Session;
use crate::ports::{SessionStore, SessionStoreError};

/// File-based storage for sessions
#[derive(Debug, Clone)]
pub struct FileSessionStore {
    base_path: PathBuf,
}

impl FileSessionStore {
    /// Create a new file store rooted at `base_path`.
    ///
    /// The directory is created on first write.
    ///
    /// # Example
    /// ```ignore
    /// let store = FileSessionStore::new("./data/sessions");
    /// ```
    pub fn new<P: AsRef<Path>>(base_path: P) -> Self {
        Self {
            base_path: base_path.as_ref().to_path_buf(),
        }
    }

    pub fn base_path(&self) -> &Path {
        &self.base_path
    }

    fn session_file_path(&self, id: SessionId) -> PathBuf {
        self.base_path.join(format!("{}.yaml", id))
    }

    fn temp_file_path(&self, id: SessionId) -> PathBuf {
        self.base_path.join(format!(".{}.yaml.tmp", id))
    }

    async fn ensure_dir(&self) -> Result<(), SessionStoreError> {
        fs::create_dir_all(&self.base_path)
            .await
            .map_err(|e| SessionStoreError::IoError(e.to_string()))
    }
}

#[async_trait]
impl SessionStore for FileSessionStore {
    async fn get(&self, id: SessionId) -> Result<Option<Session>, SessionStoreError> {
        let file_path = self.session_file_path(id);

        let yaml = match fs::read_to_string(&file_path).await {
            Ok(yaml) => yaml,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(SessionStoreError::IoError(e.to_string())),
        };

        let session = serde_yaml::from_str(&yaml).map_err(|e| {
            SessionStoreError::DeserializationFailed {
                id,
                reason: e.to_string(),
            }
        })?;

        Ok(Some(session))
    }

    async fn put(&self, id: SessionId, session: &Session) -> Result<(), SessionStoreError> {
        self.ensure_dir().await?;

        let yaml = serde_yaml::to_string(session)
            .map_err(|e| SessionStoreError::SerializationFailed(e.to_string()))?;

        let temp_path = self.temp_file_path(id);
        fs::write(&temp_path, yaml)
            .await
            .map_err(|e| SessionStoreError::IoError(e.to_string()))?;

        fs::rename(&temp_path, self.session_file_path(id))
            .await
            .map_err(|e| SessionStoreError::IoError(e.to_string()))
    }

    async fn delete(&self, id: SessionId) -> Result<bool, SessionStoreError> {
        match fs::remove_file(self.session_file_path(id)).await {
            Ok(()) => Ok(true),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(false),
            Err(e) => Err(SessionStoreError::IoError(e.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::mockup::{Candidate, Requirements};
    use crate::domain::session::{Phase, SessionChange, SlotDiff, SlotUpdate};
    use tempfile::TempDir;

    fn populated_session(id: SessionId) -> Session {
        let mut session = Session::new(id);
        let mut diff = SlotDiff::new();
        diff.push(SlotUpdate::SetRequirements(Requirements {
            page_type: Some("login".to_string()),
            ..Default::default()
        }));
        diff.push(SlotUpdate::SetRecommendations(vec![
            Candidate::named("Clean Login").with_score(0.92),
            Candidate::named("Split Screen").with_score(0.81),
        ]));
        session.apply(SessionChange {
            user_text: "I need a login page".to_string(),
            assistant_text: "I found 2 great templates for you".to_string(),
            next_phase: Phase::Recommendation,
            diff,
        });
        session
    }

    #[tokio::test]
    async fn save_and_load_round_trips_session() {
        let temp_dir = TempDir::new().unwrap();
        let store = FileSessionStore::new(temp_dir.path());
        let id = SessionId::new();
        let session = populated_session(id);

        store.put(id, &session).await.unwrap();
        let loaded = store.get(id).await.unwrap().unwrap();

        assert_eq!(loaded.phase(), Phase::Recommendation);
        assert_eq!(loaded.history().len(), 2);
        assert_eq!(loaded.slots().recommendations.len(), 2);
        assert_eq!(loaded.slots().category.as_deref(), Some("login"));
        assert_eq!(loaded.turn_count(), 1);
    }

    #[tokio::test]
    async fn load_nonexistent_session_returns_none() {
        let temp_dir = TempDir::new().unwrap();
        let store = FileSessionStore::new(temp_dir.path());

        assert!(store.get(SessionId::new()).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn put_creates_base_directory() {
        let temp_dir = TempDir::new().unwrap();
        let nested = temp_dir.path().join("a").join("b");
        let store = FileSessionStore::new(&nested);
        let id = SessionId::new();

        store.put(id, &Session::new(id)).await.unwrap();

        assert!(nested.join(format!("{}.yaml", id)).exists());
        assert!(!nested.join(format!(".{}.yaml.tmp", id)).exists());
    }

    #[tokio::test]
    async fn corrupt_file_reports_deserialization_failure() {
        let temp_dir = TempDir::new().unwrap();
        let store = FileSessionStore::new(temp_dir.path());
        let id = SessionId::new();
        std::fs::write(
            temp_dir.path().join(format!("{}.yaml", id)),
            "phase: [not, a, session",
        )
        .unwrap();

        let result = store.get(id).await;

        assert!(matches!(
            result,
            Err(SessionStoreError::DeserializationFailed { .. })
        ));
    }

    #[tokio::test]
    async fn unknown_phase_on_disk_loads_as_initial() {
        let temp_dir = TempDir::new().unwrap();
        let store = FileSessionStore::new(temp_dir.path());
        let id = SessionId::new();
        store.put(id, &Session::new(id)).await.unwrap();

        let path = temp_dir.path().join(format!("{}.yaml", id));
        let yaml = std::fs::read_to_string(&path).unwrap();
        let rewritten = yaml.replace("phase: initial", "phase: archived");
        std::fs::write(&path, rewritten).unwrap();

        let loaded = store.get(id).await.unwrap().unwrap();
        assert_eq!(loaded.phase(), Phase::Initial);
    }

    #[tokio::test]
    async fn delete_removes_file() {
        let temp_dir = TempDir::new().unwrap();
        let store = FileSessionStore::new(temp_dir.path());
        let id = SessionId::new();
        store.put(id, &Session::new(id)).await.unwrap();

        assert!(store.delete(id).await.unwrap());
        assert!(!store.delete(id).await.unwrap());
        assert!(store.get(id).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn sessions_are_stored_independently() {
        let temp_dir = TempDir::new().unwrap();
        let store = FileSessionStore::new(temp_dir.path());
        let first = SessionId::new();
        let second = SessionId::new();

        store.put(first, &populated_session(first)).await.unwrap();
        store.put(second, &Session::new(second)).await.unwrap();

        assert_eq!(
            store.get(first).await.unwrap().unwrap().phase(),
            Phase::Recommendation
        );
        assert_eq!(
            store.get(second).await.unwrap().unwrap().phase(),
            Phase::Initial
        );
    }
}
