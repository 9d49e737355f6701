//! Single-file JSON transcript store.

use crate::error::SessionError;
use crate::types::SessionState;
use std::path::{Path, PathBuf};

/// Default session file, relative to the working directory.
pub const DEFAULT_SESSION_FILE: &str = "estado_bot.json";

/// Reads and writes the whole transcript at a fixed path. No locking;
/// one process owns the file.
pub struct SessionStore {
    path: PathBuf,
}

impl SessionStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Load the transcript. A missing file is an empty session; a file that
    /// does not parse is an error.
    pub async fn load(&self) -> Result<SessionState, SessionError> {
        let data = match tokio::fs::read_to_string(&self.path).await {
            Ok(data) => data,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::debug!("No session file at {}", self.path.display());
                return Ok(SessionState::new());
            }
            Err(e) => return Err(e.into()),
        };

        let state: SessionState =
            serde_json::from_str(&data).map_err(|source| SessionError::Corrupt {
                path: self.path.clone(),
                source,
            })?;
        tracing::debug!(
            "Loaded {} messages from {}",
            state.len(),
            self.path.display()
        );
        Ok(state)
    }

    /// Save the whole transcript (atomic write: .tmp → rename).
    pub async fn save(&self, state: &SessionState) -> Result<(), SessionError> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent).await?;
        }
        let tmp_path = self.path.with_extension("tmp");
        let json = serde_json::to_string_pretty(state)?;
        tokio::fs::write(&tmp_path, json).await?;
        tokio::fs::rename(&tmp_path, &self.path).await?;
        Ok(())
    }

    /// Empty the transcript and persist the empty state immediately.
    pub async fn clear(&self, state: &mut SessionState) -> Result<(), SessionError> {
        state.clear();
        self.save(state).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn test_store() -> (SessionStore, TempDir) {
        let tmp = TempDir::new().unwrap();
        let store = SessionStore::new(tmp.path().join(DEFAULT_SESSION_FILE));
        (store, tmp)
    }

    #[tokio::test]
    async fn missing_file_loads_empty() {
        let (store, _tmp) = test_store();
        let state = store.load().await.unwrap();
        assert!(state.is_empty());
    }

    #[tokio::test]
    async fn save_and_load_roundtrip() {
        let (store, _tmp) = test_store();
        let mut state = SessionState::new();
        let idx = state.push_question("Qual a margem?");
        state.fill_answer(idx, "Cerca de 12%.");
        state.push_question("E o custo fixo?");

        store.save(&state).await.unwrap();
        let loaded = store.load().await.unwrap();
        assert_eq!(loaded.len(), 2);
        assert_eq!(loaded.messages[0].user.as_deref(), Some("Qual a margem?"));
        assert_eq!(loaded.messages[0].bot.as_deref(), Some("Cerca de 12%."));
        assert_eq!(loaded.messages[1].user.as_deref(), Some("E o custo fixo?"));
        assert_eq!(loaded.messages[1].bot, None);
        assert_eq!(loaded, state);
    }

    #[tokio::test]
    async fn save_overwrites_and_leaves_no_tmp() {
        let (store, tmp) = test_store();
        let mut state = SessionState::new();
        state.push_question("primeira");
        store.save(&state).await.unwrap();

        state.clear();
        state.push_question("segunda");
        store.save(&state).await.unwrap();

        let loaded = store.load().await.unwrap();
        assert_eq!(loaded.messages[0].user.as_deref(), Some("segunda"));
        assert!(!tmp.path().join("estado_bot.tmp").exists());
    }

    #[tokio::test]
    async fn corrupt_file_is_an_error() {
        let (store, _tmp) = test_store();
        tokio::fs::write(store.path(), "{not json").await.unwrap();
        let result = store.load().await;
        assert!(matches!(result, Err(SessionError::Corrupt { .. })));
    }

    #[tokio::test]
    async fn clear_persists_empty_state() {
        let (store, _tmp) = test_store();
        let mut state = SessionState::new();
        state.push_question("x");
        store.save(&state).await.unwrap();

        store.clear(&mut state).await.unwrap();
        assert!(state.is_empty());
        let on_disk = tokio::fs::read_to_string(store.path()).await.unwrap();
        let json: serde_json::Value = serde_json::from_str(&on_disk).unwrap();
        assert_eq!(json, serde_json::json!({"mensagens_chat": []}));
    }

    #[tokio::test]
    async fn save_creates_parent_directories() {
        let tmp = TempDir::new().unwrap();
        let store = SessionStore::new(tmp.path().join("nested/dir/estado.json"));
        store.save(&SessionState::new()).await.unwrap();
        assert!(store.path().exists());
    }
}
