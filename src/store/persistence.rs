//! Device-local store persistence
//!
//! The whole store is serialized as one JSON document under a fixed file
//! name, rehydrated at process start and rewritten on every mutation.
//! Writes go to a temp file first and are renamed into place.

use crate::config::STORE_FILE_NAME;
use crate::error::Result;
use crate::store::models::AppState;
use std::path::PathBuf;
use tokio::fs;

#[derive(Clone)]
pub struct StoreStorage {
    path: PathBuf,
}

impl StoreStorage {
    pub fn new(data_dir: PathBuf) -> Self {
        Self {
            path: data_dir.join(STORE_FILE_NAME),
        }
    }

    /// Load the persisted snapshot, or None when no snapshot exists yet
    pub async fn load(&self) -> Result<Option<AppState>> {
        if !self.path.exists() {
            return Ok(None);
        }
        let content = fs::read_to_string(&self.path).await?;
        let state: AppState = serde_json::from_str(&content)?;
        Ok(Some(state))
    }

    /// Overwrite the snapshot on disk
    pub async fn save(&self, state: &AppState) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent).await?;
        }
        let content = serde_json::to_string_pretty(state)?;

        let temp_path = self.path.with_extension("tmp");
        fs::write(&temp_path, content).await?;
        fs::rename(&temp_path, &self.path).await?;

        tracing::debug!("Store snapshot saved to {:?}", self.path);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::models::{DayLog, Theme};
    use tempfile::TempDir;

    #[tokio::test]
    async fn load_returns_none_without_snapshot() {
        let temp = TempDir::new().unwrap();
        let storage = StoreStorage::new(temp.path().to_path_buf());

        assert!(storage.load().await.unwrap().is_none());
    }

    #[tokio::test]
    async fn snapshot_survives_save_and_load() {
        let temp = TempDir::new().unwrap();
        let storage = StoreStorage::new(temp.path().to_path_buf());

        let mut state = AppState::default();
        state.theme = Theme::Dark;
        state
            .logs
            .insert("2024-02-10".into(), DayLog::new("2024-02-10"));
        storage.save(&state).await.unwrap();

        let loaded = storage.load().await.unwrap().unwrap();
        assert_eq!(loaded.theme, Theme::Dark);
        assert!(loaded.logs.contains_key("2024-02-10"));
    }

    #[tokio::test]
    async fn corrupt_snapshot_is_an_error() {
        let temp = TempDir::new().unwrap();
        let storage = StoreStorage::new(temp.path().to_path_buf());
        std::fs::write(temp.path().join(STORE_FILE_NAME), "not json").unwrap();

        assert!(storage.load().await.is_err());
    }
}
