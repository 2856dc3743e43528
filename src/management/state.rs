use std::{io::ErrorKind, path::PathBuf};

use async_trait::async_trait;
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};

use crate::config;

#[derive(Debug, thiserror::Error)]
pub enum StateError {
    #[error("state file I/O failed: {0}")]
    Io(#[from] std::io::Error),
    #[error("state file is malformed: {0}")]
    Serde(#[from] serde_json::Error),
}

/// The only state that survives between runs.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScheduleState {
    /// Epoch millis of the last completed new-release check.
    pub last_check_at: Option<i64>,
    /// Length of the last observed rate-limit window. Display only.
    pub initial_rate_limit_secs: Option<u64>,
}

#[async_trait]
pub trait ScheduleStore: Send + Sync {
    async fn load(&self) -> Result<ScheduleState, StateError>;

    async fn save(&self, state: &ScheduleState) -> Result<(), StateError>;

    async fn record_check(&self, at: i64) -> Result<(), StateError> {
        let mut state = self.load().await?;
        state.last_check_at = Some(at);
        self.save(&state).await
    }

    async fn record_rate_limit(&self, secs: u64) -> Result<(), StateError> {
        let mut state = self.load().await?;
        state.initial_rate_limit_secs = Some(secs);
        self.save(&state).await
    }
}

#[derive(Debug, Default)]
pub struct MemoryScheduleStore {
    state: Mutex<ScheduleState>,
}

impl MemoryScheduleStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn snapshot(&self) -> ScheduleState {
        *self.state.lock()
    }
}

#[async_trait]
impl ScheduleStore for MemoryScheduleStore {
    async fn load(&self) -> Result<ScheduleState, StateError> {
        Ok(*self.state.lock())
    }

    async fn save(&self, state: &ScheduleState) -> Result<(), StateError> {
        *self.state.lock() = *state;
        Ok(())
    }
}

/// JSON file in the data directory.
#[derive(Debug, Clone)]
pub struct FileScheduleStore {
    path: PathBuf,
}

impl FileScheduleStore {
    pub fn new(path: PathBuf) -> Self {
        Self { path }
    }

    pub fn default_path() -> PathBuf {
        let mut path = config::data_dir();
        path.push("state/schedule.json");
        path
    }

    pub fn path(&self) -> &PathBuf {
        &self.path
    }
}

impl Default for FileScheduleStore {
    fn default() -> Self {
        Self::new(Self::default_path())
    }
}

#[async_trait]
impl ScheduleStore for FileScheduleStore {
    async fn load(&self) -> Result<ScheduleState, StateError> {
        match async_fs::read_to_string(&self.path).await {
            Ok(json) => Ok(serde_json::from_str(&json)?),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(ScheduleState::default()),
            Err(e) => Err(StateError::Io(e)),
        }
    }

    async fn save(&self, state: &ScheduleState) -> Result<(), StateError> {
        if let Some(parent) = self.path.parent() {
            async_fs::create_dir_all(parent).await?;
        }

        let json = serde_json::to_string_pretty(state)?;
        async_fs::write(&self.path, json).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_file_store_missing_file_is_default() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileScheduleStore::new(dir.path().join("schedule.json"));
        assert_eq!(store.load().await.unwrap(), ScheduleState::default());
    }

    #[tokio::test]
    async fn test_file_store_round_trips_both_values() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileScheduleStore::new(dir.path().join("nested/state/schedule.json"));

        store.record_check(1_704_067_200_000).await.unwrap();
        store.record_rate_limit(42).await.unwrap();

        let reopened = FileScheduleStore::new(store.path().clone());
        let state = reopened.load().await.unwrap();
        assert_eq!(state.last_check_at, Some(1_704_067_200_000));
        assert_eq!(state.initial_rate_limit_secs, Some(42));
    }

    #[tokio::test]
    async fn test_file_store_rejects_garbage() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("schedule.json");
        std::fs::write(&path, "not json").unwrap();

        let store = FileScheduleStore::new(path);
        assert!(matches!(store.load().await, Err(StateError::Serde(_))));
    }

    #[tokio::test]
    async fn test_memory_store_record_rate_limit_keeps_last_check() {
        let store = MemoryScheduleStore::new();
        store.record_check(10).await.unwrap();
        store.record_rate_limit(30).await.unwrap();

        assert_eq!(
            store.snapshot(),
            ScheduleState {
                last_check_at: Some(10),
                initial_rate_limit_secs: Some(30),
            }
        );
    }
}
