//! Persistence of the last good usage snapshot.
//!
//! The cache is a convenience: a missing or corrupt file reads as "no
//! snapshot" and never fails the caller.

use std::path::{Path, PathBuf};
use std::sync::{Mutex, PoisonError};

use async_trait::async_trait;
use tallybar_core::UsageSnapshot;
use tracing::{debug, warn};

use crate::error::StoreError;
use crate::persistence::{default_snapshot_path, load_json, remove_file_if_exists, save_json};

// ============================================================================
// Snapshot Store Trait
// ============================================================================

/// Storage for the most recent successful snapshot.
#[async_trait]
pub trait SnapshotStore: Send + Sync {
    /// Returns the stored snapshot, or `None` if absent or unreadable.
    async fn load(&self) -> Option<UsageSnapshot>;

    /// Replaces the stored snapshot.
    ///
    /// # Errors
    ///
    /// Returns an error if the snapshot cannot be written.
    async fn save(&self, snapshot: &UsageSnapshot) -> Result<(), StoreError>;

    /// Removes the stored snapshot. Returns whether one existed.
    async fn clear(&self) -> Result<bool, StoreError>;
}

// ============================================================================
// File Implementation
// ============================================================================

/// Snapshot cache kept as a JSON file.
#[derive(Debug, Clone)]
pub struct FileSnapshotStore {
    path: PathBuf,
}

impl FileSnapshotStore {
    /// Creates a store writing to `path`.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Creates a store at the default location.
    pub fn at_default_path() -> Self {
        Self::new(default_snapshot_path())
    }

    /// Location of the cache file.
    pub fn path(&self) -> &Path {
        &self.path
    }
}

#[async_trait]
impl SnapshotStore for FileSnapshotStore {
    async fn load(&self) -> Option<UsageSnapshot> {
        match load_json::<UsageSnapshot>(&self.path).await {
            Ok(snapshot) => {
                debug!(
                    path = %self.path.display(),
                    period = %snapshot.period,
                    "Loaded cached snapshot"
                );
                Some(snapshot)
            }
            Err(e) if e.is_not_found() => {
                debug!(path = %self.path.display(), "No cached snapshot");
                None
            }
            Err(e) => {
                warn!(path = %self.path.display(), error = %e, "Ignoring unreadable snapshot cache");
                None
            }
        }
    }

    async fn save(&self, snapshot: &UsageSnapshot) -> Result<(), StoreError> {
        save_json(&self.path, snapshot).await
    }

    async fn clear(&self) -> Result<bool, StoreError> {
        remove_file_if_exists(&self.path).await
    }
}

// ============================================================================
// In-Memory Implementation
// ============================================================================

/// Snapshot store held in memory, with an optional forced save failure.
#[derive(Debug, Default)]
pub struct MemorySnapshotStore {
    snapshot: Mutex<Option<UsageSnapshot>>,
    saves: Mutex<usize>,
    fail_saves: Mutex<bool>,
}

impl MemorySnapshotStore {
    /// Creates an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a store already holding `snapshot`.
    pub fn with_snapshot(snapshot: UsageSnapshot) -> Self {
        let store = Self::new();
        *store.snapshot.lock().unwrap_or_else(PoisonError::into_inner) = Some(snapshot);
        store
    }

    /// Makes every subsequent `save` fail.
    pub fn fail_saves(&self, fail: bool) {
        *self.fail_saves.lock().unwrap_or_else(PoisonError::into_inner) = fail;
    }

    /// Number of successful saves so far.
    pub fn save_count(&self) -> usize {
        *self.saves.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Current contents without going through the trait.
    pub fn current(&self) -> Option<UsageSnapshot> {
        self.snapshot
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

#[async_trait]
impl SnapshotStore for MemorySnapshotStore {
    async fn load(&self) -> Option<UsageSnapshot> {
        self.current()
    }

    async fn save(&self, snapshot: &UsageSnapshot) -> Result<(), StoreError> {
        if *self.fail_saves.lock().unwrap_or_else(PoisonError::into_inner) {
            return Err(StoreError::Io(std::io::Error::other("save disabled")));
        }
        *self.snapshot.lock().unwrap_or_else(PoisonError::into_inner) = Some(snapshot.clone());
        *self.saves.lock().unwrap_or_else(PoisonError::into_inner) += 1;
        Ok(())
    }

    async fn clear(&self) -> Result<bool, StoreError> {
        Ok(self
            .snapshot
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take()
            .is_some())
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};
    use tallybar_core::{Period, RawUsageItem, aggregate};
    use tempfile::TempDir;

    fn sample() -> UsageSnapshot {
        let items = [RawUsageItem {
            gross_quantity: 4.0,
            discount_quantity: 4.0,
            ..RawUsageItem::for_model("GPT-4.1")
        }];
        let fetched_at = Utc.with_ymd_and_hms(2025, 5, 2, 9, 30, 0).unwrap();
        aggregate(&items, Period::new(2025, 5).unwrap(), "github-copilot", 300, fetched_at)
    }

    #[tokio::test]
    async fn test_file_store_roundtrip() {
        let dir = TempDir::new().unwrap();
        let store = FileSnapshotStore::new(dir.path().join("last_snapshot.json"));

        assert!(store.load().await.is_none());

        let snapshot = sample();
        store.save(&snapshot).await.unwrap();
        assert_eq!(store.load().await, Some(snapshot));
    }

    #[tokio::test]
    async fn test_file_store_overwrites() {
        let dir = TempDir::new().unwrap();
        let store = FileSnapshotStore::new(dir.path().join("last_snapshot.json"));

        store.save(&sample()).await.unwrap();
        let updated = sample().with_allowance(1500);
        store.save(&updated).await.unwrap();

        assert_eq!(store.load().await.unwrap().included_allowance, 1500);
        let entries: Vec<_> = std::fs::read_dir(dir.path()).unwrap().collect();
        assert_eq!(entries.len(), 1);
    }

    #[tokio::test]
    async fn test_corrupt_cache_reads_as_none() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("last_snapshot.json");
        tokio::fs::write(&path, "{\"providerId\": \"github-copilot\", ")
            .await
            .unwrap();

        let store = FileSnapshotStore::new(&path);
        assert!(store.load().await.is_none());
    }

    #[tokio::test]
    async fn test_wrong_shape_reads_as_none() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("last_snapshot.json");
        tokio::fs::write(&path, "[1, 2, 3]").await.unwrap();

        assert!(FileSnapshotStore::new(&path).load().await.is_none());
    }

    #[tokio::test]
    async fn test_clear() {
        let dir = TempDir::new().unwrap();
        let store = FileSnapshotStore::new(dir.path().join("last_snapshot.json"));

        assert!(!store.clear().await.unwrap());
        store.save(&sample()).await.unwrap();
        assert!(store.clear().await.unwrap());
        assert!(store.load().await.is_none());
    }

    #[tokio::test]
    async fn test_memory_store_failure_switch() {
        let store = MemorySnapshotStore::new();
        store.save(&sample()).await.unwrap();
        assert_eq!(store.save_count(), 1);

        store.fail_saves(true);
        assert!(store.save(&sample().with_allowance(50)).await.is_err());
        assert_eq!(store.save_count(), 1);
        assert_eq!(store.current().unwrap().included_allowance, 300);
    }
}
