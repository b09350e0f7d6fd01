//! Non-secret application configuration.
//!
//! Username, included allowance, and poll interval live in a small JSON file.
//! The bearer token never does; see [`crate::credentials`].

use std::path::{Path, PathBuf};
use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tallybar_core::DEFAULT_INCLUDED_ALLOWANCE;
use tokio::sync::RwLock;
use tracing::{debug, info};

use crate::error::StoreError;
use crate::persistence::{default_config_path, load_json_or_default, save_json};

/// Default poll interval in minutes.
pub const DEFAULT_REFRESH_INTERVAL_MINUTES: u32 = 15;

// ============================================================================
// App Config
// ============================================================================

/// User-editable configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// GitHub login whose usage is tracked.
    pub username: String,
    /// Requests included in the plan each month.
    pub included_allowance: i64,
    /// Minutes between automatic refreshes; 0 disables the timer.
    pub refresh_interval_minutes: u32,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            username: String::new(),
            included_allowance: DEFAULT_INCLUDED_ALLOWANCE,
            refresh_interval_minutes: DEFAULT_REFRESH_INTERVAL_MINUTES,
        }
    }
}

impl AppConfig {
    /// Returns true if a non-blank username is set.
    pub fn has_username(&self) -> bool {
        !self.username.trim().is_empty()
    }

    /// Poll interval, or `None` for manual-only refresh.
    pub fn poll_interval(&self) -> Option<Duration> {
        interval_from_minutes(self.refresh_interval_minutes)
    }
}

/// Converts a minute count to a timer delay; 0 means no timer.
pub fn interval_from_minutes(minutes: u32) -> Option<Duration> {
    (minutes > 0).then(|| Duration::from_secs(u64::from(minutes) * 60))
}

// ============================================================================
// Config Store Trait
// ============================================================================

/// Read/write access to [`AppConfig`].
///
/// Reads are cheap; callers read at the point of use rather than caching.
#[async_trait]
pub trait ConfigStore: Send + Sync {
    /// Current configuration.
    async fn get(&self) -> AppConfig;

    /// Replaces and persists the configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration cannot be persisted.
    async fn set(&self, config: AppConfig) -> Result<(), StoreError>;
}

// ============================================================================
// File Implementation
// ============================================================================

/// Configuration persisted as pretty JSON.
#[derive(Debug)]
pub struct FileConfigStore {
    config: RwLock<AppConfig>,
    path: PathBuf,
}

impl FileConfigStore {
    /// Loads the store from the default location.
    pub async fn load_default() -> Self {
        Self::load(default_config_path()).await
    }

    /// Loads the store from `path`; missing or unreadable files yield defaults.
    pub async fn load(path: PathBuf) -> Self {
        let config = load_json_or_default(&path).await;
        debug!(path = %path.display(), ?config, "Loaded configuration");
        Self {
            config: RwLock::new(config),
            path,
        }
    }

    /// Location of the configuration file.
    pub fn path(&self) -> &Path {
        &self.path
    }
}

#[async_trait]
impl ConfigStore for FileConfigStore {
    async fn get(&self) -> AppConfig {
        self.config.read().await.clone()
    }

    async fn set(&self, config: AppConfig) -> Result<(), StoreError> {
        let mut current = self.config.write().await;
        save_json(&self.path, &config).await?;
        *current = config;
        info!(path = %self.path.display(), "Configuration saved");
        Ok(())
    }
}

// ============================================================================
// In-Memory Implementation
// ============================================================================

/// Configuration held in memory only.
#[derive(Debug, Default)]
pub struct MemoryConfigStore {
    config: RwLock<AppConfig>,
}

impl MemoryConfigStore {
    /// Creates a store holding `config`.
    pub fn new(config: AppConfig) -> Self {
        Self {
            config: RwLock::new(config),
        }
    }
}

#[async_trait]
impl ConfigStore for MemoryConfigStore {
    async fn get(&self) -> AppConfig {
        self.config.read().await.clone()
    }

    async fn set(&self, config: AppConfig) -> Result<(), StoreError> {
        *self.config.write().await = config;
        Ok(())
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_defaults() {
        let config = AppConfig::default();
        assert_eq!(config.username, "");
        assert_eq!(config.included_allowance, 300);
        assert_eq!(config.refresh_interval_minutes, 15);
        assert!(!config.has_username());
        assert_eq!(config.poll_interval(), Some(Duration::from_secs(900)));
    }

    #[test]
    fn test_zero_interval_is_manual() {
        assert_eq!(interval_from_minutes(0), None);
        assert_eq!(interval_from_minutes(5), Some(Duration::from_secs(300)));
    }

    #[test]
    fn test_partial_file_fills_defaults() {
        let config: AppConfig = serde_json::from_str(r#"{"username": "octocat"}"#).unwrap();
        assert_eq!(config.username, "octocat");
        assert_eq!(config.included_allowance, 300);
        assert_eq!(config.refresh_interval_minutes, 15);
    }

    #[tokio::test]
    async fn test_file_store_persists() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.json");

        let store = FileConfigStore::load(path.clone()).await;
        assert_eq!(store.get().await, AppConfig::default());

        let config = AppConfig {
            username: "octocat".to_string(),
            included_allowance: 1500,
            refresh_interval_minutes: 5,
        };
        store.set(config.clone()).await.unwrap();

        let reloaded = FileConfigStore::load(path).await;
        assert_eq!(reloaded.get().await, config);
    }

    #[tokio::test]
    async fn test_corrupt_file_uses_defaults() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.json");
        tokio::fs::write(&path, "not json").await.unwrap();

        let store = FileConfigStore::load(path).await;
        assert_eq!(store.get().await, AppConfig::default());
    }
}
