//! File persistence helpers.
//!
//! Handles loading and saving state to disk with proper security.

use serde::{Serialize, de::DeserializeOwned};
use std::io::Write;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

use crate::error::StoreError;

/// File name of the application configuration.
pub const CONFIG_FILE_NAME: &str = "config.json";

/// File name of the last good snapshot.
pub const SNAPSHOT_FILE_NAME: &str = "last_snapshot.json";

// ============================================================================
// Default Paths
// ============================================================================

/// Returns the default configuration directory.
///
/// - macOS: `~/Library/Application Support/TallyBar`
/// - Linux: `~/.config/tallybar`
/// - Windows: `%APPDATA%\tallybar`
pub fn default_config_dir() -> PathBuf {
    #[cfg(target_os = "macos")]
    {
        dirs::home_dir()
            .map(|h| h.join("Library").join("Application Support").join("TallyBar"))
            .unwrap_or_else(|| PathBuf::from("."))
    }

    #[cfg(not(target_os = "macos"))]
    {
        dirs::config_dir()
            .map(|c| c.join("tallybar"))
            .unwrap_or_else(|| PathBuf::from("."))
    }
}

/// Returns the default data directory, where the snapshot cache lives.
///
/// - macOS: `~/Library/Application Support/TallyBar`
/// - Linux: `~/.local/share/tallybar`
/// - Windows: `%APPDATA%\tallybar`
pub fn default_data_dir() -> PathBuf {
    #[cfg(target_os = "macos")]
    {
        default_config_dir()
    }

    #[cfg(not(target_os = "macos"))]
    {
        dirs::data_dir()
            .map(|c| c.join("tallybar"))
            .unwrap_or_else(|| PathBuf::from("."))
    }
}

/// Returns the default configuration file path.
pub fn default_config_path() -> PathBuf {
    default_config_dir().join(CONFIG_FILE_NAME)
}

/// Returns the default snapshot cache file path.
pub fn default_snapshot_path() -> PathBuf {
    default_data_dir().join(SNAPSHOT_FILE_NAME)
}

// ============================================================================
// Security: File Permissions
// ============================================================================

/// Sets restrictive file permissions (0o600) on Unix systems.
#[cfg(unix)]
async fn set_restrictive_permissions(path: &Path) -> Result<(), StoreError> {
    use std::os::unix::fs::PermissionsExt;

    let metadata = tokio::fs::metadata(path).await?;
    let mut perms = metadata.permissions();
    perms.set_mode(0o600); // Owner read/write only
    tokio::fs::set_permissions(path, perms).await?;

    debug!(path = %path.display(), mode = "0600", "Set restrictive permissions");
    Ok(())
}

/// Sets restrictive directory permissions (0o700) on Unix systems.
#[cfg(unix)]
async fn set_restrictive_dir_permissions(path: &Path) -> Result<(), StoreError> {
    use std::os::unix::fs::PermissionsExt;

    let metadata = tokio::fs::metadata(path).await?;
    let mut perms = metadata.permissions();
    perms.set_mode(0o700); // Owner read/write/execute only
    tokio::fs::set_permissions(path, perms).await?;

    debug!(path = %path.display(), mode = "0700", "Set restrictive directory permissions");
    Ok(())
}

/// No-op for non-Unix systems.
#[cfg(not(unix))]
async fn set_restrictive_permissions(_path: &Path) -> Result<(), StoreError> {
    Ok(())
}

/// No-op for non-Unix systems.
#[cfg(not(unix))]
async fn set_restrictive_dir_permissions(_path: &Path) -> Result<(), StoreError> {
    Ok(())
}

// ============================================================================
// File Operations
// ============================================================================

/// Saves data to a JSON file with secure permissions.
///
/// Creates the parent directory if it doesn't exist, writes atomically
/// (via a uniquely named temp file in the same directory + rename), and sets
/// restrictive permissions on Unix. Readers never observe a partially written
/// file, and concurrent writers never share a temp file.
pub async fn save_json<T: Serialize>(path: &Path, data: &T) -> Result<(), StoreError> {
    debug!(path = %path.display(), "Saving JSON file");

    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
        _ => PathBuf::from("."),
    };
    ensure_dir(&dir).await?;

    // Serialize to pretty JSON
    let json = serde_json::to_string_pretty(data)?;

    let target = path.to_path_buf();
    tokio::task::spawn_blocking(move || write_atomic(&dir, &target, json.as_bytes()))
        .await
        .map_err(|e| StoreError::Io(std::io::Error::other(e)))??;
    set_restrictive_permissions(path).await?;

    debug!(path = %path.display(), "JSON file saved securely");
    Ok(())
}

/// Writes `bytes` to a fresh temp file in `dir`, then renames it over `target`.
///
/// The temp file is removed on any failure before the rename.
fn write_atomic(dir: &Path, target: &Path, bytes: &[u8]) -> Result<(), StoreError> {
    let mut file = tempfile::Builder::new()
        .prefix(".tallybar-")
        .suffix(".tmp")
        .tempfile_in(dir)?;
    file.write_all(bytes)?;
    file.as_file().sync_all()?;
    file.persist(target).map_err(|e| StoreError::Io(e.error))?;
    Ok(())
}

/// Loads data from a JSON file.
pub async fn load_json<T: DeserializeOwned>(path: &Path) -> Result<T, StoreError> {
    debug!(path = %path.display(), "Loading JSON file");

    let content = tokio::fs::read_to_string(path).await?;
    let data = serde_json::from_str(&content)?;

    debug!(path = %path.display(), "JSON file loaded");
    Ok(data)
}

/// Loads data from a JSON file, returning default if missing or unreadable.
///
/// A missing file is silent; anything else is logged at `warn`.
pub async fn load_json_or_default<T: DeserializeOwned + Default>(path: &Path) -> T {
    match load_json(path).await {
        Ok(data) => data,
        Err(e) => {
            if !e.is_not_found() {
                warn!(path = %path.display(), error = %e, "Failed to load, using defaults");
            }
            T::default()
        }
    }
}

/// Removes a file, treating "already gone" as success.
pub async fn remove_file_if_exists(path: &Path) -> Result<bool, StoreError> {
    match tokio::fs::remove_file(path).await {
        Ok(()) => {
            debug!(path = %path.display(), "Removed file");
            Ok(true)
        }
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(false),
        Err(e) => Err(e.into()),
    }
}

/// Ensures a directory exists with secure permissions.
pub async fn ensure_dir(path: &Path) -> Result<(), StoreError> {
    if !tokio::fs::try_exists(path).await.unwrap_or(false) {
        debug!(path = %path.display(), "Creating directory");
        tokio::fs::create_dir_all(path).await?;
        set_restrictive_dir_permissions(path).await?;
    }
    Ok(())
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_dir() {
        let path = default_config_dir();
        assert!(!path.as_os_str().is_empty());
    }

    #[test]
    fn test_default_paths() {
        assert!(default_config_path().ends_with("config.json"));
        assert!(default_snapshot_path().ends_with("last_snapshot.json"));
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_file_permissions() {
        use std::os::unix::fs::PermissionsExt;

        let temp_dir = tempfile::tempdir().unwrap();
        let test_file = temp_dir.path().join("test.json");

        tokio::fs::write(&test_file, "{}").await.unwrap();
        set_restrictive_permissions(&test_file).await.unwrap();

        let metadata = tokio::fs::metadata(&test_file).await.unwrap();
        let mode = metadata.permissions().mode() & 0o777;
        assert_eq!(mode, 0o600, "File should have 0600 permissions");
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_saved_file_is_private() {
        use std::os::unix::fs::PermissionsExt;

        let temp_dir = tempfile::tempdir().unwrap();
        let path = temp_dir.path().join("nested").join("data.json");
        save_json(&path, &serde_json::json!({"a": 1})).await.unwrap();

        let file_mode = std::fs::metadata(&path).unwrap().permissions().mode() & 0o777;
        let dir_mode = std::fs::metadata(path.parent().unwrap())
            .unwrap()
            .permissions()
            .mode()
            & 0o777;
        assert_eq!(file_mode, 0o600);
        assert_eq!(dir_mode, 0o700);
    }
}
