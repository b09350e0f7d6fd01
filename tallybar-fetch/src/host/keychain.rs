//! Secure credential storage using the system keychain.
//!
//! This module provides access to the system's secure credential storage:
//! - macOS: Keychain Services
//! - Windows: Credential Manager
//! - Linux: Secret Service (GNOME Keyring, KDE Wallet)
//!
//! ## Caching
//!
//! Reading from the keychain can trigger a password prompt, so
//! [`SystemKeychain`] keeps an in-process cache of every lookup (including
//! "not found"). Writes and deletes go through to the keychain and update the
//! cache in place.

use std::collections::HashMap;
use std::sync::{Mutex, PoisonError};

use async_trait::async_trait;
use keyring::Entry;
use tracing::{debug, trace, warn};

use crate::error::KeychainError;

/// Service name under which all TallyBar secrets are stored.
pub const SERVICE_NAME: &str = "tallybar";

// ============================================================================
// Secret Store Trait
// ============================================================================

/// Keyed storage for secrets such as bearer tokens.
///
/// Implementations must treat a missing entry as `Ok(None)` on read and as
/// success on delete.
#[async_trait]
pub trait SecretStore: Send + Sync {
    /// Reads a secret.
    ///
    /// # Returns
    /// * `Ok(Some(secret))` - Secret found
    /// * `Ok(None)` - No secret stored under `key`
    /// * `Err(e)` - The backing store could not be read
    async fn get(&self, key: &str) -> Result<Option<String>, KeychainError>;

    /// Stores a secret, replacing any previous value.
    async fn set(&self, key: &str, value: &str) -> Result<(), KeychainError>;

    /// Removes a secret. Deleting a missing key succeeds.
    async fn delete(&self, key: &str) -> Result<(), KeychainError>;

    /// Check if a secret exists.
    async fn exists(&self, key: &str) -> bool {
        matches!(self.get(key).await, Ok(Some(_)))
    }
}

// ============================================================================
// System Keychain Implementation
// ============================================================================

/// Secret store backed by the platform keychain via the `keyring` crate.
#[derive(Debug, Default)]
pub struct SystemKeychain {
    service: String,
    cache: Mutex<HashMap<String, Option<String>>>,
}

impl SystemKeychain {
    /// Creates a keychain store using the default service name.
    pub fn new() -> Self {
        Self::with_service(SERVICE_NAME)
    }

    /// Creates a keychain store under a custom service name.
    pub fn with_service(service: impl Into<String>) -> Self {
        Self {
            service: service.into(),
            cache: Mutex::new(HashMap::new()),
        }
    }

    /// Service name used for entries.
    pub fn service(&self) -> &str {
        &self.service
    }

    fn entry(&self, key: &str) -> Result<Entry, KeychainError> {
        Entry::new(&self.service, key).map_err(|e| KeychainError::Platform(e.to_string()))
    }

    fn cached(&self, key: &str) -> Option<Option<String>> {
        self.cache
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .get(key)
            .cloned()
    }

    fn remember(&self, key: &str, value: Option<String>) {
        self.cache
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(key.to_string(), value);
    }

    /// Drops every cached lookup so the next read hits the keychain.
    pub fn clear_cache(&self) {
        self.cache
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clear();
        debug!("Cleared keychain cache");
    }
}

#[async_trait]
impl SecretStore for SystemKeychain {
    async fn get(&self, key: &str) -> Result<Option<String>, KeychainError> {
        if let Some(cached) = self.cached(key) {
            trace!(key = %key, hit = true, "Keychain cache lookup");
            return Ok(cached);
        }

        trace!(key = %key, hit = false, "Keychain cache miss, reading from keychain");

        let entry = self.entry(key)?;
        let value = match entry.get_password() {
            // Empty password or no entry both mean "not found"
            Ok(secret) if !secret.is_empty() => Some(secret),
            Ok(_) | Err(keyring::Error::NoEntry) => None,
            Err(e) => {
                warn!(key = %key, error = %e, "Failed to get credential");
                return Err(e.into());
            }
        };

        debug!(key = %key, found = value.is_some(), "Keychain read");
        self.remember(key, value.clone());
        Ok(value)
    }

    async fn set(&self, key: &str, value: &str) -> Result<(), KeychainError> {
        debug!(key = %key, "Setting credential in keychain");

        let entry = self.entry(key)?;
        entry.set_password(value).map_err(|e| {
            warn!(key = %key, error = %e, "Failed to set credential");
            KeychainError::from(e)
        })?;

        self.remember(key, Some(value.to_string()));
        Ok(())
    }

    async fn delete(&self, key: &str) -> Result<(), KeychainError> {
        debug!(key = %key, "Deleting credential from keychain");

        let entry = self.entry(key)?;
        match entry.delete_credential() {
            Ok(()) | Err(keyring::Error::NoEntry) => {
                self.remember(key, None);
                Ok(())
            }
            Err(e) => {
                warn!(key = %key, error = %e, "Failed to delete credential");
                Err(e.into())
            }
        }
    }
}

// ============================================================================
// In-Memory Implementation
// ============================================================================

/// Secret store held entirely in memory. Nothing is persisted.
#[derive(Debug, Default)]
pub struct MemorySecretStore {
    secrets: Mutex<HashMap<String, String>>,
}

impl MemorySecretStore {
    /// Creates an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a store pre-populated with one secret.
    pub fn with_secret(key: impl Into<String>, value: impl Into<String>) -> Self {
        let store = Self::new();
        store
            .secrets
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(key.into(), value.into());
        store
    }
}

#[async_trait]
impl SecretStore for MemorySecretStore {
    async fn get(&self, key: &str) -> Result<Option<String>, KeychainError> {
        Ok(self
            .secrets
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .get(key)
            .cloned())
    }

    async fn set(&self, key: &str, value: &str) -> Result<(), KeychainError> {
        self.secrets
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(key.to_string(), value.to_string());
        Ok(())
    }

    async fn delete(&self, key: &str) -> Result<(), KeychainError> {
        self.secrets
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(key);
        Ok(())
    }
}

// ============================================================================
// Tests
// ============================================================================
