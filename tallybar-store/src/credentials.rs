//! Bearer token access through the secret store.
//!
//! Tokens are only ever read from and written to a [`SecretStore`]; they
//! never touch the configuration file or the snapshot cache.

use tallybar_core::Credentials;
use tallybar_fetch::SecretStore;
use tracing::{debug, warn};

use crate::config_store::AppConfig;
use crate::error::StoreError;

/// Secret store key of the GitHub token.
pub const GITHUB_TOKEN_KEY: &str = "github-token";

/// Reads the token; storage failures are logged and read as "no token".
pub async fn load_token(secrets: &dyn SecretStore) -> Option<String> {
    match secrets.get(GITHUB_TOKEN_KEY).await {
        Ok(token) => token.filter(|t| !t.trim().is_empty()),
        Err(e) => {
            warn!(error = %e, "Failed to read token from secret store");
            None
        }
    }
}

/// Stores a token. Blank input is rejected.
///
/// # Errors
///
/// Returns `StoreError::Config` for a blank token, or the secret store error.
pub async fn store_token(secrets: &dyn SecretStore, token: &str) -> Result<(), StoreError> {
    let token = token.trim();
    if token.is_empty() {
        return Err(StoreError::Config("token must not be empty".to_string()));
    }
    secrets.set(GITHUB_TOKEN_KEY, token).await?;
    debug!("Token stored");
    Ok(())
}

/// Deletes the token. Deleting a missing token succeeds.
///
/// # Errors
///
/// Returns the secret store error.
pub async fn delete_token(secrets: &dyn SecretStore) -> Result<(), StoreError> {
    secrets.delete(GITHUB_TOKEN_KEY).await?;
    debug!("Token deleted");
    Ok(())
}

/// Resolves complete credentials from configuration and the secret store.
pub async fn resolve(config: &AppConfig, secrets: &dyn SecretStore) -> Option<Credentials> {
    let token = load_token(secrets).await;
    Credentials::complete(&config.username, token.as_deref())
}
