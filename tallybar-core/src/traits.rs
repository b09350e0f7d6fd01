//! Trait definitions for TallyBar.
//!
//! This module defines the contract every usage backend implements.

use std::fmt;

use async_trait::async_trait;

use crate::error::CoreError;
use crate::models::{Period, RawUsageItem};

/// Identity and secret used to query a provider.
#[derive(Clone, PartialEq, Eq)]
pub struct Credentials {
    /// Account login the usage belongs to.
    pub username: String,
    /// Bearer token.
    pub token: String,
}

impl Credentials {
    /// Creates credentials from a username and token.
    pub fn new(username: impl Into<String>, token: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            token: token.into(),
        }
    }

    /// Returns credentials only if both parts are non-blank.
    pub fn complete(username: &str, token: Option<&str>) -> Option<Self> {
        let username = username.trim();
        let token = token.map(str::trim).filter(|t| !t.is_empty())?;
        if username.is_empty() {
            return None;
        }
        Some(Self::new(username, token))
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("username", &self.username)
            .field("token", &"<redacted>")
            .finish()
    }
}

/// A backend that reports raw billing lines for a period.
///
/// Implementors must not retry internally and must map failures onto the
/// boundary variants of [`CoreError`]:
/// - `Unauthorized` for authentication/permission failures
/// - `InvalidResponse(status)` for any other non-success status
/// - `Network(detail)` for transport failures, timeouts included
/// - `Decode(detail)` for bodies that do not parse
#[async_trait]
pub trait UsageProvider: Send + Sync {
    /// Stable identifier, stored in every snapshot.
    fn id(&self) -> &str;

    /// Human-readable name.
    fn display_name(&self) -> &str;

    /// Fetches the billing lines for `period`.
    async fn fetch_raw(
        &self,
        period: Period,
        credentials: &Credentials,
    ) -> Result<Vec<RawUsageItem>, CoreError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_debug_redacts_token() {
        let creds = Credentials::new("octocat", "ghp_secret");
        let debug = format!("{creds:?}");
        assert!(debug.contains("octocat"));
        assert!(!debug.contains("ghp_secret"));
    }

    #[test]
    fn test_complete_requires_both_parts() {
        assert!(Credentials::complete("octocat", Some("t")).is_some());
        assert!(Credentials::complete("", Some("t")).is_none());
        assert!(Credentials::complete("  ", Some("t")).is_none());
        assert!(Credentials::complete("octocat", None).is_none());
        assert!(Credentials::complete("octocat", Some("  ")).is_none());
    }

    #[test]
    fn test_complete_trims() {
        let creds = Credentials::complete(" octocat ", Some(" t ")).unwrap();
        assert_eq!(creds.username, "octocat");
        assert_eq!(creds.token, "t");
    }
}
