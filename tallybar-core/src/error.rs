//! Core error types for `TallyBar`.

use std::fmt;

use thiserror::Error;

/// Core error type for `TallyBar` operations.
///
/// The first five variants form the provider boundary: every
/// [`UsageProvider`](crate::UsageProvider) reports failures through them.
#[derive(Debug, Error)]
pub enum CoreError {
    /// Username or credential is missing.
    #[error("Not configured. Set your GitHub username and token first.")]
    NotConfigured,

    /// The backend rejected the credential.
    #[error("Unauthorized. Check that your token has 'Plan (read)' permission.")]
    Unauthorized,

    /// The backend answered with a non-success status.
    #[error("Provider returned status {0}")]
    InvalidResponse(u16),

    /// Transport failure, including timeouts.
    #[error("Network error: {0}")]
    Network(String),

    /// The response body could not be parsed.
    #[error("Failed to parse response: {0}")]
    Decode(String),

    /// A period outside the supported calendar range.
    #[error("Invalid period: {0}")]
    InvalidPeriod(String),
}

impl CoreError {
    /// Classifies this error for state reporting.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::NotConfigured => ErrorKind::NotConfigured,
            Self::Unauthorized => ErrorKind::Unauthorized,
            Self::InvalidResponse(status) => ErrorKind::InvalidResponse(*status),
            Self::Network(_) => ErrorKind::Network,
            Self::Decode(_) | Self::InvalidPeriod(_) => ErrorKind::Decode,
        }
    }
}

/// Coarse classification of a failed refresh.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// Username or credential missing; the network was not contacted.
    NotConfigured,
    /// Authentication or permission failure.
    Unauthorized,
    /// Non-success HTTP status.
    InvalidResponse(u16),
    /// Transport failure.
    Network,
    /// Undecodable response.
    Decode,
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NotConfigured => write!(f, "not_configured"),
            Self::Unauthorized => write!(f, "unauthorized"),
            Self::InvalidResponse(status) => write!(f, "invalid_response({status})"),
            Self::Network => write!(f, "network"),
            Self::Decode => write!(f, "decode"),
        }
    }
}
