//! Fetch error types.

use thiserror::Error;

// ============================================================================
// HTTP Error
// ============================================================================

/// HTTP-specific error type.
///
/// Every variant is a transport failure from the caller's point of view;
/// HTTP status codes are not errors at this layer.
#[derive(Debug, Error)]
pub enum HttpError {
    /// Request error.
    #[error("Request error: {0}")]
    Request(reqwest::Error),

    /// Timeout.
    #[error("Request timed out after {0} seconds")]
    Timeout(u64),

    /// Could not reach the host.
    #[error("Connection failed: {0}")]
    Connect(String),

    /// Domain not allowed.
    #[error("Domain not allowed: {0}")]
    DomainNotAllowed(String),

    /// Invalid URL.
    #[error("Invalid URL: {0}")]
    InvalidUrl(String),

    /// Header value rejected before sending.
    #[error("Invalid header value: {0}")]
    InvalidHeader(String),

    /// The client could not be constructed.
    #[error("Failed to build HTTP client: {0}")]
    Build(String),
}

impl HttpError {
    /// Classifies a reqwest error, attributing timeouts to `timeout_secs`.
    pub fn from_reqwest(err: reqwest::Error, timeout_secs: u64) -> Self {
        if err.is_timeout() {
            HttpError::Timeout(timeout_secs)
        } else if err.is_connect() {
            HttpError::Connect(err.to_string())
        } else {
            HttpError::Request(err)
        }
    }
}

// ============================================================================
// Keychain Error
// ============================================================================

/// Error type for keychain operations.
#[derive(Debug, Error)]
pub enum KeychainError {
    /// Access denied.
    #[error("Access denied to keychain")]
    AccessDenied,

    /// Keychain unavailable.
    #[error("Keychain unavailable: {0}")]
    Unavailable(String),

    /// Platform error.
    #[error("Platform error: {0}")]
    Platform(String),

    /// Generic error.
    #[error("Keychain error: {0}")]
    Other(String),
}

impl From<keyring::Error> for KeychainError {
    fn from(err: keyring::Error) -> Self {
        match err {
            keyring::Error::Ambiguous(_) => {
                KeychainError::Other("Ambiguous credential entry".to_string())
            }
            keyring::Error::PlatformFailure(e) => KeychainError::Platform(e.to_string()),
            keyring::Error::NoStorageAccess(_) => KeychainError::AccessDenied,
            _ => KeychainError::Other(err.to_string()),
        }
    }
}
