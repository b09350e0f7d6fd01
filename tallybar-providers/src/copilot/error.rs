//! Copilot-specific errors.

use tallybar_core::CoreError;
use tallybar_fetch::HttpError;
use thiserror::Error;

/// Copilot-specific errors.
#[derive(Debug, Error)]
pub enum CopilotError {
    /// Token rejected (401) or lacking permission (403).
    #[error("Authentication failed with status {0}")]
    AuthenticationFailed(u16),

    /// Any other non-200 status.
    #[error("GitHub API returned status {0}")]
    InvalidResponse(u16),

    /// HTTP request failed before a status was received.
    #[error("HTTP request failed: {0}")]
    HttpError(String),

    /// Body was not the expected JSON.
    #[error("Failed to parse GitHub response: {0}")]
    Decode(String),

    /// Endpoint URL could not be built.
    #[error("Invalid URL: {0}")]
    InvalidUrl(String),
}

impl From<HttpError> for CopilotError {
    fn from(err: HttpError) -> Self {
        CopilotError::HttpError(err.to_string())
    }
}

impl From<CopilotError> for CoreError {
    fn from(err: CopilotError) -> Self {
        match err {
            CopilotError::AuthenticationFailed(_) => CoreError::Unauthorized,
            CopilotError::InvalidResponse(status) => CoreError::InvalidResponse(status),
            CopilotError::HttpError(detail) | CopilotError::InvalidUrl(detail) => {
                CoreError::Network(detail)
            }
            CopilotError::Decode(detail) => CoreError::Decode(detail),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tallybar_core::ErrorKind;

    #[test]
    fn test_maps_to_core_kinds() {
        let cases = [
            (CopilotError::AuthenticationFailed(401), ErrorKind::Unauthorized),
            (CopilotError::AuthenticationFailed(403), ErrorKind::Unauthorized),
            (CopilotError::InvalidResponse(500), ErrorKind::InvalidResponse(500)),
            (CopilotError::HttpError("reset".into()), ErrorKind::Network),
            (CopilotError::InvalidUrl("bad".into()), ErrorKind::Network),
            (CopilotError::Decode("eof".into()), ErrorKind::Decode),
        ];

        for (err, kind) in cases {
            assert_eq!(CoreError::from(err).kind(), kind);
        }
    }

    #[test]
    fn test_timeout_becomes_network() {
        let core = CoreError::from(CopilotError::from(HttpError::Timeout(30)));
        assert_eq!(core.kind(), ErrorKind::Network);
        assert!(core.to_string().contains("30 seconds"));
    }
}
