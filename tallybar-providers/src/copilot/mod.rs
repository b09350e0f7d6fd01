//! GitHub Copilot provider implementation.
//!
//! Reads the premium request usage of a personal account from the GitHub
//! billing API with a fine-grained token that has the "Plan (read)"
//! permission.
//!
//! ## API Endpoints
//!
//! - `GET /users/{username}/settings/billing/premium_request/usage?year=Y&month=M`

mod api;
mod error;
mod parser;
mod provider;

// Re-exports
pub use api::{
    GITHUB_API_BASE, GITHUB_API_HOST, GitHubUsageItem, GitHubUsageResponse, request_headers,
    usage_url,
};
pub use error::CopilotError;
pub use parser::parse_usage_response;
pub use provider::{COPILOT_DISPLAY_NAME, COPILOT_PROVIDER_ID, CopilotProvider};
