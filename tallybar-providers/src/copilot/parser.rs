//! Copilot response parser.

use tallybar_core::RawUsageItem;
use tracing::{debug, warn};

use super::api::GitHubUsageResponse;
use super::error::CopilotError;

/// Classifies a billing response and decodes its line items.
///
/// - 200: body is decoded
/// - 401, 403: [`CopilotError::AuthenticationFailed`]
/// - anything else: [`CopilotError::InvalidResponse`]
pub fn parse_usage_response(status: u16, body: &str) -> Result<Vec<RawUsageItem>, CopilotError> {
    match status {
        200 => {}
        401 | 403 => return Err(CopilotError::AuthenticationFailed(status)),
        _ => return Err(CopilotError::InvalidResponse(status)),
    }

    debug!(len = body.len(), "Parsing Copilot usage response");

    let response: GitHubUsageResponse = serde_json::from_str(body).map_err(|e| {
        warn!(error = %e, "Failed to parse usage response");
        CopilotError::Decode(e.to_string())
    })?;

    debug!(items = response.usage_items.len(), "Parsed usage items");

    Ok(response
        .usage_items
        .into_iter()
        .map(RawUsageItem::from)
        .collect())
}
