//! Copilot usage provider.

use async_trait::async_trait;
use tallybar_core::{CoreError, Credentials, Period, RawUsageItem, UsageProvider};
use tallybar_fetch::HttpClient;
use tracing::{debug, instrument};
use url::Url;

use super::api::{GITHUB_API_BASE, GITHUB_API_HOST, request_headers, usage_url};
use super::error::CopilotError;
use super::parser::parse_usage_response;

/// Stable provider id stored in snapshots.
pub const COPILOT_PROVIDER_ID: &str = "github-copilot";

/// Human-readable provider name.
pub const COPILOT_DISPLAY_NAME: &str = "GitHub Copilot";

/// Fetches premium request usage for a personal GitHub account.
///
/// One request per fetch; no retries.
#[derive(Debug, Clone)]
pub struct CopilotProvider {
    http: HttpClient,
    base_url: Url,
}

impl CopilotProvider {
    /// Creates a provider talking to `api.github.com`.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be built.
    pub fn new() -> Result<Self, CopilotError> {
        let http = HttpClient::new()?.with_allowed_domains(vec![GITHUB_API_HOST.to_string()]);
        let base_url =
            Url::parse(GITHUB_API_BASE).map_err(|e| CopilotError::InvalidUrl(e.to_string()))?;
        Ok(Self::with_client(http, base_url))
    }

    /// Creates a provider with an explicit client and API root.
    pub fn with_client(http: HttpClient, base_url: Url) -> Self {
        Self { http, base_url }
    }

    /// API root requests are built from.
    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    async fn fetch_items(
        &self,
        period: Period,
        credentials: &Credentials,
    ) -> Result<Vec<RawUsageItem>, CopilotError> {
        let url = usage_url(&self.base_url, &credentials.username, period)?;
        let response = self
            .http
            .get_with_bearer(&url, &credentials.token, request_headers())
            .await?;
        parse_usage_response(response.status, &response.body)
    }
}

#[async_trait]
impl UsageProvider for CopilotProvider {
    fn id(&self) -> &str {
        COPILOT_PROVIDER_ID
    }

    fn display_name(&self) -> &str {
        COPILOT_DISPLAY_NAME
    }

    #[instrument(skip(self, credentials), fields(period = %period))]
    async fn fetch_raw(
        &self,
        period: Period,
        credentials: &Credentials,
    ) -> Result<Vec<RawUsageItem>, CoreError> {
        debug!("Fetching Copilot premium request usage");
        let items = self.fetch_items(period, credentials).await?;
        debug!(items = items.len(), "Copilot usage fetched");
        Ok(items)
    }
}
