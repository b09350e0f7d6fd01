//! GitHub billing API wire types and request construction.
//!
//! Endpoint:
//! `GET /users/{username}/settings/billing/premium_request/usage?year=Y&month=M`

use reqwest::header::{ACCEPT, HeaderMap, HeaderValue};
use serde::{Deserialize, Deserializer};
use tallybar_core::{Period, RawUsageItem};
use url::Url;

use super::error::CopilotError;

// ============================================================================
// Constants
// ============================================================================

/// GitHub API base URL.
pub const GITHUB_API_BASE: &str = "https://api.github.com";

/// Host the production client is restricted to.
pub const GITHUB_API_HOST: &str = "api.github.com";

/// GitHub API version header.
const GITHUB_API_VERSION: &str = "2022-11-28";

/// Media type GitHub recommends for REST calls.
const GITHUB_JSON: &str = "application/vnd.github+json";

// ============================================================================
// API Response Types
// ============================================================================

/// Response from the premium request usage API.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GitHubUsageResponse {
    /// Billing lines for the requested month.
    #[serde(default, deserialize_with = "null_as_default")]
    pub usage_items: Vec<GitHubUsageItem>,
}

/// One billing line. Every field is optional on the wire.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GitHubUsageItem {
    /// Day the usage was recorded (`YYYY-MM-DD`).
    #[serde(default)]
    pub date: Option<String>,
    /// Product name, e.g. "Copilot".
    #[serde(default)]
    pub product: Option<String>,
    /// Billing SKU.
    #[serde(default)]
    pub sku: Option<String>,
    /// Model that served the requests.
    #[serde(default)]
    pub model: Option<String>,
    /// Total requests.
    #[serde(default, deserialize_with = "null_as_default")]
    pub gross_quantity: f64,
    /// Requests covered by the plan.
    #[serde(default, deserialize_with = "null_as_default")]
    pub discount_quantity: f64,
    /// Requests billed.
    #[serde(default, deserialize_with = "null_as_default")]
    pub net_quantity: f64,
    /// Gross cost in USD.
    #[serde(default, deserialize_with = "null_as_default")]
    pub gross_amount: f64,
    /// Discount in USD.
    #[serde(default, deserialize_with = "null_as_default")]
    pub discount_amount: f64,
    /// Billed cost in USD.
    #[serde(default, deserialize_with = "null_as_default")]
    pub net_amount: f64,
    /// Unit, e.g. "requests".
    #[serde(default)]
    pub unit_type: Option<String>,
    /// Price per unit in USD.
    #[serde(default, deserialize_with = "null_as_default")]
    pub price_per_unit: f64,
}

impl From<GitHubUsageItem> for RawUsageItem {
    fn from(item: GitHubUsageItem) -> Self {
        RawUsageItem {
            model: item.model,
            gross_quantity: item.gross_quantity,
            discount_quantity: item.discount_quantity,
            net_quantity: item.net_quantity,
            net_amount: item.net_amount,
        }
    }
}

/// Treats an explicit JSON `null` the same as a missing field.
fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

// ============================================================================
// Request Construction
// ============================================================================

/// Builds the usage URL for `username` and `period` under `base`.
///
/// The username is percent-encoded as a single path segment.
pub fn usage_url(base: &Url, username: &str, period: Period) -> Result<Url, CopilotError> {
    let mut url = base.clone();
    url.path_segments_mut()
        .map_err(|()| CopilotError::InvalidUrl(format!("{base} cannot be a base")))?
        .pop_if_empty()
        .extend([
            "users",
            username,
            "settings",
            "billing",
            "premium_request",
            "usage",
        ]);
    url.query_pairs_mut()
        .clear()
        .append_pair("year", &period.year().to_string())
        .append_pair("month", &period.month().to_string());
    Ok(url)
}

/// Headers sent with every billing request (authorization is added by the client).
pub fn request_headers() -> HeaderMap {
    let mut headers = HeaderMap::new();
    headers.insert(ACCEPT, HeaderValue::from_static(GITHUB_JSON));
    headers.insert(
        "X-GitHub-Api-Version",
        HeaderValue::from_static(GITHUB_API_VERSION),
    );
    headers
}
