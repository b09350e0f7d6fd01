//! HTTP client with tracing, timeout, and domain allowlist.
//!
//! This module provides a wrapped HTTP client that adds:
//! - Request/response tracing
//! - Domain allowlist for security
//! - A fixed per-request timeout
//!
//! The client never retries. A non-success status is returned to the caller
//! as a normal [`HttpResponse`]; only transport failures are errors.

use std::time::Duration;

use reqwest::header::{AUTHORIZATION, HeaderMap, HeaderValue};
use reqwest::Client;
use tracing::{debug, instrument};
use url::Url;

use crate::error::HttpError;

/// Default request timeout.
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// User agent string for TallyBar.
const USER_AGENT: &str = concat!("TallyBar/", env!("CARGO_PKG_VERSION"));

// ============================================================================
// Response
// ============================================================================

/// A fully-read HTTP response.
#[derive(Debug, Clone)]
pub struct HttpResponse {
    /// Status code.
    pub status: u16,
    /// Body as text.
    pub body: String,
}

impl HttpResponse {
    /// Returns true for 2xx statuses.
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

// ============================================================================
// HTTP Client
// ============================================================================

/// HTTP client wrapper with tracing, timeout, and domain allowlist.
#[derive(Debug, Clone)]
pub struct HttpClient {
    inner: Client,
    timeout_secs: u64,
    allowed_domains: Option<Vec<String>>,
}

impl HttpClient {
    /// Creates a new HTTP client with default settings.
    ///
    /// # Errors
    ///
    /// Returns `HttpError::Build` if the TLS backend cannot be initialized.
    pub fn new() -> Result<Self, HttpError> {
        Self::with_timeout(Duration::from_secs(DEFAULT_TIMEOUT_SECS))
    }

    /// Creates a new HTTP client with a custom timeout.
    ///
    /// # Errors
    ///
    /// Returns `HttpError::Build` if the TLS backend cannot be initialized.
    pub fn with_timeout(timeout: Duration) -> Result<Self, HttpError> {
        let inner = Client::builder()
            .timeout(timeout)
            .user_agent(USER_AGENT)
            .build()
            .map_err(|e| HttpError::Build(e.to_string()))?;

        Ok(Self {
            inner,
            timeout_secs: timeout.as_secs(),
            allowed_domains: None,
        })
    }

    /// Restricts requests to the given domains and their subdomains.
    #[must_use]
    pub fn with_allowed_domains(mut self, domains: Vec<String>) -> Self {
        self.allowed_domains = Some(domains);
        self
    }

    /// Checks if a URL's domain is allowed.
    fn is_domain_allowed(&self, url: &Url) -> Result<(), HttpError> {
        let Some(ref allowed) = self.allowed_domains else {
            return Ok(()); // No restrictions
        };

        let host = url
            .host_str()
            .ok_or_else(|| HttpError::InvalidUrl("No host in URL".to_string()))?;

        let allowed = allowed
            .iter()
            .any(|domain| host == domain || host.ends_with(&format!(".{domain}")));

        if allowed {
            Ok(())
        } else {
            Err(HttpError::DomainNotAllowed(host.to_string()))
        }
    }

    /// Performs a GET request with a bearer token and extra headers, reading
    /// the whole body.
    ///
    /// # Errors
    ///
    /// Returns an `HttpError` for transport failures only; any status code,
    /// including 4xx/5xx, is returned as `Ok`.
    #[instrument(skip(self, token, headers), fields(url = %url))]
    pub async fn get_with_bearer(
        &self,
        url: &Url,
        token: &str,
        mut headers: HeaderMap,
    ) -> Result<HttpResponse, HttpError> {
        self.is_domain_allowed(url)?;

        let auth = HeaderValue::from_str(&format!("Bearer {token}"))
            .map_err(|e| HttpError::InvalidHeader(e.to_string()))?;
        headers.insert(AUTHORIZATION, auth);

        debug!("GET request with auth");

        let response = self
            .inner
            .get(url.clone())
            .headers(headers)
            .send()
            .await
            .map_err(|e| HttpError::from_reqwest(e, self.timeout_secs))?;

        let status = response.status().as_u16();
        debug!(status, "Response received");

        let body = response
            .text()
            .await
            .map_err(|e| HttpError::from_reqwest(e, self.timeout_secs))?;

        Ok(HttpResponse { status, body })
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[test]
    fn test_domain_allowlist() {
        let client = HttpClient::new()
            .unwrap()
            .with_allowed_domains(vec!["github.com".to_string()]);

        let api = Url::parse("https://api.github.com/users/x").unwrap();
        let exact = Url::parse("https://github.com/").unwrap();
        let other = Url::parse("https://evil-github.com/").unwrap();

        assert!(client.is_domain_allowed(&api).is_ok());
        assert!(client.is_domain_allowed(&exact).is_ok());
        assert!(matches!(
            client.is_domain_allowed(&other),
            Err(HttpError::DomainNotAllowed(_))
        ));
    }

    #[test]
    fn test_response_success_range() {
        let ok = HttpResponse { status: 204, body: String::new() };
        let moved = HttpResponse { status: 301, body: String::new() };
        assert!(ok.is_success());
        assert!(!moved.is_success());
    }

    #[tokio::test]
    async fn test_get_with_bearer_sends_token() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/usage"))
            .and(header("authorization", "Bearer t0ken"))
            .and(header("x-extra", "1"))
            .respond_with(ResponseTemplate::new(200).set_body_string("{}"))
            .expect(1)
            .mount(&server)
            .await;

        let client = HttpClient::new().unwrap();
        let url = Url::parse(&format!("{}/usage", server.uri())).unwrap();
        let mut headers = HeaderMap::new();
        headers.insert("x-extra", HeaderValue::from_static("1"));

        let response = client.get_with_bearer(&url, "t0ken", headers).await.unwrap();
        assert_eq!(response.status, 200);
        assert_eq!(response.body, "{}");
    }

    #[tokio::test]
    async fn test_error_status_is_not_an_error() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(503).set_body_string("down"))
            .mount(&server)
            .await;

        let client = HttpClient::new().unwrap();
        let url = Url::parse(&server.uri()).unwrap();
        let response = client
            .get_with_bearer(&url, "t", HeaderMap::new())
            .await
            .unwrap();

        assert_eq!(response.status, 503);
        assert!(!response.is_success());
    }

    #[tokio::test]
    async fn test_timeout_is_classified() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_delay(Duration::from_secs(5)))
            .mount(&server)
            .await;

        let client = HttpClient::with_timeout(Duration::from_millis(200)).unwrap();
        let url = Url::parse(&server.uri()).unwrap();
        let result = client.get_with_bearer(&url, "t", HeaderMap::new()).await;

        assert!(matches!(result, Err(HttpError::Timeout(_))));
    }
}
