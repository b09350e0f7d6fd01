//! HTTP-level tests for the Copilot provider against a mock GitHub API.

use std::time::Duration;

use tallybar_core::{CoreError, Credentials, ErrorKind, Period, UsageProvider};
use tallybar_fetch::HttpClient;
use tallybar_providers::CopilotProvider;
use url::Url;
use wiremock::matchers::{header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

const USAGE_PATH: &str = "/users/octocat/settings/billing/premium_request/usage";

fn provider_for(server: &MockServer) -> CopilotProvider {
    let base = Url::parse(&server.uri()).unwrap();
    CopilotProvider::with_client(HttpClient::new().unwrap(), base)
}

fn credentials() -> Credentials {
    Credentials::new("octocat", "github_pat_test")
}

fn june() -> Period {
    Period::new(2025, 6).unwrap()
}

async fn fetch_with_status(status: u16) -> Result<usize, CoreError> {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(USAGE_PATH))
        .respond_with(ResponseTemplate::new(status).set_body_string(r#"{"message":"nope"}"#))
        .mount(&server)
        .await;

    provider_for(&server)
        .fetch_raw(june(), &credentials())
        .await
        .map(|items| items.len())
}

#[tokio::test]
async fn test_fetch_sends_contract_request() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(USAGE_PATH))
        .and(query_param("year", "2025"))
        .and(query_param("month", "6"))
        .and(header("authorization", "Bearer github_pat_test"))
        .and(header("accept", "application/vnd.github+json"))
        .and(header("x-github-api-version", "2022-11-28"))
        .respond_with(ResponseTemplate::new(200).set_body_string(
            r#"{"usageItems":[
                {"model":"GPT-4.1","grossQuantity":12,"discountQuantity":12,"netQuantity":0,"netAmount":0},
                {"model":"Claude Sonnet 4","grossQuantity":5.0,"discountQuantity":3.0,"netQuantity":2.0,"netAmount":0.08}
            ]}"#,
        ))
        .expect(1)
        .mount(&server)
        .await;

    let items = provider_for(&server)
        .fetch_raw(june(), &credentials())
        .await
        .unwrap();

    assert_eq!(items.len(), 2);
    assert_eq!(items[1].model.as_deref(), Some("Claude Sonnet 4"));
    assert!((items[1].net_amount - 0.08).abs() < f64::EPSILON);
}

#[tokio::test]
async fn test_empty_body_object_is_empty_usage() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_body_string("{}"))
        .mount(&server)
        .await;

    let items = provider_for(&server)
        .fetch_raw(june(), &credentials())
        .await
        .unwrap();
    assert!(items.is_empty());
}

#[tokio::test]
async fn test_unauthorized_statuses() {
    for status in [401, 403] {
        let err = fetch_with_status(status).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Unauthorized, "status {status}");
    }
}

#[tokio::test]
async fn test_other_statuses_are_invalid_response() {
    for status in [404, 422, 500, 503] {
        let err = fetch_with_status(status).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidResponse(status));
    }
}

#[tokio::test]
async fn test_malformed_body_is_decode_error() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_body_string("not json"))
        .mount(&server)
        .await;

    let err = provider_for(&server)
        .fetch_raw(june(), &credentials())
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Decode);
}

#[tokio::test]
async fn test_timeout_is_network_error_without_retry() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_delay(Duration::from_secs(5)))
        .expect(1)
        .mount(&server)
        .await;

    let base = Url::parse(&server.uri()).unwrap();
    let client = HttpClient::with_timeout(Duration::from_millis(200)).unwrap();
    let provider = CopilotProvider::with_client(client, base);

    let err = provider.fetch_raw(june(), &credentials()).await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Network);
}

#[tokio::test]
async fn test_unreachable_host_is_network_error() {
    // Nothing listens on port 1.
    let base = Url::parse("http://127.0.0.1:1").unwrap();
    let provider = CopilotProvider::with_client(HttpClient::new().unwrap(), base);

    let err = provider.fetch_raw(june(), &credentials()).await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Network);
}

#[test]
fn test_default_provider_targets_github() {
    let provider = CopilotProvider::new().unwrap();
    assert_eq!(provider.base_url().as_str(), "https://api.github.com/");
    assert_eq!(provider.id(), "github-copilot");
}
