//! Tests for the HTTP module

use super::*;
use crate::classify::StatusTable;
use crate::config::TransportConfig;
use crate::error::Error;
use crate::metrics::{self, MemoryMetrics};
use crate::types::{AccountId, Method};
use reqwest::header::{HeaderMap, HeaderValue};
use std::sync::Arc;
use std::time::Duration;
use wiremock::matchers::{body_string, header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn transport(metrics: MemoryMetrics) -> HttpTransport {
    HttpTransport::new(TransportConfig::default(), "test-agent/1.0", Arc::new(metrics)).unwrap()
}

fn account() -> AccountId {
    AccountId::new("t2_user")
}

// ============================================================================
// Request Descriptor
// ============================================================================

#[test]
fn test_request_defaults() {
    let req = Request::new(account(), "https://oauth.reddit.com/api/v1/me");
    assert_eq!(req.method, Method::GET);
    assert!(req.retry);
    assert_eq!(req.empty_response_bytes, 0);
    assert_eq!(req.classification, StatusTable::plain());
    assert!(req.auth.is_none());
}

#[test]
fn test_request_builder_and_options() {
    let req = Request::new(account(), "https://x/y")
        .method(Method::POST)
        .form("grant_type", "refresh_token")
        .bearer("tok")
        .tags(["url:/y"])
        .with_options([
            RequestOption::query("limit", "100"),
            RequestOption::Retry(false),
            RequestOption::Tags(vec!["extra:1".to_string()]),
            RequestOption::EmptyResponseBytes(122),
        ]);

    assert_eq!(req.method, Method::POST);
    assert_eq!(req.query, vec![("limit".to_string(), "100".to_string())]);
    assert_eq!(req.form.len(), 1);
    assert!(!req.retry);
    assert_eq!(req.tags, vec!["url:/y".to_string(), "extra:1".to_string()]);
    assert_eq!(req.empty_response_bytes, 122);
    assert_eq!(req.auth, Some(Auth::Bearer("tok".to_string())));
}

#[test]
fn test_auth_debug_hides_secrets() {
    let bearer = format!("{:?}", Auth::Bearer("secret-token".to_string()));
    assert!(!bearer.contains("secret-token"));

    let basic = format!(
        "{:?}",
        Auth::Basic {
            username: "client".to_string(),
            password: "hunter2".to_string()
        }
    );
    assert!(basic.contains("client"));
    assert!(!basic.contains("hunter2"));
}

// ============================================================================
// Rate-Limit Headers
// ============================================================================

#[test]
fn test_snapshot_from_headers() {
    let mut headers = HeaderMap::new();
    headers.insert("x-ratelimit-remaining", HeaderValue::from_static("42.0"));
    headers.insert("x-ratelimit-used", HeaderValue::from_static("558"));
    headers.insert("x-ratelimit-reset", HeaderValue::from_static("120"));

    let snapshot = RateLimitSnapshot::from_headers(&headers);
    assert!(snapshot.present);
    assert_eq!(snapshot.remaining, 42.0);
    assert_eq!(snapshot.used, 558);
    assert_eq!(snapshot.reset, 120);
    assert_eq!(snapshot.reset_after(), Some(Duration::from_secs(120)));
}

#[test]
fn test_snapshot_absent_without_remaining_header() {
    let mut headers = HeaderMap::new();
    headers.insert("x-ratelimit-used", HeaderValue::from_static("5"));

    let snapshot = RateLimitSnapshot::from_headers(&headers);
    assert!(!snapshot.present);
}

#[test]
fn test_snapshot_malformed_values_read_as_zero() {
    let mut headers = HeaderMap::new();
    headers.insert("x-ratelimit-remaining", HeaderValue::from_static("lots"));
    headers.insert("x-ratelimit-reset", HeaderValue::from_static("-3"));

    let snapshot = RateLimitSnapshot::from_headers(&headers);
    assert!(snapshot.present);
    assert_eq!(snapshot.remaining, 0.0);
    assert_eq!(snapshot.used, 0);
    assert_eq!(snapshot.reset_after(), None);
}

// ============================================================================
// Transport
// ============================================================================

#[tokio::test]
async fn test_transport_get_success() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/api/v1/me"))
        .and(header("authorization", "Bearer tok"))
        .and(header("user-agent", "test-agent/1.0"))
        .respond_with(
            ResponseTemplate::new(200)
                .insert_header("x-ratelimit-remaining", "590.0")
                .insert_header("x-ratelimit-used", "10")
                .insert_header("x-ratelimit-reset", "300")
                .set_body_string(r#"{"name":"alice"}"#),
        )
        .mount(&mock_server)
        .await;

    let metrics = MemoryMetrics::new();
    let transport = transport(metrics.clone());
    let req = Request::new(account(), format!("{}/api/v1/me", mock_server.uri())).bearer("tok");

    let response = transport.send(&req).await.unwrap();
    assert_eq!(&response.body[..], br#"{"name":"alice"}"#);
    assert!(response.rate_limit.present);
    assert_eq!(response.rate_limit.remaining, 590.0);
    assert_eq!(response.rate_limit.reset, 300);

    assert_eq!(metrics.count(metrics::API_CALLS), 1);
    assert_eq!(metrics.count(metrics::API_LATENCY), 1);
    assert_eq!(metrics.count(metrics::API_ERRORS), 0);
}

#[tokio::test]
async fn test_transport_query_params() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/api/info"))
        .and(query_param("id", "t3_abc"))
        .respond_with(ResponseTemplate::new(200).set_body_string("{}"))
        .mount(&mock_server)
        .await;

    let transport = transport(MemoryMetrics::new());
    let req = Request::new(account(), format!("{}/api/info", mock_server.uri())).query("id", "t3_abc");

    let response = transport.send(&req).await.unwrap();
    assert!(!response.rate_limit.present);
}

#[tokio::test]
async fn test_transport_post_form_with_basic_auth() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/api/v1/access_token"))
        .and(header("authorization", "Basic aWQ6c2VjcmV0"))
        .and(body_string("grant_type=refresh_token&refresh_token=abc"))
        .respond_with(ResponseTemplate::new(200).set_body_string("{}"))
        .expect(1)
        .mount(&mock_server)
        .await;

    let transport = transport(MemoryMetrics::new());
    let req = Request::new(account(), format!("{}/api/v1/access_token", mock_server.uri()))
        .method(Method::POST)
        .form("grant_type", "refresh_token")
        .form("refresh_token", "abc")
        .basic_auth("id", "secret");

    transport.send(&req).await.unwrap();
}

#[tokio::test]
async fn test_transport_non_200_is_server_error() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/missing"))
        .respond_with(ResponseTemplate::new(404).set_body_string("Not found"))
        .mount(&mock_server)
        .await;

    let metrics = MemoryMetrics::new();
    let transport = transport(metrics.clone());
    let req = Request::new(account(), format!("{}/missing", mock_server.uri()));

    let err = transport.send(&req).await.unwrap_err();
    assert!(matches!(err, Error::ServerError { status: 404 }));
    assert_eq!(metrics.count(metrics::API_ERRORS), 1);
}

#[tokio::test]
async fn test_transport_header_timeout() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/slow"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_string("{}")
                .set_delay(Duration::from_secs(3)),
        )
        .mount(&mock_server)
        .await;

    let config = TransportConfig {
        response_header_timeout_seconds: 1,
        ..TransportConfig::default()
    };
    let transport = HttpTransport::new(config, "test", Arc::new(MemoryMetrics::new())).unwrap();
    let req = Request::new(account(), format!("{}/slow", mock_server.uri()));

    let err = transport.send(&req).await.unwrap_err();
    assert!(matches!(err, Error::Timeout));
}

#[tokio::test]
async fn test_transport_connection_events() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_body_string("{}"))
        .mount(&mock_server)
        .await;

    let metrics = MemoryMetrics::new();
    let transport = transport(metrics.clone());
    let req = Request::new(account(), format!("{}/a", mock_server.uri()));

    transport.send(&req).await.unwrap();
    transport.send(&req).await.unwrap();
    transport.send(&req).await.unwrap();

    assert_eq!(metrics.count(metrics::CONNECTIONS_CREATED), 1);
    assert_eq!(metrics.count(metrics::CONNECTIONS_REUSED), 2);
    assert_eq!(metrics.count(metrics::CONNECTIONS_IDLE_TIME), 2);
}

#[tokio::test]
async fn test_transport_connection_error_is_generic() {
    let transport = transport(MemoryMetrics::new());
    // Port 9 (discard) on localhost is not listening in test environments
    let req = Request::new(account(), "http://127.0.0.1:9/nothing");

    let err = transport.send(&req).await.unwrap_err();
    assert!(matches!(err, Error::Generic(_)), "got {err:?}");
}

#[test]
fn test_transport_debug() {
    let transport = transport(MemoryMetrics::new());
    let debug_str = format!("{transport:?}");
    assert!(debug_str.contains("HttpTransport"));
    assert!(debug_str.contains("config"));
}
