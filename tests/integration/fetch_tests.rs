//! Integration tests for the resilient fetcher
//!
//! These tests use wiremock to check retry counts, timeouts and decoding
//! against a real HTTP server.

use reqwest::Client;
use source_watch::fetch::{fetch_json, fetch_text, FetchErrorKind, FetchRequest, RetryPolicy};
use std::time::Duration;
use wiremock::matchers::{header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// Short delays so retry tests stay fast
fn fast_policy(max_retries: u32) -> RetryPolicy {
    RetryPolicy {
        timeout: Duration::from_secs(2),
        max_retries,
        backoff: Duration::from_millis(10),
        factor: 2.0,
        max_delay: None,
    }
}

#[tokio::test]
async fn test_non_2xx_retried_until_exhausted() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/feed"))
        .respond_with(ResponseTemplate::new(503))
        .expect(3)
        .mount(&mock_server)
        .await;

    let url = format!("{}/feed", mock_server.uri());
    let err = fetch_text(&Client::new(), &FetchRequest::get(&url), &fast_policy(2))
        .await
        .unwrap_err();

    assert_eq!(err.kind(), FetchErrorKind::Status);
    assert_eq!(err.attempts(), 3);
    assert!(err.to_string().contains("HTTP 503"));
}

#[tokio::test]
async fn test_recovers_after_transient_failure() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/flaky"))
        .respond_with(ResponseTemplate::new(500))
        .up_to_n_times(1)
        .expect(1)
        .mount(&mock_server)
        .await;

    Mock::given(method("GET"))
        .and(path("/flaky"))
        .respond_with(ResponseTemplate::new(200).set_body_string("hello"))
        .expect(1)
        .mount(&mock_server)
        .await;

    let url = format!("{}/flaky", mock_server.uri());
    let body = fetch_text(&Client::new(), &FetchRequest::get(&url), &fast_policy(2))
        .await
        .unwrap();

    assert_eq!(body, "hello");
}

#[tokio::test]
async fn test_zero_retries_means_single_attempt() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(404))
        .expect(1)
        .mount(&mock_server)
        .await;

    let url = format!("{}/missing", mock_server.uri());
    let err = fetch_text(&Client::new(), &FetchRequest::get(&url), &fast_policy(0))
        .await
        .unwrap_err();

    assert_eq!(err.kind(), FetchErrorKind::Status);
    assert_eq!(err.attempts(), 1);
}

#[tokio::test]
async fn test_invalid_json_is_not_retried() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/api"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html>maintenance</html>"))
        .expect(1)
        .mount(&mock_server)
        .await;

    let url = format!("{}/api", mock_server.uri());
    let err = fetch_json(&Client::new(), &FetchRequest::get(&url), &fast_policy(3))
        .await
        .unwrap_err();

    assert_eq!(err.kind(), FetchErrorKind::Decode);
    assert_eq!(err.attempts(), 1);
}

#[tokio::test]
async fn test_timeout_applies_per_attempt() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_string("late")
                .set_delay(Duration::from_millis(1500)),
        )
        .mount(&mock_server)
        .await;

    let policy = RetryPolicy {
        timeout: Duration::from_millis(100),
        ..fast_policy(1)
    };
    let url = format!("{}/slow", mock_server.uri());
    let err = fetch_text(&Client::new(), &FetchRequest::get(&url), &policy)
        .await
        .unwrap_err();

    assert_eq!(err.kind(), FetchErrorKind::Timeout);
    assert_eq!(err.attempts(), 2);
}

#[tokio::test]
async fn test_connection_refused_is_transport() {
    // Nothing listens on port 1
    let err = fetch_text(
        &Client::new(),
        &FetchRequest::get("http://127.0.0.1:1/"),
        &fast_policy(1),
    )
    .await
    .unwrap_err();

    assert_eq!(err.kind(), FetchErrorKind::Transport);
    assert_eq!(err.attempts(), 2);
}

#[tokio::test]
async fn test_headers_and_query_are_sent() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/search"))
        .and(header("user-agent", "TestWatch/1.0"))
        .and(query_param("q", "rates"))
        .respond_with(ResponseTemplate::new(200).set_body_string(r#"{"ok": true}"#))
        .expect(1)
        .mount(&mock_server)
        .await;

    let url = format!("{}/search", mock_server.uri());
    let request = FetchRequest::get(&url)
        .user_agent("TestWatch/1.0")
        .params(vec![("q".to_string(), "rates".to_string())]);
    let value = fetch_json(&Client::new(), &request, &fast_policy(0))
        .await
        .unwrap();

    assert_eq!(value["ok"], serde_json::Value::Bool(true));
}
