//! Integration tests for token-bucket throttling.
//!
//! Buckets run on tokio's clock, so these tests pause it and advance it by
//! hand.

mod helpers;

use std::time::Duration;

use http::{Request, StatusCode};
use serde_json::json;

use helpers::{TestApp, TestResponse, test_config};
use invenfinder_core::config::BucketPolicy;

fn tight_login_config() -> invenfinder_core::config::AppConfig {
    let mut config = test_config();
    config.rate_limit.login = BucketPolicy {
        rate: 60.0,
        initial: 2.0,
        max: 2.0,
        min: -1.0,
    };
    config
}

async fn login_from(app: &TestApp, ip: &str) -> TestResponse {
    let request = Request::builder()
        .method("POST")
        .uri("/api/login")
        .header("x-forwarded-for", ip)
        .header("content-type", "application/json")
        .body(axum::body::Body::from(
            json!({ "username": "nobody", "password": "pw" }).to_string(),
        ))
        .unwrap();
    app.send(request).await
}

#[tokio::test(start_paused = true)]
async fn test_login_bucket_drains_then_rejects() {
    let app = TestApp::with_config(tight_login_config()).await;

    let first = login_from(&app, "203.0.113.5").await;
    assert_eq!(first.status, StatusCode::BAD_REQUEST);
    assert_eq!(first.header("ratelimit-limit"), Some("2"));
    assert_eq!(first.header("ratelimit-remaining"), Some("1"));
    assert_eq!(first.header("ratelimit-policy"), Some("60;w=60"));

    let second = login_from(&app, "203.0.113.5").await;
    assert_eq!(second.status, StatusCode::BAD_REQUEST);
    assert_eq!(second.header("ratelimit-remaining"), Some("0"));

    let third = login_from(&app, "203.0.113.5").await;
    assert_eq!(third.status, StatusCode::TOO_MANY_REQUESTS);
    assert_eq!(third.error_code(), "RATE_LIMITED");
    assert_eq!(third.header("retry-after"), Some("2"));
    assert_eq!(third.header("ratelimit-remaining"), Some("0"));
    assert!(
        third.body["message"]
            .as_str()
            .unwrap()
            .contains("try again in 2 seconds")
    );
}

#[tokio::test(start_paused = true)]
async fn test_bucket_refills_over_time() {
    let app = TestApp::with_config(tight_login_config()).await;

    for _ in 0..2 {
        login_from(&app, "203.0.113.5").await;
    }
    assert_eq!(
        login_from(&app, "203.0.113.5").await.status,
        StatusCode::TOO_MANY_REQUESTS
    );

    tokio::time::advance(Duration::from_secs(2)).await;
    assert_eq!(
        login_from(&app, "203.0.113.5").await.status,
        StatusCode::BAD_REQUEST
    );
}

#[tokio::test(start_paused = true)]
async fn test_clients_have_separate_buckets() {
    let app = TestApp::with_config(tight_login_config()).await;

    for _ in 0..3 {
        login_from(&app, "203.0.113.5").await;
    }

    let other = login_from(&app, "203.0.113.6").await;
    assert_eq!(other.status, StatusCode::BAD_REQUEST);
    assert_eq!(other.header("ratelimit-remaining"), Some("1"));
}

#[tokio::test(start_paused = true)]
async fn test_tags_do_not_share_budget() {
    let app = TestApp::with_config(tight_login_config()).await;

    for _ in 0..3 {
        login_from(&app, "203.0.113.5").await;
    }

    let request = Request::builder()
        .method("GET")
        .uri("/api/health")
        .header("x-forwarded-for", "203.0.113.5")
        .body(axum::body::Body::empty())
        .unwrap();
    let health = app.send(request).await;

    assert_eq!(health.status, StatusCode::OK);
    assert_eq!(health.header("ratelimit-limit"), Some("1000"));
}

#[tokio::test(start_paused = true)]
async fn test_default_limit_applies_to_every_route() {
    let mut config = test_config();
    config.rate_limit.default = BucketPolicy {
        rate: 1.0,
        initial: 1.0,
        max: 1.0,
        min: 0.0,
    };
    let app = TestApp::with_config(config).await;

    let first = app.request("GET", "/api/health", None, None).await;
    assert_eq!(first.status, StatusCode::OK);

    let second = app.request("GET", "/api/auth", None, None).await;
    assert_eq!(second.status, StatusCode::TOO_MANY_REQUESTS);
    assert_eq!(second.header("retry-after"), Some("60"));
    assert!(
        second.body["message"]
            .as_str()
            .unwrap()
            .contains("try again in 60 seconds")
    );
}

#[tokio::test(start_paused = true)]
async fn test_session_bucket_is_keyed_by_session() {
    let mut config = test_config();
    config.rate_limit.user = BucketPolicy {
        rate: 1.0,
        initial: 1.0,
        max: 1.0,
        min: 0.0,
    };
    let app = TestApp::with_config(config).await;
    app.seed_user("alice", "hunter2", 0).await;
    let first = app.login("alice", "hunter2").await;
    let second = app.login("alice", "hunter2").await;

    let ok = app.request("GET", "/api/sessions", Some(&first), None).await;
    assert_eq!(ok.status, StatusCode::OK);
    let limited = app.request("GET", "/api/sessions", Some(&first), None).await;
    assert_eq!(limited.status, StatusCode::TOO_MANY_REQUESTS);

    // same IP, different session
    let other = app.request("GET", "/api/sessions", Some(&second), None).await;
    assert_eq!(other.status, StatusCode::OK);
}
