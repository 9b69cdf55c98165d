//! Integration tests for identity-provider token exchange against a mock
//! OpenID provider.

mod helpers;

use std::time::Duration;

use http::{Request, StatusCode};
use serde_json::{Value, json};
use wiremock::matchers::{header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use helpers::{CLIENT_IP, TestApp, TestResponse, sso_provider, test_config};
use invenfinder_core::config::SsoProvisioning;

async fn mock_provider() -> MockServer {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/.well-known/openid-configuration"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "issuer": server.uri(),
            "authorization_endpoint": format!("{}/authorize", server.uri()),
            "token_endpoint": format!("{}/token", server.uri()),
            "userinfo_endpoint": format!("{}/userinfo", server.uri()),
        })))
        .mount(&server)
        .await;
    server
}

async fn accept_token(server: &MockServer, token: &str, claims: Value) {
    Mock::given(method("GET"))
        .and(path("/userinfo"))
        .and(header("Authorization", format!("Bearer {token}").as_str()))
        .respond_with(ResponseTemplate::new(200).set_body_json(claims))
        .mount(server)
        .await;
}

async fn app_for(server: &MockServer, provisioning: SsoProvisioning) -> TestApp {
    let mut config = test_config();
    config.sso.providers = vec![sso_provider(&server.uri(), provisioning)];
    TestApp::with_config(config).await
}

async fn sso_request(app: &TestApp, method: &str, uri: &str, token: &str) -> TestResponse {
    let request = Request::builder()
        .method(method)
        .uri(uri)
        .header("x-forwarded-for", CLIENT_IP)
        .header("API-Key", token)
        .header("SSO-Name", "corp")
        .body(axum::body::Body::empty())
        .unwrap();
    app.send(request).await
}

async fn userinfo_calls(server: &MockServer) -> usize {
    server
        .received_requests()
        .await
        .unwrap_or_default()
        .iter()
        .filter(|r| r.url.path() == "/userinfo")
        .count()
}

#[tokio::test]
async fn test_providers_are_listed_after_discovery() {
    let server = mock_provider().await;
    let app = app_for(&server, SsoProvisioning::ExistingOnly).await;

    let response = app.request("GET", "/api/sso/providers", None, None).await;

    assert_eq!(response.status, StatusCode::OK);
    let providers = response.body.as_array().unwrap();
    assert_eq!(providers.len(), 1);
    assert_eq!(providers[0]["name"], "corp");
    assert_eq!(providers[0]["client_id"], "invenfinder");
    assert_eq!(
        providers[0]["authorization_endpoint"],
        format!("{}/authorize", server.uri()).as_str()
    );
    assert!(providers[0].get("client_secret").is_none());
}

#[tokio::test]
async fn test_token_binds_existing_user() {
    let server = mock_provider().await;
    accept_token(
        &server,
        "upstream-token",
        json!({ "sub": "42", "preferred_username": "alice" }),
    )
    .await;
    let app = app_for(&server, SsoProvisioning::ExistingOnly).await;
    app.seed_user("alice", "hunter2", 0).await;

    let me = sso_request(&app, "GET", "/api/me", "upstream-token").await;
    assert_eq!(me.status, StatusCode::OK);
    assert_eq!(me.body["username"], "alice");

    let sessions = sso_request(&app, "GET", "/api/sessions", "upstream-token").await;
    let listed = sessions.body.as_array().unwrap();
    assert_eq!(listed.len(), 1);
    assert_eq!(listed[0]["sso"], "corp");

    // the bound session is fresh, so the provider is asked only once
    assert_eq!(userinfo_calls(&server).await, 1);
}

#[tokio::test]
async fn test_existing_only_refuses_unknown_user() {
    let server = mock_provider().await;
    accept_token(&server, "upstream-token", json!({ "sub": "7", "username": "mallory" })).await;
    let app = app_for(&server, SsoProvisioning::ExistingOnly).await;

    let response = sso_request(&app, "GET", "/api/auth", "upstream-token").await;

    assert_eq!(response.status, StatusCode::UNAUTHORIZED);
    assert!(app.find_user("mallory").await.is_none());
}

#[tokio::test]
async fn test_auto_provisioning_creates_user() {
    let server = mock_provider().await;
    accept_token(&server, "upstream-token", json!({ "sub": "9", "username": "bob" })).await;
    let app = app_for(&server, SsoProvisioning::Auto).await;

    let response = sso_request(&app, "GET", "/api/me", "upstream-token").await;

    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.body["username"], "bob");
    assert_eq!(response.body["permissions"], 0);

    // a provisioned account has no usable password
    let login = app
        .request(
            "POST",
            "/api/login",
            None,
            Some(json!({ "username": "bob", "password": "" })),
        )
        .await;
    assert_eq!(login.error_code(), "NO_PASSWORD");
}

#[tokio::test]
async fn test_rejected_token_is_unauthenticated() {
    let server = mock_provider().await;
    Mock::given(method("GET"))
        .and(path("/userinfo"))
        .respond_with(ResponseTemplate::new(401))
        .mount(&server)
        .await;
    let app = app_for(&server, SsoProvisioning::Auto).await;

    let response = sso_request(&app, "GET", "/api/auth", "expired").await;

    assert_eq!(response.status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_token_without_hint_is_not_exchanged() {
    let server = mock_provider().await;
    accept_token(&server, "upstream-token", json!({ "sub": "9", "username": "bob" })).await;
    let app = app_for(&server, SsoProvisioning::Auto).await;

    let response = app
        .request("GET", "/api/auth", Some("upstream-token"), None)
        .await;

    assert_eq!(response.status, StatusCode::UNAUTHORIZED);
    assert_eq!(userinfo_calls(&server).await, 0);
}

#[tokio::test]
async fn test_logout_revokes_upstream_token_for_good() {
    let server = mock_provider().await;
    accept_token(&server, "upstream-token", json!({ "sub": "9", "username": "bob" })).await;
    let app = app_for(&server, SsoProvisioning::Auto).await;

    assert_eq!(
        sso_request(&app, "GET", "/api/auth", "upstream-token").await.status,
        StatusCode::OK
    );
    assert_eq!(
        sso_request(&app, "GET", "/api/logout", "upstream-token").await.status,
        StatusCode::OK
    );

    // the provider still accepts the token, the revoked session wins
    let after = sso_request(&app, "GET", "/api/auth", "upstream-token").await;
    assert_eq!(after.status, StatusCode::UNAUTHORIZED);
    assert_eq!(userinfo_calls(&server).await, 1);
}

#[tokio::test]
async fn test_stale_session_is_revoked_when_provider_stops_accepting() {
    let server = mock_provider().await;
    Mock::given(method("GET"))
        .and(path("/userinfo"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "sub": "9",
            "username": "bob"
        })))
        .up_to_n_times(1)
        .with_priority(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/userinfo"))
        .respond_with(ResponseTemplate::new(401))
        .mount(&server)
        .await;

    let mut config = test_config();
    config.sso.providers = vec![sso_provider(&server.uri(), SsoProvisioning::Auto)];
    config.session.revalidation_interval_minutes = 0;
    let app = TestApp::with_config(config).await;

    let first = sso_request(&app, "GET", "/api/auth", "upstream-token").await;
    assert_eq!(first.status, StatusCode::OK);

    tokio::time::sleep(Duration::from_millis(10)).await;

    let second = sso_request(&app, "GET", "/api/auth", "upstream-token").await;
    assert_eq!(second.status, StatusCode::UNAUTHORIZED);

    let third = sso_request(&app, "GET", "/api/auth", "upstream-token").await;
    assert_eq!(third.status, StatusCode::UNAUTHORIZED);
    assert_eq!(userinfo_calls(&server).await, 2);
}

#[tokio::test]
async fn test_unreachable_provider_is_unauthenticated() {
    // nothing listens on a port we just released
    let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    let uri = format!("http://{}", listener.local_addr().unwrap());
    drop(listener);

    let mut config = test_config();
    config.sso.http_timeout_seconds = 1;
    config.sso.providers = vec![sso_provider(&uri, SsoProvisioning::Auto)];
    let app = TestApp::with_config(config).await;

    let providers = app.request("GET", "/api/sso/providers", None, None).await;
    assert_eq!(providers.body, json!([]));

    let response = sso_request(&app, "GET", "/api/auth", "upstream-token").await;
    assert_eq!(response.status, StatusCode::UNAUTHORIZED);
}
