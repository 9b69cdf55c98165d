//! Integration tests for registration, login and the caller's own account.

mod helpers;

use http::{Request, StatusCode};
use serde_json::json;

use helpers::{TestApp, build_request};

#[tokio::test]
async fn test_register_returns_key_and_user() {
    let app = TestApp::new().await;

    let response = app
        .request(
            "POST",
            "/api/register",
            None,
            Some(json!({ "username": "alice", "password": "hunter2" })),
        )
        .await;

    assert_eq!(response.status, StatusCode::CREATED);
    assert!(!response.body["key"].as_str().unwrap().is_empty());
    assert_eq!(response.body["user"]["username"], "alice");
    assert_eq!(response.body["user"]["permissions"], 0);
    assert!(response.body["user"].get("password_hash").is_none());

    let key = response.body["key"].as_str().unwrap();
    let check = app.request("GET", "/api/auth", Some(key), None).await;
    assert_eq!(check.status, StatusCode::OK);
}

#[tokio::test]
async fn test_register_duplicate_username() {
    let app = TestApp::new().await;
    app.seed_user("alice", "hunter2", 0).await;

    let response = app
        .request(
            "POST",
            "/api/register",
            None,
            Some(json!({ "username": "alice", "password": "other" })),
        )
        .await;

    assert_eq!(response.status, StatusCode::CONFLICT);
    assert_eq!(response.error_code(), "USERNAME_TAKEN");
}

#[tokio::test]
async fn test_missing_credentials_are_reported_in_order() {
    let app = TestApp::new().await;

    for path in ["/api/register", "/api/login"] {
        let response = app
            .request("POST", path, None, Some(json!({ "password": "x" })))
            .await;
        assert_eq!(response.status, StatusCode::BAD_REQUEST);
        assert_eq!(response.error_code(), "NO_USERNAME");

        let response = app
            .request("POST", path, None, Some(json!({ "username": "", "password": "" })))
            .await;
        assert_eq!(response.error_code(), "NO_USERNAME");

        let response = app
            .request("POST", path, None, Some(json!({ "username": "alice" })))
            .await;
        assert_eq!(response.status, StatusCode::BAD_REQUEST);
        assert_eq!(response.error_code(), "NO_PASSWORD");
    }
}

#[tokio::test]
async fn test_unparseable_body_is_invalid_request() {
    let app = TestApp::new().await;

    let request = Request::builder()
        .method("POST")
        .uri("/api/login")
        .header("content-type", "application/json")
        .body(axum::body::Body::from("{not json"))
        .unwrap();
    let response = app.send(request).await;

    assert_eq!(response.status, StatusCode::BAD_REQUEST);
    assert_eq!(response.error_code(), "INVALID_REQUEST");
}

#[tokio::test]
async fn test_login_outcomes() {
    let app = TestApp::new().await;
    app.seed_user("alice", "hunter2", 0).await;

    let unknown = app
        .request(
            "POST",
            "/api/login",
            None,
            Some(json!({ "username": "bob", "password": "hunter2" })),
        )
        .await;
    assert_eq!(unknown.status, StatusCode::BAD_REQUEST);
    assert_eq!(unknown.error_code(), "USER_NOT_FOUND");

    let wrong = app
        .request(
            "POST",
            "/api/login",
            None,
            Some(json!({ "username": "alice", "password": "hunter3" })),
        )
        .await;
    assert_eq!(wrong.status, StatusCode::BAD_REQUEST);
    assert_eq!(wrong.error_code(), "WRONG_PASSWORD");

    let ok = app
        .request(
            "POST",
            "/api/login",
            None,
            Some(json!({ "username": "alice", "password": "hunter2" })),
        )
        .await;
    assert_eq!(ok.status, StatusCode::CREATED);
    assert_eq!(ok.body["user"]["username"], "alice");
}

#[tokio::test]
async fn test_each_login_gets_its_own_key() {
    let app = TestApp::new().await;
    app.seed_user("alice", "hunter2", 0).await;

    let first = app.login("alice", "hunter2").await;
    let second = app.login("alice", "hunter2").await;
    assert_ne!(first, second);
}

#[tokio::test]
async fn test_auth_check_requires_session() {
    let app = TestApp::new().await;
    app.seed_user("alice", "hunter2", 0).await;

    let anonymous = app.request("GET", "/api/auth", None, None).await;
    assert_eq!(anonymous.status, StatusCode::UNAUTHORIZED);
    assert_eq!(anonymous.error_code(), "NOT_AUTHENTICATED");

    let bogus = app.request("GET", "/api/auth", Some("not-a-key"), None).await;
    assert_eq!(bogus.status, StatusCode::UNAUTHORIZED);

    let key = app.login("alice", "hunter2").await;
    let ok = app.request("GET", "/api/auth", Some(&key), None).await;
    assert_eq!(ok.status, StatusCode::OK);
    assert_eq!(ok.body, json!({ "message": "OK" }));
}

#[tokio::test]
async fn test_session_cookie_authenticates() {
    let app = TestApp::new().await;
    app.seed_user("alice", "hunter2", 0).await;
    let key = app.login("alice", "hunter2").await;

    let request = Request::builder()
        .method("GET")
        .uri("/api/me")
        .header("cookie", format!("theme=dark; SID={key}"))
        .body(axum::body::Body::empty())
        .unwrap();
    let response = app.send(request).await;

    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.body["username"], "alice");
}

#[tokio::test]
async fn test_me_returns_permission_names() {
    let app = TestApp::new().await;
    app.seed_user("alice", "hunter2", 0b0101).await;
    let key = app.login("alice", "hunter2").await;

    let response = app.request("GET", "/api/me", Some(&key), None).await;

    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.body["permissions"], 5);
    assert_eq!(
        response.body["permission_names"],
        json!(["EDIT_ITEM_AMOUNT", "LOAN_ITEMS"])
    );
}

#[tokio::test]
async fn test_password_change_ends_other_sessions() {
    let app = TestApp::new().await;
    app.seed_user("alice", "hunter2", 0).await;
    let current = app.login("alice", "hunter2").await;
    let other = app.login("alice", "hunter2").await;

    let response = app
        .request(
            "PATCH",
            "/api/me",
            Some(&current),
            Some(json!({ "password": "correct horse" })),
        )
        .await;
    assert_eq!(response.status, StatusCode::OK);

    assert_eq!(
        app.request("GET", "/api/auth", Some(&current), None).await.status,
        StatusCode::OK
    );
    assert_eq!(
        app.request("GET", "/api/auth", Some(&other), None).await.status,
        StatusCode::UNAUTHORIZED
    );

    app.login("alice", "correct horse").await;
}

#[tokio::test]
async fn test_self_update_ignores_privileged_fields() {
    let app = TestApp::new().await;
    app.seed_user("alice", "hunter2", 0).await;
    let key = app.login("alice", "hunter2").await;

    let response = app
        .request(
            "PATCH",
            "/api/me",
            Some(&key),
            Some(json!({ "username": "root", "permissions": ["MANAGE_USERS"] })),
        )
        .await;

    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.body["username"], "alice");
    assert_eq!(response.body["permissions"], 0);
    assert_eq!(app.find_user("alice").await.unwrap().permissions, 0);
    assert!(app.find_user("root").await.is_none());
}

#[tokio::test]
async fn test_logout_ends_session() {
    let app = TestApp::new().await;
    app.seed_user("alice", "hunter2", 0).await;
    let key = app.login("alice", "hunter2").await;

    let response = app.request("GET", "/api/logout", Some(&key), None).await;
    assert_eq!(response.status, StatusCode::OK);

    let after = app.request("GET", "/api/auth", Some(&key), None).await;
    assert_eq!(after.status, StatusCode::UNAUTHORIZED);

    let again = app.request("GET", "/api/logout", Some(&key), None).await;
    assert_eq!(again.status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_health_is_public() {
    let app = TestApp::new().await;

    let response = app.send(build_request("GET", "/api/health", None, None)).await;

    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.body["status"], "ok");
}
