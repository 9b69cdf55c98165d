//! Integration tests for storage outages during identity resolution. A
//! failing backend answers 500, never 401.

mod helpers;

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use http::StatusCode;
use serde_json::json;
use uuid::Uuid;

use helpers::{TestApp, test_config};
use invenfinder_core::error::AppError;
use invenfinder_core::result::AppResult;
use invenfinder_database::memory::{MemorySessionRepository, MemoryUserRepository};
use invenfinder_database::{SessionRepository, UserRepository};
use invenfinder_entity::session::Session;
use invenfinder_entity::user::{Permission, User};

/// A backend whose every call fails.
#[derive(Debug)]
struct Offline;

fn offline() -> AppError {
    AppError::database("connection refused")
}

#[async_trait]
impl SessionRepository for Offline {
    async fn save(&self, _: &Session) -> AppResult<()> {
        Err(offline())
    }
    async fn mark_verified(&self, _: Uuid, _: DateTime<Utc>) -> AppResult<Option<Session>> {
        Err(offline())
    }
    async fn revoke(&self, _: Uuid) -> AppResult<bool> {
        Err(offline())
    }
    async fn find_by_id(&self, _: Uuid) -> AppResult<Option<Session>> {
        Err(offline())
    }
    async fn find_by_token(&self, _: &str) -> AppResult<Option<Session>> {
        Err(offline())
    }
    async fn find_by_user(&self, _: Uuid) -> AppResult<Vec<Session>> {
        Err(offline())
    }
    async fn delete(&self, _: Uuid) -> AppResult<bool> {
        Err(offline())
    }
    async fn revoke_sso_by_user(&self, _: Uuid) -> AppResult<u64> {
        Err(offline())
    }
    async fn delete_local_by_user(&self, _: Uuid) -> AppResult<u64> {
        Err(offline())
    }
}

#[async_trait]
impl UserRepository for Offline {
    async fn save(&self, _: &User) -> AppResult<()> {
        Err(offline())
    }
    async fn find_by_id(&self, _: Uuid) -> AppResult<Option<User>> {
        Err(offline())
    }
    async fn find_by_username(&self, _: &str) -> AppResult<Option<User>> {
        Err(offline())
    }
    async fn delete(&self, _: Uuid) -> AppResult<bool> {
        Err(offline())
    }
}

#[tokio::test]
async fn test_session_store_outage_is_a_server_error() {
    let app = TestApp::with_repositories(
        test_config(),
        Arc::new(MemoryUserRepository::new()),
        Arc::new(Offline),
    )
    .await;

    let check = app.request("GET", "/api/auth", Some("some-key"), None).await;
    assert_eq!(check.status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(check.error_code(), "INTERNAL_ERROR");
    // backend details stay in the logs
    assert!(!check.body.to_string().contains("connection refused"));

    let admin = app
        .request(
            "POST",
            "/api/users",
            Some("some-key"),
            Some(json!({ "username": "bob", "password": "pw" })),
        )
        .await;
    assert_eq!(admin.status, StatusCode::INTERNAL_SERVER_ERROR);

    // no key means no lookup, so the plain 401 still applies
    let anonymous = app.request("GET", "/api/auth", None, None).await;
    assert_eq!(anonymous.status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_user_store_outage_is_a_server_error() {
    let app = TestApp::with_repositories(
        test_config(),
        Arc::new(Offline),
        Arc::new(MemorySessionRepository::new()),
    )
    .await;
    let alice = User::new("alice", "salt", "hash", Permission::ManageUsers.bit());
    let session = app
        .state
        .sessions
        .create(&alice, helpers::CLIENT_IP, "integration-test", None, None)
        .await
        .unwrap();
    let key = session.token.as_str();

    // the session alone resolves
    let check = app.request("GET", "/api/auth", Some(key), None).await;
    assert_eq!(check.status, StatusCode::OK);

    let me = app.request("GET", "/api/me", Some(key), None).await;
    assert_eq!(me.status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(me.error_code(), "INTERNAL_ERROR");

    let admin = app
        .request(
            "POST",
            "/api/users",
            Some(key),
            Some(json!({ "username": "bob", "password": "pw" })),
        )
        .await;
    assert_eq!(admin.status, StatusCode::INTERNAL_SERVER_ERROR);
}
