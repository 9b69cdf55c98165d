//! Shared test helpers for integration tests.

#![allow(dead_code)]

use std::sync::Arc;

use axum::Router;
use axum::body::Body;
use http::{HeaderMap, Request, StatusCode};
use serde_json::Value;
use tower::ServiceExt;

use invenfinder_api::{AppState, build_router};
use invenfinder_auth::SsoDelegate;
use invenfinder_core::config::{
    AppConfig, BucketPolicy, SsoProviderConfig, SsoProvisioning,
};
use invenfinder_database::{SessionRepository, UserRepository};
use invenfinder_database::memory::{MemorySessionRepository, MemoryUserRepository};
use invenfinder_entity::user::User;

/// Address every helper request claims to come from.
pub const CLIENT_IP: &str = "198.51.100.1";

/// Test application context
pub struct TestApp {
    /// The Axum router for making test requests
    pub router: Router,
    /// Shared state, for seeding and inspecting storage directly
    pub state: AppState,
}

/// A response with its body parsed as JSON (`Null` when empty).
#[derive(Debug)]
pub struct TestResponse {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub body: Value,
}

impl TestResponse {
    /// The `error` code of an error body.
    pub fn error_code(&self) -> &str {
        self.body["error"].as_str().unwrap_or_default()
    }

    /// A response header as a string.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name).and_then(|v| v.to_str().ok())
    }
}

/// Fast hashing, trusted proxy headers and limits high enough to stay out
/// of the way.
pub fn test_config() -> AppConfig {
    let mut config = AppConfig::default();
    config.server.trust_proxy = true;
    config.auth.hash_memory_kib = 1024;
    config.auth.hash_iterations = 1;

    let roomy = BucketPolicy {
        rate: 6000.0,
        initial: 1000.0,
        max: 1000.0,
        min: 0.0,
    };
    config.rate_limit.default = roomy;
    config.rate_limit.login = roomy;
    config.rate_limit.user = roomy;
    config
}

/// A provider entry pointing at a mock issuer.
pub fn sso_provider(issuer: &str, provisioning: SsoProvisioning) -> SsoProviderConfig {
    SsoProviderConfig {
        name: "corp".to_string(),
        issuer: issuer.to_string(),
        client_id: "invenfinder".to_string(),
        client_secret: "secret".to_string(),
        provisioning,
        allowed_usernames: Vec::new(),
    }
}

impl TestApp {
    /// Create a new test application with the default test config
    pub async fn new() -> Self {
        Self::with_config(test_config()).await
    }

    /// Create a test application backed by in-memory storage
    pub async fn with_config(config: AppConfig) -> Self {
        Self::with_repositories(
            config,
            Arc::new(MemoryUserRepository::new()),
            Arc::new(MemorySessionRepository::new()),
        )
        .await
    }

    /// Create a test application over the given repositories
    pub async fn with_repositories(
        config: AppConfig,
        users: Arc<dyn UserRepository>,
        sessions: Arc<dyn SessionRepository>,
    ) -> Self {
        let sso = Arc::new(SsoDelegate::new(&config.sso).expect("Failed to build SSO delegate"));
        sso.discover_all().await;

        let state =
            AppState::new(config, users, sessions, sso).expect("Failed to build app state");

        Self {
            router: build_router(state.clone()),
            state,
        }
    }

    /// Send a prepared request through the router
    pub async fn send(&self, request: Request<Body>) -> TestResponse {
        send_via(&self.router, request).await
    }

    /// Send a request from [`CLIENT_IP`], optionally authenticated and with
    /// a JSON body
    pub async fn request(
        &self,
        method: &str,
        uri: &str,
        key: Option<&str>,
        body: Option<Value>,
    ) -> TestResponse {
        self.send(build_request(method, uri, key, body)).await
    }

    /// Store a user with a real password hash
    pub async fn seed_user(&self, username: &str, password: &str, permissions: u64) -> User {
        let stored = self
            .state
            .password_hasher
            .hash_new(password)
            .expect("Failed to hash password");
        let user = User::new(username, stored.salt, stored.hash, permissions);
        self.state.users.save(&user).await.expect("Failed to save user");
        user
    }

    /// Log in and return the session key
    pub async fn login(&self, username: &str, password: &str) -> String {
        let response = self
            .request(
                "POST",
                "/api/login",
                None,
                Some(serde_json::json!({ "username": username, "password": password })),
            )
            .await;
        assert_eq!(response.status, StatusCode::CREATED, "{:?}", response.body);
        response.body["key"]
            .as_str()
            .expect("Login returned no key")
            .to_string()
    }

    /// Look a user up in storage
    pub async fn find_user(&self, username: &str) -> Option<User> {
        self.state
            .users
            .find_by_username(username)
            .await
            .expect("User lookup failed")
    }
}

/// Build a request from [`CLIENT_IP`]
pub fn build_request(
    method: &str,
    uri: &str,
    key: Option<&str>,
    body: Option<Value>,
) -> Request<Body> {
    let mut builder = Request::builder()
        .method(method)
        .uri(uri)
        .header("x-forwarded-for", CLIENT_IP)
        .header("user-agent", "integration-test");
    if let Some(key) = key {
        builder = builder.header("API-Key", key);
    }

    match body {
        Some(body) => builder
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .expect("Failed to build request"),
        None => builder.body(Body::empty()).expect("Failed to build request"),
    }
}

/// Send a prepared request through any router
pub async fn send_via(router: &Router, request: Request<Body>) -> TestResponse {
    let response = router
        .clone()
        .oneshot(request)
        .await
        .expect("Router failed");

    let status = response.status();
    let headers = response.headers().clone();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("Failed to read body");
    let body = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).expect("Body is not JSON")
    };

    TestResponse {
        status,
        headers,
        body,
    }
}
