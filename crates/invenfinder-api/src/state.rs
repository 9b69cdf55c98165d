//! Application state shared across all handlers and middleware.

use std::sync::Arc;

use invenfinder_auth::{
    AccessGuard, IdentityVerifier, PasswordHasher, PasswordValidator, RateLimiter,
    SessionManager, SsoDelegate,
};
use invenfinder_core::config::AppConfig;
use invenfinder_core::result::AppResult;
use invenfinder_database::{SessionRepository, UserRepository};

/// Application state containing all shared dependencies.
///
/// Passed to every Axum handler via `State<AppState>`.
/// All fields are cheap to clone.
#[derive(Debug, Clone)]
pub struct AppState {
    // ── Configuration ────────────────────────────────────────
    /// Application configuration
    pub config: Arc<AppConfig>,

    // ── Repositories ─────────────────────────────────────────
    /// User repository
    pub users: Arc<dyn UserRepository>,

    // ── Auth ─────────────────────────────────────────────────
    /// Session lifecycle manager
    pub sessions: Arc<SessionManager>,
    /// Password hasher (Argon2id)
    pub password_hasher: Arc<PasswordHasher>,
    /// Password policy
    pub password_validator: Arc<PasswordValidator>,
    /// Per-request identity resolution
    pub guard: Arc<AccessGuard>,
    /// Shared token buckets
    pub rate_limiter: RateLimiter,
    /// OpenID Connect provider registry
    pub sso: Arc<SsoDelegate>,
}

impl AppState {
    /// Wires the auth components on top of the given repositories.
    pub fn new(
        config: AppConfig,
        users: Arc<dyn UserRepository>,
        sessions: Arc<dyn SessionRepository>,
        sso: Arc<SsoDelegate>,
    ) -> AppResult<Self> {
        let password_hasher = Arc::new(PasswordHasher::new(&config.auth)?);
        let password_validator = Arc::new(PasswordValidator::new(&config.auth));
        let sessions = Arc::new(SessionManager::new(sessions));
        let verifier: Arc<dyn IdentityVerifier> = sso.clone();
        let guard = Arc::new(AccessGuard::new(
            Arc::clone(&sessions),
            Arc::clone(&users),
            verifier,
            Arc::clone(&password_hasher),
            &config.session,
        ));
        let rate_limiter = RateLimiter::new(&config.rate_limit);

        Ok(Self {
            config: Arc::new(config),
            users,
            sessions,
            password_hasher,
            password_validator,
            guard,
            rate_limiter,
            sso,
        })
    }
}
