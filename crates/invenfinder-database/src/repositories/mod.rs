//! Repository traits and their PostgreSQL implementations.
//!
//! Lookups return `Ok(None)` for a missing row; `Err` always means the
//! backend itself failed.

pub mod session;
pub mod user;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use invenfinder_core::result::AppResult;
use invenfinder_entity::session::Session;
use invenfinder_entity::user::User;

pub use session::PgSessionRepository;
pub use user::PgUserRepository;

/// Persistence for [`User`] rows.
#[async_trait]
pub trait UserRepository: Send + Sync + std::fmt::Debug + 'static {
    /// Insert the user, or update every mutable column if the id exists.
    ///
    /// Fails with a conflict error when another user owns the username.
    async fn save(&self, user: &User) -> AppResult<()>;

    /// Find a user by id.
    async fn find_by_id(&self, id: Uuid) -> AppResult<Option<User>>;

    /// Find a user by exact (case-sensitive) username.
    async fn find_by_username(&self, username: &str) -> AppResult<Option<User>>;

    /// Delete a user by id. Returns `true` if a row was removed.
    async fn delete(&self, id: Uuid) -> AppResult<bool>;
}

/// Persistence for [`Session`] rows.
#[async_trait]
pub trait SessionRepository: Send + Sync + std::fmt::Debug + 'static {
    /// Insert the session, or update its mutable columns if the id exists.
    async fn save(&self, session: &Session) -> AppResult<()>;

    /// Set `last_verified` on a live session.
    ///
    /// Returns the updated row, or `None` when the session is gone or was
    /// revoked in the meantime. Never recreates a row.
    async fn mark_verified(&self, id: Uuid, at: DateTime<Utc>) -> AppResult<Option<Session>>;

    /// Mark a single session revoked. Returns `true` if the row exists.
    async fn revoke(&self, id: Uuid) -> AppResult<bool>;

    /// Find a session by id.
    async fn find_by_id(&self, id: Uuid) -> AppResult<Option<Session>>;

    /// Find a session by its bearer token, revoked or not.
    async fn find_by_token(&self, token: &str) -> AppResult<Option<Session>>;

    /// List every session of a user, newest first.
    async fn find_by_user(&self, user_id: Uuid) -> AppResult<Vec<Session>>;

    /// Delete a session by id. Returns `true` if a row was removed.
    async fn delete(&self, id: Uuid) -> AppResult<bool>;

    /// Mark every SSO session of a user revoked. Returns the affected count.
    async fn revoke_sso_by_user(&self, user_id: Uuid) -> AppResult<u64>;

    /// Delete every local session of a user. Returns the affected count.
    async fn delete_local_by_user(&self, user_id: Uuid) -> AppResult<u64>;
}
