//! User entity model.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

use super::permission;

/// A registered user.
///
/// Mutating a field does not persist it; callers save through the user
/// repository explicitly.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct User {
    /// Unique user identifier.
    pub id: Uuid,
    /// Unique, case-sensitive login name.
    pub username: String,
    /// Base64-encoded random salt.
    #[serde(skip_serializing)]
    pub password_salt: String,
    /// Base64-encoded password digest.
    #[serde(skip_serializing)]
    pub password_hash: String,
    /// Permission bitmask; bit `i` grants the i-th [`Permission`](super::Permission).
    #[sqlx(try_from = "i64")]
    pub permissions: u64,
    /// When the user was created.
    pub created_at: DateTime<Utc>,
}

impl User {
    /// Build a new, unsaved user with a fresh id.
    pub fn new(
        username: impl Into<String>,
        password_salt: impl Into<String>,
        password_hash: impl Into<String>,
        permissions: u64,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            username: username.into(),
            password_salt: password_salt.into(),
            password_hash: password_hash.into(),
            permissions,
            created_at: Utc::now(),
        }
    }

    /// Whether the user holds every permission in `required`.
    pub fn has_all(&self, required: u64) -> bool {
        permission::has_all(required, self.permissions)
    }

    /// Whether the user holds at least one permission in `required`.
    pub fn has_any(&self, required: u64) -> bool {
        permission::has_any(required, self.permissions)
    }
}
