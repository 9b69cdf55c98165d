//! Response DTOs.

use std::collections::BTreeSet;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use invenfinder_entity::session::Session;
use invenfinder_entity::user::{Permission, User, permission};

/// User as seen by clients. Never carries credentials.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserResponse {
    /// User ID.
    pub id: Uuid,
    /// Username.
    pub username: String,
    /// Permission bitmask.
    pub permissions: u64,
    /// Named flags held, decoded from the bitmask.
    pub permission_names: BTreeSet<Permission>,
    /// Created at.
    pub created_at: DateTime<Utc>,
}

impl From<&User> for UserResponse {
    fn from(user: &User) -> Self {
        Self {
            id: user.id,
            username: user.username.clone(),
            permissions: user.permissions,
            permission_names: permission::decode(user.permissions),
            created_at: user.created_at,
        }
    }
}

/// Session as listed to its owner. The token is never included.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionResponse {
    /// Public session identifier.
    pub id: Uuid,
    /// Client address at login.
    pub ip: String,
    /// User-Agent at login.
    pub ua: String,
    /// Creation time in milliseconds since the epoch.
    pub time: i64,
    /// Identity provider, for SSO sessions.
    pub sso: Option<String>,
}

impl From<&Session> for SessionResponse {
    fn from(session: &Session) -> Self {
        Self {
            id: session.id,
            ip: session.ip.clone(),
            ua: session.user_agent.clone(),
            time: session.created_at.timestamp_millis(),
            sso: session.sso_provider.clone(),
        }
    }
}

/// Result of a successful register or login.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoginResponse {
    /// Session token to present as `API-Key` or the `SID` cookie.
    pub key: String,
    /// The logged-in user.
    pub user: UserResponse,
}

/// Simple message response.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MessageResponse {
    /// Message.
    pub message: String,
}

impl MessageResponse {
    /// The `{"message": "OK"}` acknowledgement.
    pub fn ok() -> Self {
        Self {
            message: "OK".to_string(),
        }
    }
}

/// Health check response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    /// Status.
    pub status: String,
    /// Version.
    pub version: String,
}
