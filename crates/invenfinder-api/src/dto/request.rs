//! Request DTOs with validation.

use serde::{Deserialize, Serialize};
use validator::Validate;

use invenfinder_entity::user::{Permission, permission};

/// Register/login request body. Presence is checked by the
/// [`LoginCredentials`](crate::extractors::LoginCredentials) extractor.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CredentialsRequest {
    /// Username.
    pub username: Option<String>,
    /// Password.
    pub password: Option<String>,
}

/// Permissions as either a raw bitmask or a list of flag names.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum PermissionsInput {
    /// `11`
    Mask(u64),
    /// `["MANAGE_USERS", "loan_items"]`
    Names(Vec<Permission>),
}

impl PermissionsInput {
    /// The bitmask this input denotes.
    pub fn mask(&self) -> u64 {
        match self {
            Self::Mask(mask) => *mask,
            Self::Names(names) => permission::encode(names.iter().copied()),
        }
    }
}

/// Create user request (admin).
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct CreateUserRequest {
    /// Username.
    #[validate(length(max = 64, message = "Username is too long"))]
    pub username: Option<String>,
    /// Password.
    pub password: Option<String>,
    /// Initial permissions; none when omitted.
    pub permissions: Option<PermissionsInput>,
}

/// Partial user update, used for both `PATCH /me` and
/// `PATCH /users/{username}`.
#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate)]
pub struct UpdateUserRequest {
    /// New username.
    #[validate(length(min = 1, max = 64, message = "Username must be 1 to 64 characters"))]
    pub username: Option<String>,
    /// New password.
    pub password: Option<String>,
    /// New permissions.
    pub permissions: Option<PermissionsInput>,
}

impl UpdateUserRequest {
    /// Whether the update touches username or permissions.
    pub fn is_privileged(&self) -> bool {
        self.username.is_some() || self.permissions.is_some()
    }
}
