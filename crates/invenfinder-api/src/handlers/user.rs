//! User administration handlers.

use axum::Json;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use tracing::info;

use invenfinder_core::error::AppError;
use invenfinder_core::result::AppResult;
use invenfinder_entity::user::User;

use crate::dto::request::{CreateUserRequest, CredentialsRequest, PermissionsInput, UpdateUserRequest};
use crate::dto::response::UserResponse;
use crate::error::ApiResult;
use crate::extractors::{JsonBody, LoginCredentials};
use crate::state::AppState;

const USERNAME_MAX_CHARS: usize = 64;

/// Usernames are non-empty, at most 64 characters and free of control
/// characters.
pub(crate) fn validate_username(username: &str) -> AppResult<()> {
    if username.is_empty() {
        return Err(AppError::validation("Username must be provided").with_code("NO_USERNAME"));
    }
    if username.chars().count() > USERNAME_MAX_CHARS || username.chars().any(char::is_control) {
        return Err(AppError::validation("Invalid username"));
    }
    Ok(())
}

/// What an update changed that affects existing sessions.
#[derive(Debug, Default, Clone, Copy)]
pub(crate) struct AppliedChanges {
    pub password: bool,
    pub permissions: bool,
}

/// Applies `request` to `user` in memory. Username and permissions are only
/// touched when `privileged`.
pub(crate) fn apply_update(
    state: &AppState,
    user: &mut User,
    request: &UpdateUserRequest,
    privileged: bool,
) -> AppResult<AppliedChanges> {
    let mut changes = AppliedChanges::default();

    if privileged {
        if let Some(username) = &request.username {
            validate_username(username)?;
            user.username = username.clone();
        }
        if let Some(permissions) = &request.permissions {
            let mask = permissions.mask();
            changes.permissions = mask != user.permissions;
            user.permissions = mask;
        }
    }

    if let Some(password) = &request.password {
        state.password_validator.validate(password)?;
        let stored = state.password_hasher.hash_new(password)?;
        user.password_salt = stored.salt;
        user.password_hash = stored.hash;
        changes.password = true;
    }

    Ok(changes)
}

/// POST /api/users
pub async fn create_user(
    State(state): State<AppState>,
    JsonBody(request): JsonBody<CreateUserRequest>,
) -> ApiResult<(StatusCode, Json<UserResponse>)> {
    let credentials = LoginCredentials::from_body(CredentialsRequest {
        username: request.username,
        password: request.password,
    })?;
    validate_username(&credentials.username)?;
    state.password_validator.validate(&credentials.password)?;

    let permissions = request
        .permissions
        .as_ref()
        .map_or(0, PermissionsInput::mask);
    let stored = state.password_hasher.hash_new(&credentials.password)?;
    let user = User::new(credentials.username, stored.salt, stored.hash, permissions);
    state.users.save(&user).await?;

    info!(
        user_id = %user.id,
        username = %user.username,
        permissions = user.permissions,
        "User created"
    );

    Ok((StatusCode::CREATED, Json(UserResponse::from(&user))))
}

/// PATCH /api/users/{username}
///
/// A password or permission change ends every session of the target.
pub async fn update_user(
    State(state): State<AppState>,
    Path(username): Path<String>,
    JsonBody(request): JsonBody<UpdateUserRequest>,
) -> ApiResult<Json<UserResponse>> {
    let Some(mut user) = state.users.find_by_username(&username).await? else {
        return Err(AppError::validation("User not found")
            .with_code("USER_NOT_FOUND")
            .into());
    };

    let changes = apply_update(&state, &mut user, &request, true)?;
    state.users.save(&user).await?;

    if changes.password || changes.permissions {
        state.sessions.delete_all_for_user(&user).await?;
        info!(
            user_id = %user.id,
            password = changes.password,
            permissions = changes.permissions,
            "User credentials changed, sessions ended"
        );
    }

    Ok(Json(UserResponse::from(&user)))
}
