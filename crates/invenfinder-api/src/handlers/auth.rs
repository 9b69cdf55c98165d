//! Auth handlers: register, login, check, me, logout.

use axum::Json;
use axum::extract::State;
use axum::http::StatusCode;
use tracing::{info, warn};

use invenfinder_core::error::AppError;
use invenfinder_entity::user::{Permission, User};

use crate::dto::request::UpdateUserRequest;
use crate::dto::response::{LoginResponse, MessageResponse, UserResponse};
use crate::error::ApiResult;
use crate::extractors::{Context, CurrentSession, CurrentUser, JsonBody, LoginCredentials};
use crate::handlers::user::{apply_update, validate_username};
use crate::state::AppState;

/// POST /api/register
pub async fn register(
    State(state): State<AppState>,
    ctx: Context,
    credentials: LoginCredentials,
) -> ApiResult<(StatusCode, Json<LoginResponse>)> {
    validate_username(&credentials.username)?;
    state.password_validator.validate(&credentials.password)?;

    let stored = state.password_hasher.hash_new(&credentials.password)?;
    let user = User::new(credentials.username, stored.salt, stored.hash, 0);
    state.users.save(&user).await?;

    let session = state
        .sessions
        .create(&user, ctx.ip_or_unknown(), ctx.user_agent(), None, None)
        .await?;

    info!(user_id = %user.id, username = %user.username, "User registered");

    Ok((
        StatusCode::CREATED,
        Json(LoginResponse {
            key: session.token,
            user: UserResponse::from(&user),
        }),
    ))
}

/// POST /api/login
pub async fn login(
    State(state): State<AppState>,
    ctx: Context,
    credentials: LoginCredentials,
) -> ApiResult<(StatusCode, Json<LoginResponse>)> {
    let Some(user) = state.users.find_by_username(&credentials.username).await? else {
        info!(username = %credentials.username, ip = ctx.ip_or_unknown(), "Login for unknown user");
        return Err(AppError::validation("User not found")
            .with_code("USER_NOT_FOUND")
            .into());
    };

    let valid = state.password_hasher.verify_stored(
        &credentials.password,
        &user.password_salt,
        &user.password_hash,
    )?;
    if !valid {
        warn!(user_id = %user.id, ip = ctx.ip_or_unknown(), "Login with wrong password");
        return Err(AppError::validation("Incorrect password")
            .with_code("WRONG_PASSWORD")
            .into());
    }

    let session = state
        .sessions
        .create(&user, ctx.ip_or_unknown(), ctx.user_agent(), None, None)
        .await?;

    info!(
        user_id = %user.id,
        session_id = %session.id,
        ip = ctx.ip_or_unknown(),
        "User logged in"
    );

    Ok((
        StatusCode::CREATED,
        Json(LoginResponse {
            key: session.token,
            user: UserResponse::from(&user),
        }),
    ))
}

/// GET /api/auth
pub async fn check() -> Json<MessageResponse> {
    Json(MessageResponse::ok())
}

/// GET /api/me
pub async fn me(CurrentUser(user): CurrentUser) -> Json<UserResponse> {
    Json(UserResponse::from(&user))
}

/// PATCH /api/me
///
/// Anyone may change their own password, which ends their other sessions.
/// Username and permission changes are ignored unless the caller holds
/// `MANAGE_USERS`.
pub async fn update_me(
    State(state): State<AppState>,
    ctx: Context,
    CurrentUser(mut user): CurrentUser,
    CurrentSession(session): CurrentSession,
    JsonBody(request): JsonBody<UpdateUserRequest>,
) -> ApiResult<Json<UserResponse>> {
    let privileged = request.is_privileged()
        && state
            .guard
            .has_permissions(&ctx, Permission::ManageUsers.bit(), false)
            .await?;

    let changes = apply_update(&state, &mut user, &request, privileged)?;
    state.users.save(&user).await?;

    if changes.password {
        state.sessions.delete_others(&user, &session).await?;
        info!(user_id = %user.id, "Password changed, other sessions ended");
    }

    Ok(Json(UserResponse::from(&user)))
}

/// GET /api/logout
pub async fn logout(
    State(state): State<AppState>,
    CurrentSession(session): CurrentSession,
) -> ApiResult<Json<MessageResponse>> {
    state.sessions.delete(&session, false).await?;

    info!(
        user_id = %session.user_id,
        session_id = %session.id,
        sso = session.is_sso(),
        "User logged out"
    );

    Ok(Json(MessageResponse::ok()))
}
