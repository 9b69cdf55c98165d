//! Session listing and remote logout.

use axum::Json;
use axum::extract::{Path, State};
use tracing::info;
use uuid::Uuid;

use invenfinder_core::error::AppError;

use crate::dto::response::{MessageResponse, SessionResponse};
use crate::error::ApiResult;
use crate::extractors::{CurrentSession, CurrentUser};
use crate::state::AppState;

/// GET /api/sessions
pub async fn list_sessions(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
) -> ApiResult<Json<Vec<SessionResponse>>> {
    let sessions = state.sessions.get_user_sessions(&user).await?;
    Ok(Json(
        sessions
            .iter()
            .filter(|s| !s.revoked)
            .map(SessionResponse::from)
            .collect(),
    ))
}

/// DELETE /api/sessions/{id}
pub async fn delete_session(
    State(state): State<AppState>,
    CurrentSession(current): CurrentSession,
    Path(id): Path<String>,
) -> ApiResult<Json<SessionResponse>> {
    let target = match Uuid::parse_str(&id) {
        Ok(id) => state.sessions.get_by_id(id).await?,
        Err(_) => None,
    };
    let Some(target) = target.filter(|s| !s.revoked) else {
        return Err(AppError::validation("Session was not found")
            .with_code("SESSION_NOT_FOUND")
            .into());
    };

    if target.user_id != current.user_id {
        return Err(AppError::not_authorized("You are not allowed to do this").into());
    }

    state.sessions.delete(&target, false).await?;
    info!(
        user_id = %current.user_id,
        session_id = %target.id,
        "Session ended remotely"
    );

    Ok(Json(SessionResponse::from(&target)))
}

/// DELETE /api/sessions
pub async fn delete_all_sessions(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
) -> ApiResult<Json<MessageResponse>> {
    state.sessions.delete_all_for_user(&user).await?;
    info!(user_id = %user.id, "All sessions ended");
    Ok(Json(MessageResponse::ok()))
}
