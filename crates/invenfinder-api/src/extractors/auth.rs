//! Identity extractors backed by the request's [`RequestContext`].

use std::sync::Arc;

use axum::extract::FromRequestParts;
use axum::http::request::Parts;

use invenfinder_auth::RequestContext;
use invenfinder_core::error::AppError;
use invenfinder_entity::session::Session;
use invenfinder_entity::user::User;

use crate::error::ApiError;
use crate::state::AppState;

fn not_authenticated() -> ApiError {
    ApiError(AppError::not_authenticated(
        "You need to be logged in to do that",
    ))
}

/// The context attached by the context middleware.
#[derive(Debug, Clone)]
pub struct Context(pub Arc<RequestContext>);

impl std::ops::Deref for Context {
    type Target = RequestContext;
    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl<S: Send + Sync> FromRequestParts<S> for Context {
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<Arc<RequestContext>>()
            .cloned()
            .map(Context)
            .ok_or_else(|| ApiError(AppError::internal("Request context is missing")))
    }
}

/// The caller's valid session; 401 when there is none.
#[derive(Debug, Clone)]
pub struct CurrentSession(pub Session);

impl FromRequestParts<AppState> for CurrentSession {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let ctx = Context::from_request_parts(parts, state).await?;
        state
            .guard
            .session(&ctx)
            .await?
            .map(CurrentSession)
            .ok_or_else(not_authenticated)
    }
}

/// The caller's user; 401 when no session or user resolves.
#[derive(Debug, Clone)]
pub struct CurrentUser(pub User);

impl FromRequestParts<AppState> for CurrentUser {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let ctx = Context::from_request_parts(parts, state).await?;
        state
            .guard
            .user(&ctx)
            .await?
            .map(CurrentUser)
            .ok_or_else(not_authenticated)
    }
}
