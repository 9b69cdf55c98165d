//! Runs a guard [`Pipeline`] in front of a group of routes.

use std::sync::Arc;

use axum::extract::{Request, State};
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};

use invenfinder_auth::{AccessGuard, Outcome, Pipeline, RequestContext};
use invenfinder_core::error::AppError;

use crate::error::ApiError;
use crate::state::AppState;

/// Middleware state: the shared guard plus the stages for one route group.
#[derive(Debug, Clone)]
pub struct GuardState {
    guard: Arc<AccessGuard>,
    pipeline: Arc<Pipeline>,
}

impl GuardState {
    /// Binds `pipeline` to the application's access guard.
    pub fn new(state: &AppState, pipeline: Pipeline) -> Self {
        Self {
            guard: Arc::clone(&state.guard),
            pipeline: Arc::new(pipeline),
        }
    }
}

/// Rejects the request with the first failing stage's error.
pub async fn enforce(State(gate): State<GuardState>, request: Request, next: Next) -> Response {
    let Some(ctx) = request.extensions().get::<Arc<RequestContext>>().cloned() else {
        return ApiError(AppError::internal("Request context is missing")).into_response();
    };

    match gate.pipeline.run(&gate.guard, &ctx).await {
        Ok(Outcome::Continue) => next.run(request).await,
        Ok(Outcome::Reject(error)) => ApiError(error).into_response(),
        Err(error) => ApiError(error).into_response(),
    }
}
