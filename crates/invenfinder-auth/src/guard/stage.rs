//! Composable request-blocking stages.
//!
//! A [`Pipeline`] runs its stages in order and stops at the first
//! rejection. Stages only see the [`AccessGuard`] and the
//! [`RequestContext`], so they can be exercised without an HTTP server.

use std::sync::Arc;

use async_trait::async_trait;

use invenfinder_core::error::AppError;
use invenfinder_core::result::AppResult;
use invenfinder_entity::user::{Permission, permission};

use super::access::AccessGuard;
use super::context::RequestContext;

/// What a stage decided about a request.
#[derive(Debug)]
pub enum Outcome {
    /// Let the request through to the next stage or the handler.
    Continue,
    /// Stop and answer with this error.
    Reject(AppError),
}

impl Outcome {
    /// Whether the request may proceed.
    pub fn is_continue(&self) -> bool {
        matches!(self, Self::Continue)
    }
}

/// One step of request admission.
///
/// `Err` is reserved for infrastructure failures; refusals are
/// `Ok(Outcome::Reject(..))`.
#[async_trait]
pub trait GuardStage: Send + Sync + std::fmt::Debug + 'static {
    /// Evaluates the request.
    async fn evaluate(&self, guard: &AccessGuard, ctx: &RequestContext) -> AppResult<Outcome>;
}

fn not_authenticated() -> Outcome {
    Outcome::Reject(AppError::not_authenticated(
        "You need to be logged in to do that",
    ))
}

/// Rejects callers without a valid session with 401.
#[derive(Debug, Clone, Copy, Default)]
pub struct RequireAuthenticated;

#[async_trait]
impl GuardStage for RequireAuthenticated {
    async fn evaluate(&self, guard: &AccessGuard, ctx: &RequestContext) -> AppResult<Outcome> {
        if guard.authenticated(ctx).await? {
            Ok(Outcome::Continue)
        } else {
            Ok(not_authenticated())
        }
    }
}

/// Rejects unauthenticated callers with 401 and callers lacking the
/// required permissions with 403.
#[derive(Debug, Clone, Copy)]
pub struct RequirePermissions {
    required: u64,
    match_any: bool,
}

impl RequirePermissions {
    /// Requires every bit of `required` (or any, with `match_any`).
    pub fn new(required: u64, match_any: bool) -> Self {
        Self {
            required,
            match_any,
        }
    }

    /// Requires all of `flags`.
    pub fn all(flags: impl IntoIterator<Item = Permission>) -> Self {
        Self::new(permission::encode(flags), false)
    }

    /// Requires at least one of `flags`.
    pub fn any(flags: impl IntoIterator<Item = Permission>) -> Self {
        Self::new(permission::encode(flags), true)
    }
}

#[async_trait]
impl GuardStage for RequirePermissions {
    async fn evaluate(&self, guard: &AccessGuard, ctx: &RequestContext) -> AppResult<Outcome> {
        if !guard.authenticated(ctx).await? {
            return Ok(not_authenticated());
        }
        if guard
            .has_permissions(ctx, self.required, self.match_any)
            .await?
        {
            return Ok(Outcome::Continue);
        }
        Ok(Outcome::Reject(AppError::not_authorized(
            "You don't have permission to do that",
        )))
    }
}

/// An ordered list of stages.
#[derive(Debug, Clone, Default)]
pub struct Pipeline {
    stages: Vec<Arc<dyn GuardStage>>,
}

impl Pipeline {
    /// An empty pipeline that admits everything.
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a stage.
    pub fn then(mut self, stage: impl GuardStage) -> Self {
        self.stages.push(Arc::new(stage));
        self
    }

    /// Runs the stages in order, stopping at the first rejection.
    pub async fn run(&self, guard: &AccessGuard, ctx: &RequestContext) -> AppResult<Outcome> {
        for stage in &self.stages {
            if let Outcome::Reject(error) = stage.evaluate(guard, ctx).await? {
                return Ok(Outcome::Reject(error));
            }
        }
        Ok(Outcome::Continue)
    }
}
