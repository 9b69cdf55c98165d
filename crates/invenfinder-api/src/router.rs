//! Route definitions for the Invenfinder HTTP API.
//!
//! All routes are mounted under `/api` behind the default per-IP limiter.
//! Route groups add their own guard pipelines with `route_layer`, so a
//! group's stages only run for requests that matched one of its routes.

use axum::{
    Router, middleware as axum_middleware,
    routing::{delete, get, patch, post},
};
use tower_http::trace::TraceLayer;

use invenfinder_auth::guard::{RequireAuthenticated, RequirePermissions};
use invenfinder_auth::rate_limit::BySession;
use invenfinder_auth::{Pipeline, RateLimitStage};
use invenfinder_entity::user::Permission;

use crate::handlers;
use crate::middleware::context::attach_context;
use crate::middleware::cors::build_cors_layer;
use crate::middleware::guard::{GuardState, enforce};
use crate::middleware::logging::request_logging;
use crate::state::AppState;

/// Build the complete Axum router with all routes and middleware.
pub fn build_router(state: AppState) -> Router {
    let limits = &state.config.rate_limit;
    let default_limit = Pipeline::new().then(RateLimitStage::new(
        state.rate_limiter.clone(),
        "default",
        limits.default,
    ));

    let api_routes = Router::new()
        .merge(public_routes())
        .merge(credential_routes(&state))
        .merge(account_routes(&state))
        .merge(session_routes(&state))
        .merge(admin_routes(&state))
        .layer(axum_middleware::from_fn_with_state(
            GuardState::new(&state, default_limit),
            enforce,
        ));

    Router::new()
        .nest("/api", api_routes)
        .layer(axum_middleware::from_fn_with_state(
            state.clone(),
            attach_context,
        ))
        .layer(TraceLayer::new_for_http())
        .layer(build_cors_layer(&state.config.server.cors))
        .layer(axum_middleware::from_fn(request_logging))
        .with_state(state)
}

/// Health check and provider listing (no auth required)
fn public_routes() -> Router<AppState> {
    Router::new()
        .route("/health", get(handlers::health::health))
        .route("/sso/providers", get(handlers::sso::list_providers))
}

/// Register and login, throttled by the `login` bucket
fn credential_routes(state: &AppState) -> Router<AppState> {
    let pipeline = Pipeline::new().then(RateLimitStage::new(
        state.rate_limiter.clone(),
        "login",
        state.config.rate_limit.login,
    ));

    Router::new()
        .route("/register", post(handlers::auth::register))
        .route("/login", post(handlers::auth::login))
        .route_layer(axum_middleware::from_fn_with_state(
            GuardState::new(state, pipeline),
            enforce,
        ))
}

/// The caller's own account
fn account_routes(state: &AppState) -> Router<AppState> {
    Router::new()
        .route("/auth", get(handlers::auth::check))
        .route("/me", get(handlers::auth::me).patch(handlers::auth::update_me))
        .route("/logout", get(handlers::auth::logout))
        .route_layer(axum_middleware::from_fn_with_state(
            GuardState::new(state, Pipeline::new().then(RequireAuthenticated)),
            enforce,
        ))
}

/// The caller's sessions, throttled per session by the `user` bucket
fn session_routes(state: &AppState) -> Router<AppState> {
    let pipeline = Pipeline::new().then(RequireAuthenticated).then(
        RateLimitStage::new(
            state.rate_limiter.clone(),
            "user",
            state.config.rate_limit.user,
        )
        .keyed_by(BySession),
    );

    Router::new()
        .route(
            "/sessions",
            get(handlers::session::list_sessions).delete(handlers::session::delete_all_sessions),
        )
        .route("/sessions/{id}", delete(handlers::session::delete_session))
        .route_layer(axum_middleware::from_fn_with_state(
            GuardState::new(state, pipeline),
            enforce,
        ))
}

/// User administration, requires `MANAGE_USERS`
fn admin_routes(state: &AppState) -> Router<AppState> {
    let pipeline = Pipeline::new().then(RequirePermissions::all([Permission::ManageUsers]));

    Router::new()
        .route("/users", post(handlers::user::create_user))
        .route("/users/{username}", patch(handlers::user::update_user))
        .route_layer(axum_middleware::from_fn_with_state(
            GuardState::new(state, pipeline),
            enforce,
        ))
}
