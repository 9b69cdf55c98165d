//! # invenfinder-api
//!
//! HTTP API layer for Invenfinder built on Axum.
//!
//! Provides the auth endpoints, the request-context and guard middleware,
//! extractors, DTOs, and error mapping.

pub mod dto;
pub mod error;
pub mod extractors;
pub mod handlers;
pub mod middleware;
pub mod router;
pub mod state;

pub use error::{ApiError, ApiResult};
pub use router::build_router;
pub use state::AppState;
