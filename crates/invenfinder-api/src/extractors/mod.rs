//! Custom Axum extractors.

pub mod auth;
pub mod body;

pub use auth::{Context, CurrentSession, CurrentUser};
pub use body::{JsonBody, LoginCredentials};
