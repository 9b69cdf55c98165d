//! Axum middleware stack.

pub mod context;
pub mod cors;
pub mod guard;
pub mod logging;
