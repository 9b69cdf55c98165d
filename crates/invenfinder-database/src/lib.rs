//! # invenfinder-database
//!
//! Repository traits for users and sessions, with a PostgreSQL
//! implementation and a process-local in-memory implementation.

pub mod connection;
pub mod memory;
pub mod migration;
pub mod repositories;

pub use sqlx::PgPool;
pub use repositories::{SessionRepository, UserRepository};
