//! In-memory repositories.
//!
//! Process-local maps behind `tokio::sync::RwLock`, used for single-node
//! development and by the test suites. State is lost on restart.

pub mod session;
pub mod user;

pub use session::MemorySessionRepository;
pub use user::MemoryUserRepository;
