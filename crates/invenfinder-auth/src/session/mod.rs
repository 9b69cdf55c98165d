//! Session lifecycle management.

pub mod manager;
pub mod token;

pub use manager::SessionManager;
pub use token::generate_token;
