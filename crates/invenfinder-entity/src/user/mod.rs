//! User domain entities.

pub mod model;
pub mod permission;

pub use model::User;
pub use permission::Permission;
