//! Password hashing and policy enforcement.

pub mod hasher;
pub mod validator;

pub use hasher::{PasswordHasher, StoredCredentials};
pub use validator::PasswordValidator;
