//! # invenfinder-auth
//!
//! Authentication, session management and access control for Invenfinder.
//!
//! ## Modules
//!
//! - `password`: Argon2id credential hashing and password policy
//! - `session`: Session lifecycle (create, lookup, revoke)
//! - `rate_limit`: Keyed token buckets and their background sweep
//! - `sso`: OpenID Connect provider discovery and userinfo exchange
//! - `guard`: Per-request session/user resolution and guard stages

pub mod guard;
pub mod password;
pub mod rate_limit;
pub mod session;
pub mod sso;

pub use guard::{AccessGuard, Credentials, Outcome, Pipeline, RequestContext};
pub use password::{PasswordHasher, PasswordValidator};
pub use rate_limit::{RateLimitStage, RateLimiter};
pub use session::SessionManager;
pub use sso::{IdentityVerifier, SsoDelegate, UserInfo};
