//! Per-request identity resolution and request-blocking stages.

pub mod access;
pub mod context;
pub mod stage;

pub use access::AccessGuard;
pub use context::{Credentials, RequestContext};
pub use stage::{GuardStage, Outcome, Pipeline, RequireAuthenticated, RequirePermissions};
