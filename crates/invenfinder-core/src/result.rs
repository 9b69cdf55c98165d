//! Convenience result type alias for Invenfinder.

use crate::error::AppError;

/// A specialized `Result` type for Invenfinder operations.
pub type AppResult<T> = Result<T, AppError>;
