//! Convenience result type alias for Sono.

use crate::error::AppError;

/// A specialized `Result` type for Sono operations.
pub type AppResult<T> = Result<T, AppError>;
