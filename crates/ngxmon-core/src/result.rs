//! Convenience result type alias for ngxmon.

use crate::error::AppError;

/// A specialized `Result` type for ngxmon operations.
pub type AppResult<T> = Result<T, AppError>;
