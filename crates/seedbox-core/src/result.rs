//! Convenience result type alias for Seedbox.

use crate::error::AppError;

/// A specialized `Result` type for Seedbox operations.
pub type AppResult<T> = Result<T, AppError>;
