//! Convenience result type alias for Seatline.

use crate::error::AppError;

/// A specialized `Result` type for Seatline operations.
pub type AppResult<T> = Result<T, AppError>;
