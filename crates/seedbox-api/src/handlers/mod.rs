//! HTTP handlers, one module per domain.

pub mod files;
pub mod health;
pub mod storage;
pub mod torrents;

use axum::http::{HeaderMap, header};
use validator::Validate;

use seedbox_core::error::AppError;
use seedbox_core::result::AppResult;

/// Run `validator` rules, reporting the first message as a validation error.
pub(crate) fn validated<T: Validate>(value: T) -> AppResult<T> {
    value.validate().map_err(|errors| {
        let message = errors
            .field_errors()
            .values()
            .flat_map(|errs| errs.iter())
            .find_map(|e| e.message.as_ref().map(|m| m.to_string()))
            .unwrap_or_else(|| "Invalid request".to_string());
        AppError::validation(message)
    })?;
    Ok(value)
}

/// The raw `Range` header, if any.
pub(crate) fn range_header(headers: &HeaderMap) -> Option<&str> {
    headers.get(header::RANGE).and_then(|v| v.to_str().ok())
}
