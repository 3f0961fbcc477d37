//! Middleware error types.

use sqlmeter_lang::ExtractError;
use thiserror::Error;

/// Errors raised by the middleware itself.
///
/// Errors produced by the wrapped query execution are never converted into
/// this type; they are handed back to the caller unchanged.
#[derive(Debug, Error)]
pub enum Error {
    /// The query text could not be classified.
    #[error("label extraction failed: {0}")]
    Extract(#[from] ExtractError),

    /// Registering or resolving a metric failed.
    #[error("metric registry error: {0}")]
    Registry(#[from] sqlmeter_core::Error),
}

/// Result type for middleware operations.
pub type Result<T> = std::result::Result<T, Error>;
