//! Unified error type for all observers.
//!
//! This module provides a unified [`ObserverError`] type that wraps errors from
//! all observer implementations, and converts counter errors raised while a
//! snapshot is being collected.

use thiserror::Error;

use crate::error::CounterError;

/// Unified error type for all observer operations.
#[derive(Debug, Error)]
pub enum ObserverError {
    /// Error from the JSON observer.
    #[cfg(feature = "json")]
    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),

    /// A counter could not be read.
    #[error("counter error: {0}")]
    Counter(#[from] CounterError),
}

/// Result type for observer operations.
pub type Result<T> = std::result::Result<T, ObserverError>;
