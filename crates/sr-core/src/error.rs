//! Framework error type.
//!
//! Sub-crates define their own error enums and convert `CoreError` into them
//! via `From` impls.

use thiserror::Error;

use crate::Timestamp;

/// Errors raised while constructing core value types.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum CoreError {
    #[error("invalid resource path {path:?}: {reason}")]
    InvalidPath { path: String, reason: &'static str },

    #[error("invalid time range: start {start} is after end {end}")]
    InvalidRange { start: Timestamp, end: Timestamp },

    #[error("step size must be positive, got {0}")]
    InvalidStep(i64),
}

/// Shorthand result type for `sr-core`.
pub type CoreResult<T> = Result<T, CoreError>;
