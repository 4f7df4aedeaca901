//! Error types for sr-store.

use thiserror::Error;

use sr_core::CoreError;

/// Errors raised by a time-series store or by CSV import/export.
#[derive(Debug, Error)]
pub enum StoreError {
    /// The store was destroyed; no further operations are possible.
    #[error("time-series store has been destroyed")]
    Destroyed,

    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    #[error("sample parse error: {0}")]
    Parse(String),

    #[error(transparent)]
    Core(#[from] CoreError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[cfg(feature = "sqlite")]
    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),
}

/// Alias for `Result<T, StoreError>`.
pub type StoreResult<T> = Result<T, StoreError>;
