use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq)]
pub enum TreeError {
    #[error("timed out after {timeout_ms} ms waiting for the {what} lock")]
    LockTimeout {
        what:       &'static str,
        timeout_ms: u64,
    },

    #[error("timed out after {timeout_ms} ms waiting to begin a transaction")]
    TransactionTimeout { timeout_ms: u64 },

    #[error("tree configuration error: {0}")]
    Config(String),
}

pub type TreeResult<T> = Result<T, TreeError>;
