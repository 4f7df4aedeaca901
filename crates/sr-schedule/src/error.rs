use thiserror::Error;

use sr_core::{CoreError, ResourcePath};
use sr_store::StoreError;
use sr_tree::{AccessDenied, TreeError};

#[derive(Debug, Error)]
pub enum ScheduleError {
    #[error("no schedule at {0}")]
    NotFound(ResourcePath),

    #[error("a schedule already exists at {0}")]
    AlreadyExists(ResourcePath),

    #[error(transparent)]
    PermissionDenied(#[from] AccessDenied),

    #[error("structural error: {0}")]
    Structural(String),

    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    #[error(transparent)]
    Tree(#[from] TreeError),

    #[error("store error: {0}")]
    Store(#[from] StoreError),

    #[error(transparent)]
    Core(#[from] CoreError),
}

pub type ScheduleResult<T> = Result<T, ScheduleError>;
