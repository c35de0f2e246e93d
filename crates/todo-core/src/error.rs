use thiserror::Error;
use todo_model::{TaskId, UserId};

use crate::store::StoreError;

#[derive(Debug, Error)]
pub enum CoreError {
    #[error("task with id {0} not found")]
    TaskNotFound(TaskId),

    #[error("user with id {0} not found")]
    UserNotFound(UserId),

    #[error("storage failure: {0}")]
    Storage(#[from] StoreError),

    #[error("failed to encode record: {0}")]
    Codec(#[from] serde_json::Error),

    #[error("email already registered")]
    EmailTaken,

    #[error("invalid credentials")]
    InvalidCredentials,

    #[error("invalid token")]
    InvalidToken,

    #[error("auth failure: {0}")]
    Auth(String),
}

impl CoreError {
    /// Returns `true` for the "target does not exist" outcomes.
    pub fn is_not_found(&self) -> bool {
        matches!(self, CoreError::TaskNotFound(_) | CoreError::UserNotFound(_))
    }
}
