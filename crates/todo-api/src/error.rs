use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use thiserror::Error;
use todo_core::CoreError;
use tracing::error;

use crate::envelope::Envelope;

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("{0}")]
    InvalidRequest(String),

    #[error("{0}")]
    NotFound(String),

    #[error("{0}")]
    Unauthorized(String),

    #[error("core error: {0}")]
    Core(#[from] CoreError),
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::InvalidRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            ApiError::Core(e) => match e {
                CoreError::TaskNotFound(_) | CoreError::UserNotFound(_) => StatusCode::NOT_FOUND,
                CoreError::EmailTaken => StatusCode::CONFLICT,
                CoreError::InvalidCredentials | CoreError::InvalidToken => {
                    StatusCode::UNAUTHORIZED
                }
                CoreError::Storage(_) | CoreError::Codec(_) | CoreError::Auth(_) => {
                    StatusCode::INTERNAL_SERVER_ERROR
                }
            },
        }
    }

    /// Message shown to clients. Server-side failures are not detailed.
    fn public_message(&self) -> String {
        match self {
            ApiError::Core(CoreError::Auth(_)) => "Internal server error".to_string(),
            ApiError::Core(CoreError::TaskNotFound(id)) => format!("Task with id {id} not found"),
            ApiError::Core(CoreError::UserNotFound(_)) => "User not found".to_string(),
            ApiError::Core(CoreError::EmailTaken) => "Email already registered".to_string(),
            ApiError::Core(CoreError::InvalidCredentials) => "Invalid credentials".to_string(),
            ApiError::Core(CoreError::InvalidToken) => "Invalid token".to_string(),
            ApiError::Core(CoreError::Storage(_) | CoreError::Codec(_)) => {
                "Database operation failed".to_string()
            }
            other => other.to_string(),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            error!(error = %self, "request failed");
        }
        let body = Envelope::<()>::failure(self.public_message());
        (status, Json(body)).into_response()
    }
}
