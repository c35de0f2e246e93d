use thiserror::Error;

#[derive(Error, Debug)]
pub enum ClientError {
    #[error("invalid base url: {0}")]
    InvalidUrl(String),

    #[error("http request failed: {0}")]
    HttpRequest(#[from] reqwest::Error),

    /// The server answered with a failure envelope.
    #[error("api error ({status}): {message}")]
    Api { status: u16, message: String },

    #[error("invalid response: {0}")]
    InvalidResponse(String),

    #[error("invalid format: {0}")]
    InvalidFormat(String),
}

impl ClientError {
    /// HTTP status of an API failure, if this is one.
    pub fn status(&self) -> Option<u16> {
        match self {
            ClientError::Api { status, .. } => Some(*status),
            _ => None,
        }
    }
}
