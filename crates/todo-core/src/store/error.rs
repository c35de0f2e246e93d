use thiserror::Error;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("failed to open store at {path}: {reason}")]
    Open { path: String, reason: String },

    #[error("store {op} failed for '{key}': {reason}")]
    Operation {
        op: &'static str,
        key: String,
        reason: String,
    },
}

impl StoreError {
    /// Build an operation failure carrying the failing operation and its key (or prefix).
    pub fn operation(op: &'static str, key: impl Into<String>, err: impl std::fmt::Display) -> Self {
        StoreError::Operation {
            op,
            key: key.into(),
            reason: err.to_string(),
        }
    }

    /// Name of the failing operation, if it was an operation failure.
    pub fn op(&self) -> Option<&'static str> {
        match self {
            StoreError::Operation { op, .. } => Some(op),
            StoreError::Open { .. } => None,
        }
    }
}
