mod error;
pub use error::ApiError;

mod handler;
pub use handler::ApiHandler;

mod adapter;
pub use adapter::RepositoryAdapter;

mod caller;
mod envelope;
mod validate;

mod http;
pub use http::{ApiConfig, HttpApi};

pub use axum;
