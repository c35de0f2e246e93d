use thiserror::Error;

#[derive(Debug, Error)]
pub enum LoggerError {
    #[error("unknown log format '{0}', expected text, json or journald")]
    InvalidFormat(String),
    #[error("journald output needs Linux and the `journald` feature")]
    JournaldNotSupported,
    #[error("a global tracing subscriber is already installed")]
    AlreadyInitialized,
    #[error("cannot install tracing subscriber: {0}")]
    InitializationFailed(String),
    #[error("invalid log filter '{0}'")]
    InvalidLogLevel(String),
}
