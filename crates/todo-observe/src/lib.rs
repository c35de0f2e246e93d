//! Process-wide `tracing` setup for the todo services.
//!
//! ```no_run
//! use todo_observe::{LoggerConfig, LoggerFormat, logger_init};
//!
//! let cfg = LoggerConfig {
//!     format: LoggerFormat::Json,
//!     level: "todo_core=debug,info".into(),
//!     ..Default::default()
//! };
//! logger_init(&cfg).expect("logger");
//! ```

mod config;
pub use config::{LoggerConfig, LoggerFormat};

mod error;
pub use error::LoggerError;

mod init;
pub use init::logger_init;
