//! Typed HTTP client for the todo API.
//!
//! ```no_run
//! # async fn demo() -> Result<(), todo_client::ClientError> {
//! use todo_client::TodoClient;
//!
//! let mut client = TodoClient::new("http://localhost:3000")?;
//! client.login("ada@example.com", "secret1").await?;
//! let task = client.create_task("Buy milk", "Two litres").await?;
//! client.toggle_task(&task).await?;
//! # Ok(())
//! # }
//! ```

mod error;
pub use error::ClientError;

mod client;
pub use client::TodoClient;

mod transfer;
pub use transfer::{ImportedTask, export_tasks, parse_import};
