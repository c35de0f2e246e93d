pub mod auth;
pub use auth::{AuthConfig, AuthService, Claims};

pub mod clock;
pub use clock::{Clock, SystemClock};

mod codec;

pub mod error;
pub use error::CoreError;

pub mod metrics;
pub use metrics::{MetricsBackend, NoOpMetrics, Outcome};

pub mod store;
pub use store::{KvStore, MemoryStore, StoreError};
#[cfg(feature = "sqlite")]
pub use store::SqliteStore;

pub mod task;
pub use task::{TASK_PREFIX, TaskRepository};

pub mod user;
pub use user::{EMAIL_INDEX_PREFIX, USER_PREFIX, UserRepository, UserUpdate};
