mod task_id;
pub use task_id::TaskId;

mod task;
pub use task::Task;

mod task_filter;
pub use task_filter::{ParseFilterError, TaskFilter};

mod task_query;
pub use task_query::TaskQuery;

mod task_input;
pub use task_input::{CreateTask, UpdateTask};

mod task_stats;
pub use task_stats::TaskStats;

mod user;
pub use user::{AuthSession, User, UserView};

pub mod timestamp;

/// Opaque identifier of a registered user.
///
/// Tasks carry it as an optional owner reference; nothing checks that the user exists.
pub type UserId = String;
