use async_trait::async_trait;
use todo_core::Claims;
use todo_model::{
    AuthSession, CreateTask, Task, TaskId, TaskQuery, TaskStats, UpdateTask, UserId, UserView,
};

use crate::error::ApiError;

/// Backend behind the HTTP API.
///
/// This trait abstracts the storage implementation, allowing users to:
/// - Use the provided `RepositoryAdapter`
/// - Implement custom handlers with additional logic (caching, rate limiting, etc.)
#[async_trait]
pub trait ApiHandler: Send + Sync + 'static {
    /// Create a task.
    async fn create_task(&self, input: CreateTask) -> Result<Task, ApiError>;

    /// List tasks matching `query`, newest first.
    async fn list_tasks(&self, query: TaskQuery) -> Result<Vec<Task>, ApiError>;

    /// Fetch one task; `None` if it does not exist.
    async fn get_task(&self, id: &TaskId) -> Result<Option<Task>, ApiError>;

    /// Merge `patch` into an existing task.
    async fn update_task(&self, id: &TaskId, patch: UpdateTask) -> Result<Task, ApiError>;

    /// Delete one task.
    async fn delete_task(&self, id: &TaskId) -> Result<(), ApiError>;

    /// Delete every task; returns how many were removed.
    async fn delete_all_tasks(&self) -> Result<usize, ApiError>;

    /// Aggregate counts, optionally for one owner.
    async fn task_stats(&self, user_id: Option<UserId>) -> Result<TaskStats, ApiError>;

    /// Create an account.
    async fn register(&self, email: &str, password: &str, name: &str)
    -> Result<AuthSession, ApiError>;

    /// Exchange credentials for a session.
    async fn login(&self, email: &str, password: &str) -> Result<AuthSession, ApiError>;

    /// Validate a bearer token.
    fn verify_token(&self, token: &str) -> Result<Claims, ApiError>;

    /// Public view of a user.
    async fn user(&self, id: &str) -> Result<Option<UserView>, ApiError>;
}
