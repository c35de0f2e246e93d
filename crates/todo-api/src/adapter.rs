use std::sync::Arc;

use async_trait::async_trait;
use todo_core::{AuthService, Claims, TaskRepository};
use todo_model::{
    AuthSession, CreateTask, Task, TaskId, TaskQuery, TaskStats, UpdateTask, UserId, UserView,
};

use crate::error::ApiError;
use crate::handler::ApiHandler;

/// Adapter that bridges the repositories to `ApiHandler`.
///
/// This is a ready-to-use implementation that directly delegates to `TaskRepository` and `AuthService`.
pub struct RepositoryAdapter {
    tasks: TaskRepository,
    auth: Arc<AuthService>,
}

impl RepositoryAdapter {
    /// Create a new adapter wrapping the given repository and auth service.
    pub fn new(tasks: TaskRepository, auth: Arc<AuthService>) -> Self {
        Self { tasks, auth }
    }
}

#[async_trait]
impl ApiHandler for RepositoryAdapter {
    async fn create_task(&self, input: CreateTask) -> Result<Task, ApiError> {
        self.tasks.create(input).await.map_err(ApiError::from)
    }

    async fn list_tasks(&self, query: TaskQuery) -> Result<Vec<Task>, ApiError> {
        self.tasks.find_all(&query).await.map_err(ApiError::from)
    }

    async fn get_task(&self, id: &TaskId) -> Result<Option<Task>, ApiError> {
        self.tasks.find_by_id(id).await.map_err(ApiError::from)
    }

    async fn update_task(&self, id: &TaskId, patch: UpdateTask) -> Result<Task, ApiError> {
        self.tasks.update(id, patch).await.map_err(ApiError::from)
    }

    async fn delete_task(&self, id: &TaskId) -> Result<(), ApiError> {
        self.tasks.delete(id).await.map_err(ApiError::from)
    }

    async fn delete_all_tasks(&self) -> Result<usize, ApiError> {
        self.tasks.delete_all().await.map_err(ApiError::from)
    }

    async fn task_stats(&self, user_id: Option<UserId>) -> Result<TaskStats, ApiError> {
        self.tasks
            .stats(user_id.as_deref())
            .await
            .map_err(ApiError::from)
    }

    async fn register(
        &self,
        email: &str,
        password: &str,
        name: &str,
    ) -> Result<AuthSession, ApiError> {
        self.auth
            .register(email, password, name)
            .await
            .map_err(ApiError::from)
    }

    async fn login(&self, email: &str, password: &str) -> Result<AuthSession, ApiError> {
        self.auth.login(email, password).await.map_err(ApiError::from)
    }

    fn verify_token(&self, token: &str) -> Result<Claims, ApiError> {
        self.auth.verify_token(token).map_err(ApiError::from)
    }

    async fn user(&self, id: &str) -> Result<Option<UserView>, ApiError> {
        self.auth.user(id).await.map_err(ApiError::from)
    }
}
