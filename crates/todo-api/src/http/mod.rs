use std::sync::Arc;

use axum::{
    Json, Router,
    extract::{
        Path, Query, State,
        rejection::{JsonRejection, QueryRejection},
    },
    http::{HeaderMap, Method, StatusCode, Uri},
    response::IntoResponse,
    routing::{get, post},
};
use serde::{Deserialize, Deserializer};
use serde_json::{Value, json};
use time::{OffsetDateTime, format_description::well_known::Rfc3339};
use todo_core::Claims;
use todo_model::{Task, TaskId};
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::{debug, info};

use crate::{caller, envelope::Envelope, error::ApiError, handler::ApiHandler, validate};

/// Behaviour switches of the HTTP surface.
#[derive(Debug, Clone, Copy, Default)]
pub struct ApiConfig {
    /// Reject task requests that carry no bearer token.
    pub require_auth: bool,
}

/// HTTP API service builder.
pub struct HttpApi<H> {
    handler: Arc<H>,
    config: ApiConfig,
}

struct ApiState<H> {
    handler: Arc<H>,
    config: ApiConfig,
}

type Shared<H> = State<Arc<ApiState<H>>>;

impl<H> HttpApi<H>
where
    H: ApiHandler,
{
    /// Create new HTTP API with the given handler.
    pub fn new(handler: Arc<H>) -> Self {
        Self {
            handler,
            config: ApiConfig::default(),
        }
    }

    pub fn with_config(mut self, config: ApiConfig) -> Self {
        self.config = config;
        self
    }

    /// Build axum router with mounted endpoints.
    ///
    /// Routes:
    /// - GET /api/health - Liveness
    /// - GET /api/tasks - List tasks (`filter`, `search`, `userId` query params)
    /// - POST /api/tasks - Create task
    /// - DELETE /api/tasks - Delete all tasks
    /// - GET /api/tasks/stats - Total / completed / pending counts
    /// - GET /api/tasks/{id} - Get task
    /// - PUT /api/tasks/{id} - Update task
    /// - DELETE /api/tasks/{id} - Delete task
    /// - POST /api/auth/register - Create account
    /// - POST /api/auth/login - Obtain token
    /// - GET /api/auth/me - Current user
    pub fn router(self) -> Router {
        let state = Arc::new(ApiState {
            handler: self.handler,
            config: self.config,
        });

        let api = Router::new()
            .route("/health", get(health))
            .route(
                "/tasks",
                get(list_tasks::<H>)
                    .post(create_task::<H>)
                    .delete(delete_all_tasks::<H>),
            )
            .route("/tasks/stats", get(task_stats::<H>))
            .route(
                "/tasks/{id}",
                get(get_task::<H>)
                    .put(update_task::<H>)
                    .delete(delete_task::<H>),
            )
            .route("/auth/register", post(register::<H>))
            .route("/auth/login", post(login::<H>))
            .route("/auth/me", get(me::<H>));

        Router::new()
            .route("/", get(root))
            .nest("/api", api)
            .fallback(route_not_found)
            .with_state(state)
            .layer(TraceLayer::new_for_http())
            .layer(CorsLayer::permissive())
    }
}

impl<H: ApiHandler> ApiState<H> {
    fn caller(&self, headers: &HeaderMap) -> Result<Option<Claims>, ApiError> {
        caller::identify(self.handler.as_ref(), headers, self.config.require_auth)
    }

    /// Load a task the caller is allowed to see.
    ///
    /// Another user's task is reported exactly like a missing one.
    async fn visible_task(&self, id: &TaskId, caller: Option<&Claims>) -> Result<Task, ApiError> {
        let not_found = || ApiError::NotFound(format!("Task with id {id} not found"));
        let task = self.handler.get_task(id).await?.ok_or_else(not_found)?;
        match caller {
            Some(claims) if !task.is_owned_by(claims.user_id()) => Err(not_found()),
            _ => Ok(task),
        }
    }
}

fn bad_body(rejection: JsonRejection) -> ApiError {
    ApiError::InvalidRequest(format!("Invalid request body: {}", rejection.body_text()))
}

fn bad_query(rejection: QueryRejection) -> ApiError {
    ApiError::InvalidRequest(format!("Invalid query: {}", rejection.body_text()))
}

// ============================================================================
// Request types
// ============================================================================

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ListTasksParams {
    /// all | pending | completed
    filter: Option<String>,
    /// Case-insensitive text in title or description
    search: Option<String>,
    /// Owner filter
    user_id: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct StatsParams {
    user_id: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct CreateTaskBody {
    title: Option<String>,
    description: Option<String>,
    user_id: Option<String>,
}

/// Fields are kept as raw JSON: absent is `None`, an explicit `null` is `Some(Value::Null)`.
#[derive(Debug, Deserialize)]
struct UpdateTaskBody {
    #[serde(default, deserialize_with = "present")]
    title: Option<Value>,
    #[serde(default, deserialize_with = "present")]
    description: Option<Value>,
    #[serde(default, deserialize_with = "present")]
    completed: Option<Value>,
}

fn present<'de, D>(de: D) -> Result<Option<Value>, D::Error>
where
    D: Deserializer<'de>,
{
    Value::deserialize(de).map(Some)
}

#[derive(Deserialize)]
struct RegisterBody {
    email: Option<String>,
    password: Option<String>,
    name: Option<String>,
}

#[derive(Deserialize)]
struct LoginBody {
    email: Option<String>,
    password: Option<String>,
}

// ============================================================================
// Handlers
// ============================================================================

/// GET /
async fn root() -> impl IntoResponse {
    Json(json!({
        "success": true,
        "message": "TODO App API",
        "version": env!("CARGO_PKG_VERSION"),
        "endpoints": {
            "health": "/api/health",
            "tasks": "/api/tasks",
            "auth": "/api/auth",
        },
    }))
}

/// GET /api/health
async fn health() -> impl IntoResponse {
    let timestamp = OffsetDateTime::now_utc()
        .format(&Rfc3339)
        .unwrap_or_default();
    Json(json!({
        "success": true,
        "message": "API is running",
        "timestamp": timestamp,
    }))
}

/// Anything unrouted.
async fn route_not_found(method: Method, uri: Uri) -> impl IntoResponse {
    (
        StatusCode::NOT_FOUND,
        Json(Envelope::<()>::failure(format!(
            "Route {method} {} not found",
            uri.path()
        ))),
    )
}

/// GET /api/tasks
///
/// Query params (all optional, combinable):
/// - ?filter=pending - all | pending | completed
/// - ?search=milk    - substring of title or description
/// - ?userId=u-1     - owner (ignored for authenticated callers, who only see their own)
async fn list_tasks<H>(
    State(state): Shared<H>,
    headers: HeaderMap,
    params: Result<Query<ListTasksParams>, QueryRejection>,
) -> Result<impl IntoResponse, ApiError>
where
    H: ApiHandler,
{
    let Query(params) = params.map_err(bad_query)?;
    let caller = state.caller(&headers)?;

    let mut query = validate::task_query(params.filter, params.search, params.user_id)?;
    if let Some(claims) = &caller {
        query.user_id = Some(claims.user_id().to_string());
    }

    let tasks = state.handler.list_tasks(query).await?;
    let count = tasks.len();
    debug!(count, "tasks listed");

    Ok(Json(Envelope::data(tasks).with_count(count)))
}

/// GET /api/tasks/stats
async fn task_stats<H>(
    State(state): Shared<H>,
    headers: HeaderMap,
    params: Result<Query<StatsParams>, QueryRejection>,
) -> Result<impl IntoResponse, ApiError>
where
    H: ApiHandler,
{
    let Query(params) = params.map_err(bad_query)?;
    let caller = state.caller(&headers)?;

    let owner = validate::stats_owner(params.user_id)?;
    let user_id = match caller {
        Some(claims) => Some(claims.sub),
        None => owner,
    };
    let stats = state.handler.task_stats(user_id).await?;

    Ok(Json(Envelope::data(stats)))
}

/// GET /api/tasks/{id}
async fn get_task<H>(
    State(state): Shared<H>,
    headers: HeaderMap,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, ApiError>
where
    H: ApiHandler,
{
    let caller = state.caller(&headers)?;
    let task_id = TaskId::from(id);
    debug!(%task_id, "getting task");

    let task = state.visible_task(&task_id, caller.as_ref()).await?;
    Ok(Json(Envelope::data(task)))
}

/// POST /api/tasks
async fn create_task<H>(
    State(state): Shared<H>,
    headers: HeaderMap,
    body: Result<Json<CreateTaskBody>, JsonRejection>,
) -> Result<impl IntoResponse, ApiError>
where
    H: ApiHandler,
{
    let caller = state.caller(&headers)?;
    let Json(body) = body.map_err(bad_body)?;

    let mut input = validate::create_task(body.title, body.description, body.user_id)?;
    if let Some(claims) = &caller {
        input.user_id = Some(claims.user_id().to_string());
    }

    let task = state.handler.create_task(input).await?;
    debug!(task_id = %task.id, "task created");

    Ok((
        StatusCode::CREATED,
        Json(Envelope::data(task).with_message("Task created successfully")),
    ))
}

/// PUT /api/tasks/{id}
async fn update_task<H>(
    State(state): Shared<H>,
    headers: HeaderMap,
    Path(id): Path<String>,
    body: Result<Json<UpdateTaskBody>, JsonRejection>,
) -> Result<impl IntoResponse, ApiError>
where
    H: ApiHandler,
{
    let caller = state.caller(&headers)?;
    let Json(body) = body.map_err(bad_body)?;
    let patch = validate::update_task(body.title, body.description, body.completed)?;

    let task_id = TaskId::from(id);
    if caller.is_some() {
        state.visible_task(&task_id, caller.as_ref()).await?;
    }

    let task = state.handler.update_task(&task_id, patch).await?;
    debug!(%task_id, "task updated");

    Ok(Json(
        Envelope::data(task).with_message("Task updated successfully"),
    ))
}

/// DELETE /api/tasks/{id}
async fn delete_task<H>(
    State(state): Shared<H>,
    headers: HeaderMap,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, ApiError>
where
    H: ApiHandler,
{
    let caller = state.caller(&headers)?;
    let task_id = TaskId::from(id);
    if caller.is_some() {
        state.visible_task(&task_id, caller.as_ref()).await?;
    }

    state.handler.delete_task(&task_id).await?;
    debug!(%task_id, "task deleted");

    Ok(Json(Envelope::<()>::message("Task deleted successfully")))
}

/// DELETE /api/tasks
///
/// Authenticated callers only clear their own tasks.
async fn delete_all_tasks<H>(
    State(state): Shared<H>,
    headers: HeaderMap,
) -> Result<impl IntoResponse, ApiError>
where
    H: ApiHandler,
{
    let caller = state.caller(&headers)?;

    let removed = match caller {
        None => state.handler.delete_all_tasks().await?,
        Some(claims) => {
            let query = todo_model::TaskQuery::new().with_user(claims.sub);
            let mut removed = 0;
            for task in state.handler.list_tasks(query).await? {
                match state.handler.delete_task(&task.id).await {
                    Ok(()) => removed += 1,
                    // Raced with another delete.
                    Err(ApiError::Core(e)) if e.is_not_found() => {}
                    Err(e) => return Err(e),
                }
            }
            removed
        }
    };
    info!(removed, "tasks cleared");

    Ok(Json(Envelope::<()>::message(
        "All tasks deleted successfully",
    )))
}

/// POST /api/auth/register
async fn register<H>(
    State(state): Shared<H>,
    body: Result<Json<RegisterBody>, JsonRejection>,
) -> Result<impl IntoResponse, ApiError>
where
    H: ApiHandler,
{
    let Json(body) = body.map_err(bad_body)?;
    let reg = validate::registration(body.email, body.password, body.name)?;

    let session = state
        .handler
        .register(&reg.email, &reg.password, &reg.name)
        .await?;

    Ok((StatusCode::CREATED, Json(Envelope::data(session))))
}

/// POST /api/auth/login
async fn login<H>(
    State(state): Shared<H>,
    body: Result<Json<LoginBody>, JsonRejection>,
) -> Result<impl IntoResponse, ApiError>
where
    H: ApiHandler,
{
    let Json(body) = body.map_err(bad_body)?;
    let creds = validate::credentials(body.email, body.password)?;

    let session = state.handler.login(&creds.email, &creds.password).await?;
    Ok(Json(Envelope::data(session)))
}

/// GET /api/auth/me
async fn me<H>(State(state): Shared<H>, headers: HeaderMap) -> Result<impl IntoResponse, ApiError>
where
    H: ApiHandler,
{
    let claims = caller::identify(state.handler.as_ref(), &headers, true)?
        .ok_or_else(|| ApiError::Unauthorized("No token provided".into()))?;

    let user = state
        .handler
        .user(claims.user_id())
        .await?
        .ok_or_else(|| ApiError::NotFound("User not found".into()))?;
    Ok(Json(Envelope::data(user)))
}

#[cfg(test)]
mod tests;
