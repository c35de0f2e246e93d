use std::sync::Arc;

use axum::{
    Router,
    extract::State,
    http::{StatusCode, header},
    response::{IntoResponse, Response},
    routing::get,
};
use tracing::error;

use todo_api::{ApiConfig, HttpApi, RepositoryAdapter};
use todo_core::{
    AuthConfig, AuthService, KvStore, MemoryStore, StoreError, TaskRepository, UserRepository,
};
use todo_prometheus::PrometheusMetrics;

use crate::config::{DbBackend, ServerConfig};

/// Open the store selected by the configuration.
pub fn open_store(config: &ServerConfig) -> Result<Arc<dyn KvStore>, StoreError> {
    match config.db_backend {
        DbBackend::Memory => Ok(Arc::new(MemoryStore::new())),
        #[cfg(feature = "sqlite")]
        DbBackend::Sqlite => Ok(Arc::new(todo_core::SqliteStore::open(&config.db_path)?)),
        #[cfg(not(feature = "sqlite"))]
        DbBackend::Sqlite => Err(StoreError::Open {
            path: config.db_path.display().to_string(),
            reason: "built without sqlite support".to_string(),
        }),
    }
}

/// Wire repositories, auth and metrics into the full HTTP router.
pub fn router(
    config: &ServerConfig,
    store: Arc<dyn KvStore>,
    metrics: Arc<PrometheusMetrics>,
) -> Router {
    let tasks = TaskRepository::new(store.clone()).with_metrics(metrics.clone());
    let users = UserRepository::new(store).with_metrics(metrics.clone());
    let auth = AuthService::new(users, &AuthConfig::new(config.jwt_secret.clone()));

    let handler = RepositoryAdapter::new(tasks, Arc::new(auth));
    let api = HttpApi::new(Arc::new(handler))
        .with_config(ApiConfig {
            require_auth: config.require_auth,
        })
        .router();

    let scrape = Router::new()
        .route("/metrics", get(render_metrics))
        .with_state(metrics);

    api.merge(scrape)
}

/// GET /metrics
async fn render_metrics(State(metrics): State<Arc<PrometheusMetrics>>) -> Response {
    match metrics.encode_text() {
        Ok(body) => (
            [(header::CONTENT_TYPE, "text/plain; version=0.0.4")],
            body,
        )
            .into_response(),
        Err(e) => {
            error!(error = %e, "failed to encode metrics");
            StatusCode::INTERNAL_SERVER_ERROR.into_response()
        }
    }
}
