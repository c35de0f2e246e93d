use std::sync::Arc;

use anyhow::Context;
use tokio::net::TcpListener;
use tracing::{info, warn};

use todo_observe::logger_init;
use todo_prometheus::PrometheusMetrics;

mod app;
mod config;

use config::ServerConfig;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // 1) Config + logger
    let dotenv = config::load_dotenv()?;
    let config = ServerConfig::from_env()?;
    logger_init(&config.logger)?;
    info!("logger initialized");
    if let Some(path) = dotenv {
        info!(path = %path.display(), "loaded .env file");
    }

    if config.uses_dev_secret() {
        warn!("JWT_SECRET is not set, using the development secret");
    }

    // 2) Storage
    let store = app::open_store(&config)
        .with_context(|| format!("opening {:?} store", config.db_backend))?;
    info!(backend = ?config.db_backend, path = %config.db_path.display(), "store ready");

    // 3) Router
    let metrics = Arc::new(PrometheusMetrics::new()?);
    let router = app::router(&config, store, metrics);

    // 4) Serve
    let addr = config.bind_addr();
    let listener = TcpListener::bind(&addr)
        .await
        .with_context(|| format!("binding {addr}"))?;
    info!(
        "server listening on {} (require_auth={})",
        listener.local_addr()?,
        config.require_auth
    );

    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("server stopped");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            warn!("failed to listen for ctrl-c: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
            }
            Err(e) => {
                warn!("failed to listen for SIGTERM: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {}
        _ = terminate => {}
    }
    info!("shutting down...");
}
