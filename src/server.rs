//! TCP bind and serve with graceful shutdown.

use std::sync::Arc;

use anyhow::{Context, Result};
use tokio::net::TcpListener;
use tokio::signal;
use tracing::info;

use crate::api::{self, AppState};
use crate::config::Config;
use crate::logging;

/// Serve the API until SIGINT/SIGTERM.
pub async fn run(config: Config) -> Result<()> {
    let config = Arc::new(config);
    let state = Arc::new(AppState::new(config.clone()).context("Failed to build pipeline")?);
    let app = api::create_router(state);

    let addr = config.server.listen_addr();
    let listener = TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind to {addr}"))?;

    info!(
        category = logging::CATEGORY_SERVER,
        addr = %addr,
        workers = config.server.workers as u64,
        "FlowBridge listening"
    );

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    info!(category = logging::CATEGORY_SERVER, "FlowBridge stopped");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("Failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    info!(
        category = logging::CATEGORY_SERVER,
        "Shutdown signal received"
    );
}
