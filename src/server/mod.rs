//! HTTP front-end
//!
//! REST API for uploading datasets, running pipelines and downloading the
//! resulting model artifacts.

mod api;
mod error;
mod handlers;
mod state;

pub use api::create_router;
pub use error::ServerError;
pub use state::AppState;

use crate::config::AppConfig;
use std::net::SocketAddr;
use std::sync::Arc;
use tracing::{error, info};

/// Start the server with the given configuration
pub async fn run_server(config: AppConfig) -> anyhow::Result<()> {
    let start_time = chrono::Utc::now();
    info!(
        upload_dir = %config.upload_dir.display(),
        models_dir = %config.models_dir.display(),
        started_at = %start_time.to_rfc3339(),
        "Initializing server directories"
    );

    std::fs::create_dir_all(&config.upload_dir)?;
    std::fs::create_dir_all(&config.models_dir)?;

    let state = Arc::new(AppState::new(config.clone()));
    let app = create_router(state);

    let addr: SocketAddr = config.bind_address().parse()?;
    info!(
        host = %config.host,
        port = config.port,
        address = %addr,
        max_upload_size_mb = config.max_upload_size / 1024 / 1024,
        "ML Builder server starting"
    );
    info!(url = %format!("http://{}/api/health", addr), "Health endpoint available");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!(address = %addr, pid = std::process::id(), "Server listening and ready to accept connections");

    // Graceful shutdown on ctrl+c
    let shutdown_signal = async move {
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!(error = %e, "Failed to listen for shutdown signal");
            return;
        }
        let stop_time = chrono::Utc::now();
        let uptime = stop_time.signed_duration_since(start_time);
        info!(
            stopped_at = %stop_time.to_rfc3339(),
            uptime_secs = uptime.num_seconds(),
            "Shutdown signal received, stopping server gracefully"
        );
    };

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal)
        .await?;

    info!("Server shut down cleanly");
    Ok(())
}
