//! Serve command implementation.

use analytics_api::AppState;
use analytics_config::AppConfig;
use anyhow::{Context, Result};
use tokio::net::TcpListener;
use tracing::{info, warn};

use super::build_fetcher;
use crate::cli::ServeArgs;

pub async fn run(args: ServeArgs, mut config: AppConfig) -> Result<()> {
    if let Some(host) = args.host {
        config.server.host = host;
    }
    if let Some(port) = args.port {
        config.server.port = port;
    }

    let fetcher = build_fetcher(&config, args.data_dir.as_deref())?;
    let state = AppState::new(fetcher, &config);

    let addr = format!("{}:{}", config.server.host, config.server.port);
    let listener = TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind {}", addr))?;

    info!(
        app = %config.app.name,
        environment = %config.app.environment,
        min_gap_ms = config.upstream.min_gap_ms,
        stream_interval_secs = config.stream.base_interval_secs,
        "Starting stock analytics API"
    );

    analytics_api::serve(listener, state, shutdown_signal())
        .await
        .context("Server error")?;

    info!("Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    match tokio::signal::ctrl_c().await {
        Ok(()) => info!("Shutdown signal received, gracefully stopping"),
        Err(e) => {
            warn!(error = %e, "Failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    }
}
