//! Service account rotator
//!
//! Single-binary service that:
//! 1. Loads a directory of service account key files into a pool
//! 2. Preloads Drive clients and keeps the cache topped up in the background
//! 3. Serves an operator API for rotation, rate-limit reports and metrics

mod admin;
mod config;
mod metrics;

use std::sync::Arc;
use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use sa_credential::KeyFileMaterializer;
use sa_pool::{Pool, spawn_refill_task};
use tokio::net::TcpListener;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use crate::admin::{AdminState, build_router};
use crate::config::Config;

/// How long in-flight operator requests may drain after a shutdown signal.
const DRAIN_TIMEOUT: Duration = Duration::from_secs(10);

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(
            EnvFilter::try_from_env("LOG_LEVEL")
                .or_else(|_| EnvFilter::try_from_default_env())
                .unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with(tracing_subscriber::fmt::layer().json())
        .init();

    info!("starting sa-rotator");

    // Install before the pool emits anything
    let prometheus_handle =
        metrics::install_recorder().context("failed to install Prometheus recorder")?;

    let args: Vec<String> = std::env::args().collect();
    let cli_config_path = args
        .iter()
        .position(|a| a == "--config")
        .and_then(|i| args.get(i + 1))
        .map(|s| s.as_str());

    let config_path = Config::resolve_path(cli_config_path);
    info!(path = %config_path.display(), "loading configuration");

    let config = Config::load(&config_path)
        .with_context(|| format!("failed to load config from {}", config_path.display()))?;

    info!(
        credential_dir = %config.pool.credential_dir.display(),
        active = config.pool.active_credential,
        mode = config.pool.mode.as_str(),
        max_preloaded = config.pool.max_preloaded,
        listen_addr = %config.admin.listen_addr,
        "configuration loaded"
    );

    let materializer = KeyFileMaterializer::new(config.client.timeout());
    let pool = Arc::new(Pool::new(materializer, config.pool.max_preloaded));

    let available = pool
        .load(&config.pool.credential_dir, &config.pool.active_credential)
        .await
        .with_context(|| {
            format!(
                "failed to load service accounts from {}",
                config.pool.credential_dir.display()
            )
        })?;
    if available.is_empty() {
        warn!("no service accounts besides the active one, reactive replacement will fail");
    }

    let preloaded = pool.preload(config.pool.preload_count).await;
    info!(preloaded, target = config.pool.preload_count, "initial preload complete");

    let refill_handle = spawn_refill_task(
        pool.clone(),
        config.pool.refill_interval(),
        config.pool.preload_count,
    );

    let state = AdminState {
        pool,
        mode: config.pool.mode,
        preload_count: config.pool.preload_count,
        prometheus: prometheus_handle,
        started_at: Instant::now(),
    };
    let app = build_router(state, config.admin.max_connections);

    let listen_addr = config.admin.listen_addr;
    let listener = TcpListener::bind(listen_addr)
        .await
        .with_context(|| format!("failed to bind to {listen_addr}"))?;
    info!(addr = %listen_addr, "accepting operator requests");

    // The drain timer starts when the signal fires, not when the server starts.
    let (shutdown_tx, shutdown_rx) = tokio::sync::oneshot::channel::<()>();

    let server_handle = tokio::spawn(async move {
        axum::serve(listener, app)
            .with_graceful_shutdown(async {
                let _ = shutdown_rx.await;
            })
            .await
    });

    shutdown_signal().await;
    refill_handle.abort();
    let _ = shutdown_tx.send(());

    match tokio::time::timeout(DRAIN_TIMEOUT, server_handle).await {
        Ok(Ok(Ok(()))) => info!("all in-flight requests drained"),
        Ok(Ok(Err(e))) => error!(error = %e, "server error during shutdown"),
        Ok(Err(e)) => error!(error = %e, "server task panicked"),
        Err(_) => warn!(
            drain_timeout_secs = DRAIN_TIMEOUT.as_secs(),
            "drain timeout exceeded, forcing shutdown"
        ),
    }

    info!("shutdown complete");
    Ok(())
}

/// Wait for SIGTERM or SIGINT for graceful shutdown.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!(error = %e, "failed to listen for Ctrl+C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                error!(error = %e, "failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => info!("received SIGINT, shutting down"),
        _ = terminate => info!("received SIGTERM, shutting down"),
    }
}
