//! Offline Sync - An offline request cache and background sync coordinator
//!
//! Runs the intercepting proxy in front of the origin configured by `ORIGIN_URL`.

use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::Context;
use tokio::signal;
use tokio::task::JoinHandle;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use offline_sync::api::{create_router, AppState};
use offline_sync::cache::CacheVersion;
use offline_sync::fetch::HttpNetwork;
use offline_sync::{spawn_reconnect_task, spawn_sync_task, Config, OfflineWorker};

/// Main entry point for the offline sync proxy.
///
/// # Startup Sequence
/// 1. Initialize tracing subscriber for logging
/// 2. Load configuration from environment variables
/// 3. Build the worker (cache, queue, interceptor, coordinator)
/// 4. Install and activate the configured cache version
/// 5. Start the periodic and reconnect sync tasks
/// 6. Serve until SIGINT/SIGTERM
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Defaults to "info" level, can be overridden with RUST_LOG env var
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "offline_sync=info,tower_http=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting Offline Sync proxy");

    let config = Config::from_env();
    info!(
        "Configuration loaded: origin={}, cache_version={}, port={}, sync_interval={}s",
        config.origin_url, config.cache_version, config.server_port, config.sync_interval
    );

    let network = HttpNetwork::new(&config.origin_url, config.network_timeout())
        .context("invalid ORIGIN_URL")?;
    let worker = OfflineWorker::from_config(&config, Arc::new(network))
        .await
        .context("failed to build worker")?;
    let worker = Arc::new(worker);

    let version = CacheVersion::new(&config.cache_version).context("invalid CACHE_VERSION")?;
    let report = worker.on_install(&version).await;
    if !report.failed.is_empty() {
        warn!("Precache incomplete: {:?}", report.failed);
    }
    worker.on_activate(&version).await;

    let tasks = vec![
        spawn_sync_task(worker.clone(), config.sync_interval),
        spawn_reconnect_task(worker.clone()),
    ];
    info!("Background sync tasks started");

    let app = create_router(AppState::from(worker));

    let addr = SocketAddr::from(([0, 0, 0, 0], config.server_port));
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("failed to bind {}", addr))?;
    info!("Server listening on http://{}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal(tasks))
        .await
        .context("server error")?;

    info!("Server shutdown complete");
    Ok(())
}

/// Waits for shutdown signal (Ctrl+C or SIGTERM), then aborts background tasks.
async fn shutdown_signal(tasks: Vec<JoinHandle<()>>) {
    let ctrl_c = async {
        if let Err(err) = signal::ctrl_c().await {
            warn!("Failed to listen for Ctrl+C: {}", err);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(err) => {
                warn!("Failed to install SIGTERM handler: {}", err);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received Ctrl+C, initiating shutdown...");
        }
        _ = terminate => {
            info!("Received SIGTERM, initiating shutdown...");
        }
    }

    for task in tasks {
        task.abort();
    }
    warn!("Background sync tasks aborted");
}
