use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use tokio::signal;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use youcast_core::{
    load_config, validate_config, DownloadWorker, FfmpegTranscoder, FileFetcher, HttpFetcher,
    ItemStore, JobQueue, MediaTranscoder, SqliteItemStore, SqliteJobQueue,
};
use youcast_server::{api::create_router, state::AppState};

#[tokio::main]
async fn main() {
    if let Err(e) = run().await {
        error!("Fatal error: {:#}", e);
        std::process::exit(1);
    }
}

async fn run() -> Result<()> {
    // Initialize logging
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Determine config path
    let config_path = std::env::var("YOUCAST_CONFIG")
        .map(PathBuf::from)
        .unwrap_or_else(|_| PathBuf::from("config.toml"));

    // Load configuration
    info!("Loading configuration from {:?}", config_path);
    let config = load_config(&config_path)
        .with_context(|| format!("Failed to load config from {:?}", config_path))?;

    // Validate configuration
    validate_config(&config).context("Configuration validation failed")?;

    info!("Configuration loaded successfully");
    info!("Database path: {:?}", config.database.path);

    for dir in [&config.storage.media_dir, &config.storage.temp_dir] {
        std::fs::create_dir_all(dir)
            .with_context(|| format!("Failed to create directory {:?}", dir))?;
    }

    // Items and jobs share one database file
    let items = Arc::new(
        SqliteItemStore::new(&config.database.path).context("Failed to create item store")?,
    );
    info!("Item store initialized");

    let queue: Arc<dyn JobQueue> = Arc::new(
        SqliteJobQueue::new(&config.database.path).context("Failed to create job queue")?,
    );
    info!("Job queue initialized");

    // Start the download worker if enabled
    let cancel = CancellationToken::new();
    let worker_handle = if config.worker.enabled {
        let fetcher: Arc<dyn FileFetcher> = Arc::new(
            HttpFetcher::new(&config.fetcher, config.storage.temp_dir.clone())
                .context("Failed to create HTTP fetcher")?,
        );

        let transcoder = FfmpegTranscoder::new(config.transcoder.clone());
        if let Err(e) = transcoder.validate().await {
            warn!("Transcoder unavailable, conversions will fail: {}", e);
        }

        let worker = DownloadWorker::new(
            &config.worker,
            Arc::clone(&queue),
            items.clone(),
            fetcher,
            Arc::new(transcoder),
        );
        let token = cancel.clone();
        let poll_interval = config.worker.poll_interval();
        info!("Download worker started");
        Some(tokio::spawn(async move {
            worker.run(token, poll_interval).await
        }))
    } else {
        info!("Download worker disabled in config");
        None
    };

    // Create app state
    let items: Arc<dyn ItemStore> = items;
    let state = Arc::new(AppState::new(config.clone(), items, queue));

    // Create router
    let app = create_router(state);

    // Start server
    let addr = SocketAddr::new(config.server.host, config.server.port);
    info!("Starting server on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind to {}", addr))?;

    // Run server with graceful shutdown
    let served = axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error");

    // Stop the worker; in-flight handlers leave their claims for the next start
    cancel.cancel();
    if let Some(handle) = worker_handle {
        info!("Stopping download worker...");
        if let Err(e) = handle.await {
            error!("Download worker task failed: {}", e);
        }
        info!("Download worker stopped");
    }

    info!("Server shut down");
    served
}

/// Wait for shutdown signal (Ctrl+C or SIGTERM)
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            error!("Failed to install Ctrl+C handler: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                error!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
