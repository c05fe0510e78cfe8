//! Timer Relay - offline asset cache and notification relay
//!
//! This is the main entry point for the timer-relay application.

use std::sync::Arc;

use tokio::net::TcpListener;
use tracing::info;

use timer_relay::{
    api::create_router,
    config::Config,
    services::{CacheStore, ClientHub, DiskCacheStore, HttpFetcher, MemoryCacheStore, NotificationCenter},
    state::AppState,
    tasks::lifecycle_task,
    utils::shutdown_signal,
    worker::{Capabilities, ServiceWorker},
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = Config::parse();

    // Initialize tracing with appropriate log level
    tracing_subscriber::fmt()
        .with_env_filter(format!("timer_relay={},tower_http=info", config.log_level()))
        .init();

    info!("Starting timer-relay server v{}", env!("CARGO_PKG_VERSION"));
    info!(
        "Configuration: host={}, port={}, origin={}, cache={}, mode={:?}",
        config.host,
        config.port,
        config.origin,
        config.cache_version,
        config.mode()
    );

    let cache: Arc<dyn CacheStore> = match &config.cache_dir {
        Some(dir) => {
            info!("Caching assets on disk at {}", dir.display());
            Arc::new(DiskCacheStore::new(dir.clone())?)
        }
        None => Arc::new(MemoryCacheStore::new()),
    };
    let clients = Arc::new(ClientHub::new(config.opener.clone()));
    let notifications = Arc::new(NotificationCenter::new());

    let caps = Capabilities {
        cache,
        fetcher: Arc::new(HttpFetcher::new(config.fetch_timeout())?),
        notifications: notifications.clone(),
        clients: clients.clone(),
    };
    let worker = Arc::new(ServiceWorker::new(
        config.scope(),
        &config.cache_version,
        config.mode(),
        caps,
    )?);

    // Install and activate before serving; a failed install must not serve
    if let Err(e) = lifecycle_task(Arc::clone(&worker)).await {
        tracing::error!("{}", e);
        std::process::exit(1);
    }

    let state = Arc::new(AppState::new(
        worker,
        clients,
        notifications,
        config.port,
        config.host.clone(),
    ));

    // Create HTTP router with all endpoints
    let app = create_router(state);

    // Bind to the specified address
    let addr = config.address();
    let listener = TcpListener::bind(&addr).await?;

    info!("Server running on http://{}", addr);
    info!("Endpoints:");
    info!("  POST /sw/message           - Timer state update from a window");
    info!("  POST /sw/notificationclick - Notification button or body clicked");
    info!("  GET  /sw/clients           - Event stream for a window");
    info!("  GET  /sw/notifications     - Displayed notifications");
    info!("  GET  /sw/state             - Mirrored timer state");
    info!("  GET  /health               - Health check");
    info!("  *    /*                    - App assets, cache-first");

    // Setup graceful shutdown
    let server = axum::serve(listener, app);

    tokio::select! {
        result = server => {
            if let Err(e) = result {
                tracing::error!("Server error: {}", e);
            }
        }
        _ = shutdown_signal() => {
            info!("Shutdown signal received");
        }
    }

    info!("Server shutdown complete");
    Ok(())
}
