//! Startup lifecycle task

use std::sync::Arc;

use tracing::{error, info};

use crate::{error::Result, worker::ServiceWorker};

/// Run install and then activate.
///
/// An install failure stops here: the worker is left redundant and never
/// activates with a partial asset set.
pub async fn lifecycle_task(worker: Arc<ServiceWorker>) -> Result<()> {
    info!("Starting worker lifecycle for {}", worker.scope());

    if let Err(e) = worker.install().await {
        error!("Worker install failed, not activating: {}", e);
        return Err(e);
    }

    worker.activate().await?;
    info!("Worker active, serving {}", worker.cache_name());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        protocol::Response,
        testing::Harness,
        worker::{WorkerMode, WorkerPhase, APP_ASSETS, CACHE_NAME},
    };

    #[tokio::test]
    async fn test_failed_install_never_activates() {
        // Nothing is routed, so every manifest fetch is a 404.
        let harness = Harness::new(CACHE_NAME, WorkerMode::Full);
        let worker = Arc::new(harness.worker);
        let phases = worker.subscribe_phase();

        assert!(lifecycle_task(Arc::clone(&worker)).await.is_err());
        assert_eq!(*phases.borrow(), WorkerPhase::Redundant);
        assert!(!harness.clients.is_claimed());
    }

    #[tokio::test]
    async fn test_install_then_activate() {
        let harness = Harness::new(CACHE_NAME, WorkerMode::Full);
        for asset in APP_ASSETS {
            harness
                .fetcher
                .route(&harness.url(asset), Response::ok("text/plain", asset));
        }
        let worker = Arc::new(harness.worker);

        lifecycle_task(Arc::clone(&worker)).await.unwrap();

        assert_eq!(worker.phase(), WorkerPhase::Activated);
        assert!(harness.clients.is_claimed());
    }
}
