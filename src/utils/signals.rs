//! Signal handling for graceful shutdown

use futures::stream::StreamExt;
use signal_hook::consts::{SIGINT, SIGTERM};
use signal_hook_tokio::Signals;
use tracing::{error, info};

/// Wait for SIGTERM or SIGINT.
///
/// If the handler cannot be installed the future never resolves, leaving the
/// server to run until killed.
pub async fn shutdown_signal() {
    let mut signals = match Signals::new([SIGTERM, SIGINT]) {
        Ok(signals) => signals,
        Err(e) => {
            error!("Failed to install signal handler: {}", e);
            return std::future::pending().await;
        }
    };

    if let Some(signal) = signals.next().await {
        let name = if signal == SIGTERM { "SIGTERM" } else { "SIGINT" };
        info!("Received {}", name);
    }
}
