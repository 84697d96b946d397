use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use tokio::signal;

/// Wait for a shutdown signal (SIGINT or SIGTERM).
pub async fn wait_for_shutdown() {
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
        _ = ctrl_c => {
            tracing::info!("Received Ctrl+C, finishing current run before stopping...");
        }
        _ = terminate => {
            tracing::info!("Received SIGTERM, finishing current run before stopping...");
        }
    }
}

/// Flag that flips once a shutdown signal arrives. The resolver checks it
/// between runs; a fix in flight always completes (each fix is one atomic
/// file write).
pub fn cancellation_flag() -> Arc<AtomicBool> {
    let flag = Arc::new(AtomicBool::new(false));
    let watcher = Arc::clone(&flag);

    tokio::spawn(async move {
        wait_for_shutdown().await;
        watcher.store(true, Ordering::SeqCst);
    });

    flag
}
