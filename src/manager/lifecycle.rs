//! Shutdown coordination.

use crate::types::Event;

use super::ZipFetcher;

impl ZipFetcher {
    /// Gracefully shut down the fetcher
    ///
    /// This method performs a graceful shutdown sequence:
    /// 1. Stops accepting new tasks and file appends
    /// 2. Waits for in-flight processing runs to settle, with a 30 second timeout
    /// 3. Emits a shutdown event to subscribers
    ///
    /// Tasks still pending when shutdown begins are left as-is; they never
    /// reached their quota, so no processing run exists for them.
    pub async fn shutdown(&self) {
        tracing::info!("Initiating graceful shutdown");

        // 1. Stop accepting new tasks
        self.accepting_new
            .store(false, std::sync::atomic::Ordering::SeqCst);
        tracing::info!("Stopped accepting new tasks");

        // 2. Wait for in-flight processing runs with timeout
        self.tracker.close();
        let shutdown_timeout = std::time::Duration::from_secs(30);
        match tokio::time::timeout(shutdown_timeout, self.tracker.wait()).await {
            Ok(()) => {
                tracing::info!("All processing runs settled");
            }
            Err(_) => {
                tracing::warn!(
                    "Timeout waiting for processing runs to settle, proceeding with shutdown"
                );
            }
        }

        // 3. Emit shutdown event
        let _ = self.event_tx.send(Event::Shutdown);

        tracing::info!("Graceful shutdown complete");
    }
}
