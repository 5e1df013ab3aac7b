//! Core task orchestration split into focused submodules.
//!
//! The `ZipFetcher` struct and its methods are organized by domain:
//! - [`store`] - Task map and admission accounting under a single lock
//! - [`tasks`] - Task creation, file appends and status queries
//! - [`process`] - Background fetch-and-archive runs
//! - [`lifecycle`] - Shutdown coordination

mod lifecycle;
mod process;
mod store;
mod tasks;

// unwrap/expect are acceptable in tests for concise failure-on-error assertions
#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
pub(crate) mod test_helpers;
#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests;

use crate::config::Config;
use crate::error::Result;
use store::TaskStore;

/// Main fetcher instance (cloneable - all fields are Arc-wrapped or cheap)
#[derive(Clone)]
pub struct ZipFetcher {
    /// Task map and admission counter behind a single lock
    pub(crate) store: std::sync::Arc<TaskStore>,
    /// Event broadcast channel sender (multiple subscribers supported)
    pub(crate) event_tx: tokio::sync::broadcast::Sender<crate::types::Event>,
    /// Configuration (wrapped in Arc for sharing across tasks)
    pub(crate) config: std::sync::Arc<Config>,
    /// Shared HTTP client used by every processing run
    pub(crate) client: reqwest::Client,
    /// Tracker for background processing runs (drained on shutdown)
    pub(crate) tracker: tokio_util::task::TaskTracker,
    /// Flag to indicate whether new tasks are accepted (set to false during shutdown)
    pub(crate) accepting_new: std::sync::Arc<std::sync::atomic::AtomicBool>,
}

impl ZipFetcher {
    /// Create a new ZipFetcher instance
    ///
    /// This initializes the core components:
    /// - Builds the shared HTTP client, honoring the configured fetch timeout
    /// - Sets up the event broadcast channel
    /// - Creates the empty task store
    ///
    /// Staging and archive directories are not created here; each processing
    /// run creates what it needs on demand.
    pub fn new(config: Config) -> Result<Self> {
        let mut client_builder = reqwest::Client::builder();
        if let Some(secs) = config.fetch.timeout_secs {
            client_builder = client_builder.timeout(std::time::Duration::from_secs(secs));
        }
        let client = client_builder.build()?;

        // Create broadcast channel with buffer size of 1000 events
        // This allows multiple subscribers to receive all events independently
        let (event_tx, _rx) = tokio::sync::broadcast::channel(1000);

        Ok(Self {
            store: std::sync::Arc::new(TaskStore::new()),
            event_tx,
            config: std::sync::Arc::new(config),
            client,
            tracker: tokio_util::task::TaskTracker::new(),
            accepting_new: std::sync::Arc::new(std::sync::atomic::AtomicBool::new(true)),
        })
    }

    /// Subscribe to task events
    ///
    /// Multiple subscribers are supported. Each subscriber receives all events independently.
    /// Events are buffered, but if a subscriber falls behind by more than 1000 events,
    /// it will receive a `RecvError::Lagged` error.
    ///
    /// # Examples
    ///
    /// ```no_run
    /// use zipfetch::{Config, ZipFetcher};
    ///
    /// #[tokio::main]
    /// async fn main() -> Result<(), Box<dyn std::error::Error>> {
    ///     let fetcher = ZipFetcher::new(Config::default())?;
    ///
    ///     let mut events = fetcher.subscribe();
    ///     tokio::spawn(async move {
    ///         while let Ok(event) = events.recv().await {
    ///             println!("{event:?}");
    ///         }
    ///     });
    ///
    ///     Ok(())
    /// }
    /// ```
    pub fn subscribe(&self) -> tokio::sync::broadcast::Receiver<crate::types::Event> {
        self.event_tx.subscribe()
    }

    /// Get the current configuration
    ///
    /// The configuration is wrapped in an Arc, so this is a cheap clone operation.
    pub fn get_config(&self) -> std::sync::Arc<Config> {
        std::sync::Arc::clone(&self.config)
    }

    /// Emit an event to all subscribers
    ///
    /// If there are no active subscribers, the event is silently dropped (ok() converts Err to None).
    /// Task processing continues even if no one is listening to events.
    pub(crate) fn emit_event(&self, event: crate::types::Event) {
        // send() returns Err if there are no receivers, which is fine - we just drop the event
        self.event_tx.send(event).ok();
    }

    /// Spawn the REST API server in a background task
    ///
    /// This method spawns the API server as a separate async task using `tokio::spawn`.
    /// The server runs concurrently with task processing and listens on the configured
    /// bind address (default: 127.0.0.1:8080).
    pub fn spawn_api_server(self: &std::sync::Arc<Self>) -> tokio::task::JoinHandle<Result<()>> {
        let fetcher = self.clone();
        let config = self.config.clone();

        tokio::spawn(async move { crate::api::start_api_server(fetcher, config).await })
    }
}
