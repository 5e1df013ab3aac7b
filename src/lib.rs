//! # zipfetch
//!
//! Embeddable batch URL fetcher that bundles downloads into zip archives.
//!
//! A task collects a fixed number of file URLs; once the quota is reached the
//! files are fetched in the background, filtered against an extension
//! allowlist, and the survivors are bundled into a single zip archive. Tasks
//! with at least one archived file finish as `done`, tasks where everything
//! failed finish as `error`, and per-URL failures are reported either way.
//!
//! ## Design Philosophy
//!
//! zipfetch is designed to be:
//! - **Sensible defaults** - Works out of the box with zero configuration
//! - **Library-first** - Embed it in your own binary; the REST API is optional
//! - **Event-driven** - Consumers subscribe to events, no polling required
//! - **Bounded** - Admission and per-task quotas keep resource use predictable
//!
//! ## Quick Start
//!
//! ```no_run
//! use zipfetch::{Config, ZipFetcher};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let fetcher = ZipFetcher::new(Config::default())?;
//!
//!     // Subscribe to events
//!     let mut events = fetcher.subscribe();
//!     tokio::spawn(async move {
//!         while let Ok(event) = events.recv().await {
//!             println!("Event: {event:?}");
//!         }
//!     });
//!
//!     // Create a task and feed it file URLs
//!     let task = fetcher.create_task().await?;
//!     fetcher
//!         .add_file(&task.id, "https://files.example.com/report.pdf")
//!         .await?;
//!
//!     Ok(())
//! }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::unwrap_used)]
#![warn(clippy::expect_used)]

/// REST API module
pub mod api;
/// Configuration types
pub mod config;
/// Error types
pub mod error;
/// Task identifier generation
mod id;
/// Core fetcher implementation (decomposed into focused submodules)
pub mod manager;
/// Fetch-validate-archive pipeline
mod pipeline;
/// Core types and events
pub mod types;

// Re-export commonly used types
pub use config::Config;
pub use error::{ApiError, Error, ErrorDetail, Result, ToHttpStatus};
pub use manager::ZipFetcher;
pub use types::{Event, FileFailure, TaskId, TaskInfo, TaskStatus};

/// Helper function to run the fetcher with graceful signal handling.
///
/// Waits for a termination signal and then calls the fetcher's `shutdown()` method.
///
/// - **Unix:** listens for SIGTERM and SIGINT, with fallbacks if signal registration fails.
/// - **Windows/other:** listens for Ctrl+C via `tokio::signal::ctrl_c()`.
///
/// # Example
///
/// ```no_run
/// use zipfetch::{Config, ZipFetcher, run_with_shutdown};
///
/// #[tokio::main]
/// async fn main() -> Result<(), Box<dyn std::error::Error>> {
///     let fetcher = ZipFetcher::new(Config::default())?;
///
///     // Run with automatic signal handling
///     run_with_shutdown(fetcher).await?;
///
///     Ok(())
/// }
/// ```
pub async fn run_with_shutdown(fetcher: ZipFetcher) -> Result<()> {
    wait_for_signal().await;
    fetcher.shutdown().await;
    Ok(())
}

#[cfg(unix)]
async fn wait_for_signal() {
    use tokio::signal::unix::{SignalKind, signal};

    // Set up signal handlers - these may fail in restricted environments (containers, tests)
    let sigterm_result = signal(SignalKind::terminate());
    let sigint_result = signal(SignalKind::interrupt());

    match (sigterm_result, sigint_result) {
        (Ok(mut sigterm), Ok(mut sigint)) => {
            tokio::select! {
                _ = sigterm.recv() => {
                    tracing::info!("Received SIGTERM signal");
                }
                _ = sigint.recv() => {
                    tracing::info!("Received SIGINT signal (Ctrl+C)");
                }
            }
        }
        (Err(e), _) => {
            tracing::warn!(error = %e, "Could not register SIGTERM handler, waiting for SIGINT only");
            if let Ok(mut sigint) = signal(SignalKind::interrupt()) {
                sigint.recv().await;
                tracing::info!("Received SIGINT signal (Ctrl+C)");
            } else {
                tracing::error!("Could not register any signal handlers, using ctrl_c fallback");
                tokio::signal::ctrl_c().await.ok();
            }
        }
        (_, Err(e)) => {
            tracing::warn!(error = %e, "Could not register SIGINT handler, waiting for SIGTERM only");
            if let Ok(mut sigterm) = signal(SignalKind::terminate()) {
                sigterm.recv().await;
                tracing::info!("Received SIGTERM signal");
            } else {
                tracing::error!("Could not register any signal handlers, using ctrl_c fallback");
                tokio::signal::ctrl_c().await.ok();
            }
        }
    }
}

#[cfg(not(unix))]
async fn wait_for_signal() {
    match tokio::signal::ctrl_c().await {
        Ok(()) => {
            tracing::info!("Received Ctrl+C signal");
        }
        Err(e) => {
            tracing::error!(error = %e, "Failed to listen for Ctrl+C signal");
        }
    }
}
