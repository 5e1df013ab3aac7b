//! Application state for the API server

use crate::{Config, ZipFetcher};
use std::sync::Arc;

/// Shared application state accessible to all route handlers
///
/// This struct is cloned for each request (cheap Arc clone) and provides
/// access to the fetcher instance and configuration.
#[derive(Clone)]
pub struct AppState {
    /// The main ZipFetcher instance
    pub fetcher: Arc<ZipFetcher>,

    /// Configuration (read access for handlers)
    pub config: Arc<Config>,
}

impl AppState {
    /// Create a new AppState
    pub fn new(fetcher: Arc<ZipFetcher>, config: Arc<Config>) -> Self {
        Self { fetcher, config }
    }
}
