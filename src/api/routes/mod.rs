//! Route handlers for the REST API
//!
//! Handlers are organized by domain:
//! - [`tasks`] - Task management and archive retrieval
//! - [`system`] - Health, events, OpenAPI, shutdown

use serde::{Deserialize, Serialize};

mod system;
mod tasks;

// Re-export all handlers so `routes::function_name` continues to work
pub use system::*;
pub use tasks::*;

// ============================================================================
// Request Types (shared across handlers)
// ============================================================================

/// Request body for POST /tasks/:id/files
#[derive(Debug, Deserialize, Serialize, utoipa::ToSchema)]
pub struct AddFileRequest {
    /// URL of the remote file to fetch
    pub url: String,
}
