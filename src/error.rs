//! Error types for zipfetch
//!
//! This module provides error handling for the library, including:
//! - Domain-specific error types (admission, task lookup, file quota, archive state)
//! - HTTP status code mapping for API integration
//! - Structured error responses with machine-readable error codes

use serde::{Deserialize, Serialize};
use thiserror::Error;
use utoipa::ToSchema;

use crate::types::TaskId;

/// Result type alias for zipfetch operations
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for zipfetch
///
/// This is the primary error type used throughout the library. Each variant includes
/// contextual information to help diagnose issues.
#[derive(Debug, Error)]
pub enum Error {
    /// Too many tasks in flight, creation refused
    #[error("active task limit reached: at most {max} tasks may be in flight")]
    AdmissionDenied {
        /// The configured maximum number of active tasks
        max: usize,
    },

    /// No task with the given identifier
    #[error("task {id} not found")]
    TaskNotFound {
        /// The task ID that was not found
        id: TaskId,
    },

    /// Task already holds its maximum number of files
    #[error("task {id} already has the maximum of {limit} files")]
    FileLimitReached {
        /// The task ID that is full
        id: TaskId,
        /// The configured per-task file limit
        limit: usize,
    },

    /// Archive requested before the task finished with one
    #[error("archive for task {id} is not ready")]
    ArchiveNotReady {
        /// The task ID whose archive was requested
        id: TaskId,
    },

    /// Shutdown in progress - not accepting new tasks
    #[error("shutdown in progress: not accepting new tasks")]
    ShuttingDown,

    /// Configuration error with context about which setting is invalid
    #[error("configuration error: {message}")]
    Config {
        /// Human-readable error message describing the configuration issue
        message: String,
        /// The configuration key that caused the error (e.g., "MAX_ACTIVE_TASKS")
        key: Option<String>,
    },

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Zip archive error
    #[error("archive error: {0}")]
    Archive(#[from] zip::result::ZipError),

    /// Network error
    #[error("network error: {0}")]
    Network(#[from] reqwest::Error),

    /// Background task error (panicked or cancelled worker)
    #[error("background task error: {0}")]
    Background(String),

    /// API server error
    #[error("API server error: {0}")]
    ApiServerError(String),
}

/// API error response format
///
/// This structure is returned by API endpoints when an error occurs.
/// It follows a standard format with machine-readable error codes,
/// human-readable messages, and optional contextual details.
///
/// # Example JSON Response
///
/// ```json
/// {
///   "error": {
///     "code": "task_not_found",
///     "message": "task 0f2a9c44d81b6e37 not found",
///     "details": {
///       "task_id": "0f2a9c44d81b6e37"
///     }
///   }
/// }
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ApiError {
    /// The error details
    pub error: ErrorDetail,
}

/// Detailed error information for API responses
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ErrorDetail {
    /// Machine-readable error code (e.g., "task_not_found", "validation_error")
    ///
    /// Clients can use this for programmatic error handling.
    pub code: String,

    /// Human-readable error message
    ///
    /// This is suitable for displaying to end users.
    pub message: String,

    /// Optional additional context about the error
    ///
    /// This can include fields like task_id, configured limits, etc.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<serde_json::Value>,
}

impl ApiError {
    /// Create a new API error with code and message
    pub fn new(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            error: ErrorDetail {
                code: code.into(),
                message: message.into(),
                details: None,
            },
        }
    }

    /// Create an API error with additional details
    pub fn with_details(
        code: impl Into<String>,
        message: impl Into<String>,
        details: serde_json::Value,
    ) -> Self {
        Self {
            error: ErrorDetail {
                code: code.into(),
                message: message.into(),
                details: Some(details),
            },
        }
    }

    /// Create a "validation error" error
    pub fn validation(message: impl Into<String>) -> Self {
        Self::new("validation_error", message)
    }
}

/// Convert errors to HTTP status codes for API responses
///
/// This trait maps domain errors to appropriate HTTP status codes.
pub trait ToHttpStatus {
    /// Get the HTTP status code for this error
    fn status_code(&self) -> u16;

    /// Get the machine-readable error code
    fn error_code(&self) -> &str;
}

impl ToHttpStatus for Error {
    fn status_code(&self) -> u16 {
        match self {
            // 400 Bad Request - Client error (invalid input)
            Error::Config { .. } => 400,

            // 404 Not Found
            Error::TaskNotFound { .. } => 404,
            Error::ArchiveNotReady { .. } => 404,

            // 409 Conflict - Task already holds its full quota
            Error::FileLimitReached { .. } => 409,

            // 429 Too Many Requests - Admission control refused the task
            Error::AdmissionDenied { .. } => 429,

            // 500 Internal Server Error - Server-side issues
            Error::Io(_) => 500,
            Error::Archive(_) => 500,
            Error::Background(_) => 500,
            Error::ApiServerError(_) => 500,

            // 502 Bad Gateway - External service errors
            Error::Network(_) => 502,

            // 503 Service Unavailable
            Error::ShuttingDown => 503,
        }
    }

    fn error_code(&self) -> &str {
        match self {
            Error::AdmissionDenied { .. } => "admission_denied",
            Error::TaskNotFound { .. } => "task_not_found",
            Error::FileLimitReached { .. } => "file_limit_reached",
            Error::ArchiveNotReady { .. } => "archive_not_ready",
            Error::ShuttingDown => "shutting_down",
            Error::Config { .. } => "config_error",
            Error::Io(_) => "io_error",
            Error::Archive(_) => "archive_error",
            Error::Network(_) => "network_error",
            Error::Background(_) => "background_error",
            Error::ApiServerError(_) => "api_server_error",
        }
    }
}

impl From<Error> for ApiError {
    fn from(error: Error) -> Self {
        let code = error.error_code().to_string();
        let message = error.to_string();

        // Add contextual details for specific error types
        let details = match &error {
            Error::AdmissionDenied { max } => Some(serde_json::json!({
                "max_active_tasks": max,
            })),
            Error::TaskNotFound { id } => Some(serde_json::json!({
                "task_id": id,
            })),
            Error::FileLimitReached { id, limit } => Some(serde_json::json!({
                "task_id": id,
                "max_files_per_task": limit,
            })),
            Error::ArchiveNotReady { id } => Some(serde_json::json!({
                "task_id": id,
            })),
            _ => None,
        };

        ApiError {
            error: ErrorDetail {
                code,
                message,
                details,
            },
        }
    }
}
