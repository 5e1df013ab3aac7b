//! Core types for zipfetch

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use utoipa::ToSchema;

/// Unique identifier for a task
///
/// Fixed-length lowercase hex, generated from a cryptographically secure
/// source (see [`crate::id::new_task_id`]).
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, ToSchema)]
#[serde(transparent)]
pub struct TaskId(pub String);

impl TaskId {
    /// Create a new TaskId
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Get the identifier as a string slice
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<String> for TaskId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

impl From<&str> for TaskId {
    fn from(id: &str) -> Self {
        Self(id.to_string())
    }
}

impl PartialEq<str> for TaskId {
    fn eq(&self, other: &str) -> bool {
        self.0 == other
    }
}

impl PartialEq<&str> for TaskId {
    fn eq(&self, other: &&str) -> bool {
        self.0 == *other
    }
}

impl std::fmt::Display for TaskId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Task status
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum TaskStatus {
    /// Accepting files, quota not yet reached
    Pending,
    /// Quota reached, files are being fetched and archived
    InProgress,
    /// Finished with at least one file archived
    Done,
    /// Finished with no archive (every file failed, or the archive
    /// could not be written)
    Error,
}

impl TaskStatus {
    /// Wire name of the status, as it appears in JSON
    pub fn as_str(&self) -> &'static str {
        match self {
            TaskStatus::Pending => "pending",
            TaskStatus::InProgress => "in_progress",
            TaskStatus::Done => "done",
            TaskStatus::Error => "error",
        }
    }
}

impl std::fmt::Display for TaskStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Terminal failure category for a single URL within a task
///
/// Serialized with the exact human-readable strings reported in task
/// snapshots, e.g. `"download error"`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub enum FileFailure {
    /// Fetching the URL failed (connection error or non-success HTTP status)
    #[serde(rename = "download error")]
    Download,
    /// The filename extension is not in the allowlist
    #[serde(rename = "file type not allowed")]
    TypeNotAllowed,
    /// The scratch file could not be created
    #[serde(rename = "file create error")]
    Create,
    /// The response body could not be written to the scratch file
    #[serde(rename = "file save error")]
    Save,
    /// The archive for the task could not be created
    #[serde(rename = "archive create error")]
    ArchiveCreate,
}

impl FileFailure {
    /// Wire string of the failure category, as it appears in JSON
    pub fn as_str(&self) -> &'static str {
        match self {
            FileFailure::Download => "download error",
            FileFailure::TypeNotAllowed => "file type not allowed",
            FileFailure::Create => "file create error",
            FileFailure::Save => "file save error",
            FileFailure::ArchiveCreate => "archive create error",
        }
    }
}

impl std::fmt::Display for FileFailure {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Point-in-time snapshot of a task
///
/// This is the shape returned by status queries and the REST API. Two
/// snapshots of the same settled task are identical: `errors` is an ordered
/// map, so serialization is deterministic.
#[derive(Clone, Debug, Serialize, Deserialize, ToSchema)]
pub struct TaskInfo {
    /// Task ID
    pub id: TaskId,
    /// Current status
    pub status: TaskStatus,
    /// URLs added so far, in insertion order
    pub files: Vec<String>,
    /// Failure category per failed URL (omitted while empty)
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub errors: BTreeMap<String, FileFailure>,
    /// Where the finished archive can be fetched (set once the task is done)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub archive_url: Option<String>,
    /// When the task was created
    pub created_at: DateTime<Utc>,
}

/// Event emitted during task lifecycle
#[derive(Clone, Debug, Serialize, Deserialize, ToSchema)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Event {
    /// Task admitted into the store
    TaskCreated {
        /// Task ID
        id: TaskId,
    },

    /// URL appended to a pending task
    FileAdded {
        /// Task ID
        id: TaskId,
        /// URL that was appended
        url: String,
        /// Number of URLs on the task after the append
        file_count: usize,
    },

    /// Quota reached, background processing dispatched
    ProcessingStarted {
        /// Task ID
        id: TaskId,
        /// Number of URLs handed to the pipeline
        file_count: usize,
    },

    /// Task finished with an archive
    TaskCompleted {
        /// Task ID
        id: TaskId,
        /// Number of files that made it into the archive
        archived: usize,
        /// Number of files that failed
        failed: usize,
    },

    /// Task finished without an archive
    TaskFailed {
        /// Task ID
        id: TaskId,
        /// Number of files that failed
        failed: usize,
    },

    /// Graceful shutdown initiated
    Shutdown,
}

impl Event {
    /// Wire name of the event, matching its serialized `type` tag
    pub fn kind(&self) -> &'static str {
        match self {
            Event::TaskCreated { .. } => "task_created",
            Event::FileAdded { .. } => "file_added",
            Event::ProcessingStarted { .. } => "processing_started",
            Event::TaskCompleted { .. } => "task_completed",
            Event::TaskFailed { .. } => "task_failed",
            Event::Shutdown => "shutdown",
        }
    }
}
