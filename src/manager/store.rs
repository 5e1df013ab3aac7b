//! In-memory task store.
//!
//! One async mutex guards both the task map and the active-task counter, so
//! admission checks, quota checks, and finalization each happen as a single
//! atomic step. Callers never hold the lock across I/O; every method copies
//! what it needs out and releases the guard before returning.

use chrono::{DateTime, Utc};
use std::collections::{BTreeMap, HashMap};
use tokio::sync::Mutex;

use crate::error::{Error, Result};
use crate::types::{FileFailure, TaskId, TaskInfo, TaskStatus};

/// A task as held by the store
#[derive(Clone, Debug)]
pub(crate) struct Task {
    pub(crate) id: TaskId,
    pub(crate) status: TaskStatus,
    pub(crate) files: Vec<String>,
    pub(crate) errors: BTreeMap<String, FileFailure>,
    pub(crate) archive_url: Option<String>,
    pub(crate) created_at: DateTime<Utc>,
    /// Set once the task has settled; guards the active counter against a
    /// double decrement.
    pub(crate) completed: bool,
}

impl Task {
    pub(crate) fn new(id: TaskId) -> Self {
        Self {
            id,
            status: TaskStatus::Pending,
            files: Vec::new(),
            errors: BTreeMap::new(),
            archive_url: None,
            created_at: Utc::now(),
            completed: false,
        }
    }

    fn snapshot(&self) -> TaskInfo {
        TaskInfo {
            id: self.id.clone(),
            status: self.status,
            files: self.files.clone(),
            errors: self.errors.clone(),
            archive_url: self.archive_url.clone(),
            created_at: self.created_at,
        }
    }
}

/// Task map plus the active counter, guarded together
#[derive(Default)]
struct StoreInner {
    tasks: HashMap<TaskId, Task>,
    /// Tasks counted from admission until they settle as done or error
    active: usize,
}

/// Result of appending a file to a task
#[derive(Debug)]
pub(crate) struct AppendOutcome {
    /// Number of URLs on the task after the append
    pub(crate) file_count: usize,
    /// URLs to process, present only for the append that filled the quota
    pub(crate) dispatch: Option<Vec<String>>,
}

/// In-memory task store
pub(crate) struct TaskStore {
    inner: Mutex<StoreInner>,
}

impl TaskStore {
    pub(crate) fn new() -> Self {
        Self {
            inner: Mutex::new(StoreInner::default()),
        }
    }

    /// Admit a task if the active count is below `max_active`.
    ///
    /// The check, the insert, and the counter increment happen under one
    /// lock acquisition, so two racing creations cannot both squeeze past
    /// the cap.
    pub(crate) async fn try_insert(&self, task: Task, max_active: usize) -> Result<TaskInfo> {
        let mut inner = self.inner.lock().await;

        if inner.active >= max_active {
            return Err(Error::AdmissionDenied { max: max_active });
        }

        inner.active += 1;
        let info = task.snapshot();
        inner.tasks.insert(task.id.clone(), task);
        Ok(info)
    }

    /// Snapshot a single task.
    pub(crate) async fn get(&self, id: &TaskId) -> Result<TaskInfo> {
        let inner = self.inner.lock().await;
        inner
            .tasks
            .get(id)
            .map(Task::snapshot)
            .ok_or_else(|| Error::TaskNotFound { id: id.clone() })
    }

    /// Snapshot every task, oldest first, ties broken by id.
    pub(crate) async fn list(&self) -> Vec<TaskInfo> {
        let inner = self.inner.lock().await;
        let mut infos: Vec<TaskInfo> = inner.tasks.values().map(Task::snapshot).collect();
        infos.sort_by(|a, b| {
            a.created_at
                .cmp(&b.created_at)
                .then_with(|| a.id.cmp(&b.id))
        });
        infos
    }

    /// Append a URL to a pending task.
    ///
    /// When this append is the one that fills the quota, the task flips to
    /// in_progress and the outcome carries the URLs to process. The flip
    /// happens in the same lock acquisition as the append, so exactly one
    /// caller ever observes the handoff.
    pub(crate) async fn append_file(
        &self,
        id: &TaskId,
        url: String,
        max_files: usize,
    ) -> Result<AppendOutcome> {
        let mut inner = self.inner.lock().await;
        let task = inner
            .tasks
            .get_mut(id)
            .ok_or_else(|| Error::TaskNotFound { id: id.clone() })?;

        if task.files.len() >= max_files {
            return Err(Error::FileLimitReached {
                id: id.clone(),
                limit: max_files,
            });
        }

        task.files.push(url);
        let file_count = task.files.len();

        let dispatch = if file_count == max_files && task.status == TaskStatus::Pending {
            task.status = TaskStatus::InProgress;
            Some(task.files.clone())
        } else {
            None
        };

        Ok(AppendOutcome {
            file_count,
            dispatch,
        })
    }

    /// Settle a task with the outcome of its processing run.
    ///
    /// Per-file failures are merged into the task (first failure per URL
    /// wins). `archive_url` must only be supplied when at least one file
    /// made it into the archive; its presence decides done, its absence
    /// decides error, with every not-yet-failed URL then marked
    /// [`FileFailure::ArchiveCreate`] so an errored task always explains
    /// every file. The active counter is decremented exactly once.
    ///
    /// Returns `None` when the task is unknown. Calling this twice for the
    /// same task leaves the first settlement in place.
    pub(crate) async fn finalize(
        &self,
        id: &TaskId,
        failures: BTreeMap<String, FileFailure>,
        archive_url: Option<String>,
    ) -> Option<TaskInfo> {
        let mut inner = self.inner.lock().await;
        let task = inner.tasks.get_mut(id)?;

        if task.completed {
            return Some(task.snapshot());
        }

        for (url, failure) in failures {
            task.errors.entry(url).or_insert(failure);
        }

        match archive_url {
            Some(url) => {
                task.status = TaskStatus::Done;
                task.archive_url = Some(url);
            }
            None => {
                for url in &task.files {
                    if !task.errors.contains_key(url) {
                        task.errors.insert(url.clone(), FileFailure::ArchiveCreate);
                    }
                }
                task.status = TaskStatus::Error;
            }
        }

        task.completed = true;
        let info = task.snapshot();
        inner.active = inner.active.saturating_sub(1);
        Some(info)
    }

    /// Number of tasks currently counted against the admission cap.
    pub(crate) async fn active_count(&self) -> usize {
        self.inner.lock().await.active
    }
}
