//! Task creation, file appends and status queries.

use crate::error::{Error, Result};
use crate::types::{Event, TaskId, TaskInfo};

use super::store::Task;
use super::ZipFetcher;

impl ZipFetcher {
    /// Create a new empty task
    ///
    /// Admission is atomic: the active-task cap is checked and the task is
    /// inserted under a single lock, so concurrent callers can never
    /// overshoot `max_active_tasks`. The slot is held until the task settles
    /// as done or error.
    ///
    /// # Errors
    ///
    /// Returns [`Error::AdmissionDenied`] when the cap is reached and
    /// [`Error::ShuttingDown`] once shutdown has begun.
    pub async fn create_task(&self) -> Result<TaskInfo> {
        if !self
            .accepting_new
            .load(std::sync::atomic::Ordering::SeqCst)
        {
            return Err(Error::ShuttingDown);
        }

        let id = crate::id::new_task_id();
        let info = self
            .store
            .try_insert(Task::new(id.clone()), self.config.limits.max_active_tasks)
            .await?;

        tracing::info!(task_id = %id, "Task created");
        self.emit_event(Event::TaskCreated { id });

        Ok(info)
    }

    /// Append a URL to a pending task
    ///
    /// When the append fills the task's file quota, that same call flips the
    /// task to in-progress and hands its files to a background processing
    /// run. Exactly one append observes the handoff, so a task is never
    /// dispatched twice.
    ///
    /// # Errors
    ///
    /// Returns [`Error::TaskNotFound`] for an unknown ID,
    /// [`Error::FileLimitReached`] once the quota is full and
    /// [`Error::ShuttingDown`] once shutdown has begun.
    pub async fn add_file(&self, id: &TaskId, url: &str) -> Result<()> {
        if !self
            .accepting_new
            .load(std::sync::atomic::Ordering::SeqCst)
        {
            return Err(Error::ShuttingDown);
        }

        let outcome = self
            .store
            .append_file(id, url.to_string(), self.config.limits.max_files_per_task)
            .await?;

        tracing::debug!(task_id = %id, url, file_count = outcome.file_count, "file added");
        self.emit_event(Event::FileAdded {
            id: id.clone(),
            url: url.to_string(),
            file_count: outcome.file_count,
        });

        if let Some(files) = outcome.dispatch {
            self.emit_event(Event::ProcessingStarted {
                id: id.clone(),
                file_count: files.len(),
            });
            self.spawn_processing(id.clone(), files);
        }

        Ok(())
    }

    /// Get a point-in-time snapshot of a task
    ///
    /// # Errors
    ///
    /// Returns [`Error::TaskNotFound`] for an unknown ID.
    pub async fn get_task(&self, id: &TaskId) -> Result<TaskInfo> {
        self.store.get(id).await
    }

    /// List snapshots of all tasks, oldest first
    pub async fn list_tasks(&self) -> Vec<TaskInfo> {
        self.store.list().await
    }

    /// Number of tasks currently holding an admission slot
    pub async fn active_count(&self) -> usize {
        self.store.active_count().await
    }

    /// Read the finished archive for a task
    ///
    /// # Errors
    ///
    /// Returns [`Error::TaskNotFound`] for an unknown ID and
    /// [`Error::ArchiveNotReady`] while the task has no archive, including
    /// the case where the archive file has since been removed from disk.
    pub async fn read_archive(&self, id: &TaskId) -> Result<Vec<u8>> {
        let info = self.store.get(id).await?;
        if info.archive_url.is_none() {
            return Err(Error::ArchiveNotReady { id: id.clone() });
        }

        let path = self.config.archive_dir().join(format!("{id}.zip"));
        tokio::fs::read(&path).await.map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                Error::ArchiveNotReady { id: id.clone() }
            } else {
                Error::Io(e)
            }
        })
    }
}
