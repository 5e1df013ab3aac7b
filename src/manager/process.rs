//! Background fetch-and-archive runs.

use crate::pipeline;
use crate::types::{Event, TaskId, TaskStatus};

use super::ZipFetcher;

impl ZipFetcher {
    /// Hand a filled task to the pipeline on a tracked background task
    ///
    /// The run is registered with the task tracker so shutdown can drain it.
    /// No lock is held across the spawn; the caller already owns the only
    /// dispatch for this task.
    pub(crate) fn spawn_processing(&self, id: TaskId, files: Vec<String>) {
        let fetcher = self.clone();
        self.tracker.spawn(async move {
            fetcher.process_task(id, files).await;
        });
    }

    /// Run the pipeline for one task and settle the result in the store
    ///
    /// This never returns an error: every per-file problem is folded into
    /// the task's error map, and an unwritable archive settles the task as
    /// failed rather than tearing down the run.
    async fn process_task(&self, id: TaskId, files: Vec<String>) {
        tracing::info!(task_id = %id, file_count = files.len(), "Processing task");

        let output = pipeline::fetch_and_archive(&self.client, &id, &files, &self.config).await;

        let archived = output.archived;
        let archive_url = output
            .archive_path
            .as_ref()
            .map(|_| format!("/tasks/{id}/archive"));

        let Some(info) = self.store.finalize(&id, output.failures, archive_url).await else {
            tracing::warn!(task_id = %id, "Task disappeared before settlement");
            return;
        };

        let failed = info.errors.len();
        if info.status == TaskStatus::Done {
            tracing::info!(task_id = %id, archived, failed, "Task completed");
            self.emit_event(Event::TaskCompleted { id, archived, failed });
        } else {
            tracing::warn!(task_id = %id, failed, "Task failed");
            self.emit_event(Event::TaskFailed { id, failed });
        }
    }
}
