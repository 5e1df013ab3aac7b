//! Shared test helpers for creating ZipFetcher instances in tests.

use crate::config::Config;
use crate::manager::ZipFetcher;
use crate::types::Event;
use tempfile::tempdir;

/// Helper to create a test ZipFetcher with tempdir-backed storage.
/// Returns the fetcher and the tempdir (which must be kept alive).
pub(crate) fn create_test_fetcher() -> (ZipFetcher, tempfile::TempDir) {
    create_test_fetcher_with_limits(3, 3)
}

/// Like [`create_test_fetcher`] but with explicit quota and admission limits.
pub(crate) fn create_test_fetcher_with_limits(
    max_files_per_task: usize,
    max_active_tasks: usize,
) -> (ZipFetcher, tempfile::TempDir) {
    let temp_dir = tempdir().unwrap();

    let mut config = Config::default();
    config.limits.max_files_per_task = max_files_per_task;
    config.limits.max_active_tasks = max_active_tasks;
    config.storage.staging_dir = temp_dir.path().join("staging");
    config.storage.archive_dir = temp_dir.path().join("archives");

    let fetcher = ZipFetcher::new(config).unwrap();
    (fetcher, temp_dir)
}

/// Receive events until one matches `pred`, with a guard against hangs.
pub(crate) async fn wait_for_event(
    rx: &mut tokio::sync::broadcast::Receiver<Event>,
    mut pred: impl FnMut(&Event) -> bool,
) -> Event {
    tokio::time::timeout(std::time::Duration::from_secs(5), async {
        loop {
            let event = rx.recv().await.expect("event channel closed");
            if pred(&event) {
                return event;
            }
        }
    })
    .await
    .expect("timed out waiting for event")
}
