//! Fetch-validate-archive pipeline.
//!
//! A processing run walks the task's URLs in order: fetch the remote file,
//! check its filename against the extension allowlist, persist it into the
//! task's scratch directory, and finally bundle everything that survived
//! into one zip archive. Each URL either yields a staged file or a
//! [`FileFailure`] naming the first step that broke.
//!
//! The scratch directory lives at `<staging_dir>/<task id>` and is removed
//! when the run finishes, whichever way it went.

mod archive;

// unwrap/expect are acceptable in tests for concise failure-on-error assertions
#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests;

use std::collections::BTreeMap;
use std::ffi::OsStr;
use std::path::{Path, PathBuf};
use tokio::io::AsyncWriteExt;
use tracing::{debug, info, warn};
use url::Url;

use crate::config::Config;
use crate::types::{FileFailure, TaskId};

/// What a processing run produced
pub(crate) struct PipelineOutput {
    /// Path of the finished archive, present only when at least one file
    /// was bundled
    pub(crate) archive_path: Option<PathBuf>,
    /// Failure category per URL that did not make it
    pub(crate) failures: BTreeMap<String, FileFailure>,
    /// Number of entries written into the archive
    pub(crate) archived: usize,
}

/// Run the pipeline for one task: fetch every URL, stage the eligible
/// files, and bundle them into `<archive_dir>/<task id>.zip`.
///
/// Never returns an error; everything that can go wrong is folded into the
/// output. An absent `archive_path` with fewer failures than URLs means the
/// archive itself could not be written, which the caller turns into
/// [`FileFailure::ArchiveCreate`] entries at settlement.
pub(crate) async fn fetch_and_archive(
    client: &reqwest::Client,
    task_id: &TaskId,
    urls: &[String],
    config: &Config,
) -> PipelineOutput {
    let scratch = StagingDir::create(config.staging_dir().join(task_id.as_str())).await;
    let mut failures: BTreeMap<String, FileFailure> = BTreeMap::new();
    let mut staged: Vec<PathBuf> = Vec::new();

    for url in urls {
        match fetch_one(client, scratch.path(), url, &config.fetch.allowed_extensions).await {
            Ok(path) => {
                debug!(task_id = %task_id, url, path = %path.display(), "file staged");
                staged.push(path);
            }
            Err(failure) => {
                failures.insert(url.clone(), failure);
            }
        }
    }

    let output = if staged.is_empty() {
        info!(
            task_id = %task_id,
            failed = failures.len(),
            "no files eligible for archiving"
        );
        PipelineOutput {
            archive_path: None,
            failures,
            archived: 0,
        }
    } else {
        let archive_path = config.archive_dir().join(format!("{task_id}.zip"));
        match archive::build_archive(archive_path.clone(), staged).await {
            Ok(written) if written > 0 => {
                info!(
                    task_id = %task_id,
                    archived = written,
                    failed = failures.len(),
                    path = %archive_path.display(),
                    "archive written"
                );
                PipelineOutput {
                    archive_path: Some(archive_path),
                    failures,
                    archived: written,
                }
            }
            Ok(_) => {
                warn!(task_id = %task_id, "no entries could be added to the archive");
                PipelineOutput {
                    archive_path: None,
                    failures,
                    archived: 0,
                }
            }
            Err(e) => {
                warn!(task_id = %task_id, error = %e, "archive creation failed");
                PipelineOutput {
                    archive_path: None,
                    failures,
                    archived: 0,
                }
            }
        }
    };

    scratch.remove().await;
    output
}

/// Fetch one URL into the scratch directory.
///
/// The remote request always runs first; the allowlist is only consulted
/// once the server has answered, so a dead link reports as a download
/// failure even when its extension would have been rejected anyway.
async fn fetch_one(
    client: &reqwest::Client,
    scratch: &Path,
    url: &str,
    allowed: &[String],
) -> std::result::Result<PathBuf, FileFailure> {
    let mut response = match client.get(url).send().await {
        Ok(response) => response,
        Err(e) => {
            warn!(url, error = %e, "fetch failed");
            return Err(FileFailure::Download);
        }
    };
    if !response.status().is_success() {
        warn!(url, status = %response.status(), "fetch returned non-success status");
        return Err(FileFailure::Download);
    }

    let Some(filename) = filename_from_url(url) else {
        debug!(url, "url path carries no filename");
        return Err(FileFailure::TypeNotAllowed);
    };
    let extension = file_extension(&filename);
    if !allowed.iter().any(|a| a == &extension) {
        debug!(url, extension, "extension not in allowlist");
        return Err(FileFailure::TypeNotAllowed);
    }

    let dest = scratch.join(&filename);
    let mut file = match tokio::fs::File::create(&dest).await {
        Ok(file) => file,
        Err(e) => {
            warn!(url, path = %dest.display(), error = %e, "scratch file create failed");
            return Err(FileFailure::Create);
        }
    };

    loop {
        match response.chunk().await {
            Ok(Some(bytes)) => {
                if let Err(e) = file.write_all(&bytes).await {
                    warn!(url, path = %dest.display(), error = %e, "write to scratch file failed");
                    return Err(FileFailure::Save);
                }
            }
            Ok(None) => break,
            Err(e) => {
                warn!(url, error = %e, "response body read failed");
                return Err(FileFailure::Save);
            }
        }
    }
    if let Err(e) = file.flush().await {
        warn!(url, path = %dest.display(), error = %e, "flush of scratch file failed");
        return Err(FileFailure::Save);
    }

    Ok(dest)
}

/// Last segment of the URL path, percent-decoded. The query string never
/// contributes to the name.
///
/// Decoding can reintroduce separators (`..%2F`, or an absolute `%2F`
/// prefix) that a later join onto the scratch directory would follow
/// outside it. The result must therefore be a bare file name; anything
/// else counts as no filename at all.
fn filename_from_url(raw: &str) -> Option<String> {
    let parsed = Url::parse(raw).ok()?;
    let segment = parsed.path_segments()?.next_back()?;
    let decoded = urlencoding::decode(segment).ok()?;
    let name = decoded.trim().to_string();
    if name.is_empty() {
        return None;
    }
    if Path::new(&name).file_name() != Some(OsStr::new(name.as_str())) {
        warn!(url = raw, "decoded filename carries path components");
        return None;
    }
    Some(name)
}

/// Suffix of `name` from its last dot onward, lowercased; empty when there
/// is no dot. A bare dotfile like ".pdf" is its own extension.
fn file_extension(name: &str) -> String {
    match name.rfind('.') {
        Some(idx) => name[idx..].to_lowercase(),
        None => String::new(),
    }
}

/// Per-task scratch directory that is removed when the run finishes.
///
/// Creation failure is only logged; the per-file create that follows will
/// surface it as [`FileFailure::Create`] for each URL.
struct StagingDir {
    path: PathBuf,
    removed: bool,
}

impl StagingDir {
    async fn create(path: PathBuf) -> Self {
        if let Err(e) = tokio::fs::create_dir_all(&path).await {
            warn!(path = %path.display(), error = %e, "could not create scratch directory");
        }
        Self {
            path,
            removed: false,
        }
    }

    fn path(&self) -> &Path {
        &self.path
    }

    /// Remove the scratch tree on the blocking pool. The drop fallback
    /// only acts when a run never reaches this point.
    async fn remove(mut self) {
        self.removed = true;
        let path = self.path.clone();
        match tokio::task::spawn_blocking(move || std::fs::remove_dir_all(&path)).await {
            Ok(Ok(())) => {}
            Ok(Err(e)) => {
                debug!(path = %self.path.display(), error = %e, "scratch directory removal failed");
            }
            Err(e) => {
                warn!(path = %self.path.display(), error = %e, "scratch removal task failed");
            }
        }
    }
}

impl Drop for StagingDir {
    fn drop(&mut self) {
        if self.removed {
            return;
        }
        if let Err(e) = std::fs::remove_dir_all(&self.path) {
            debug!(path = %self.path.display(), error = %e, "scratch directory removal failed");
        }
    }
}
