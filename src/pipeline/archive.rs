//! Zip archive assembly.

use std::fs::File;
use std::io;
use std::path::{Path, PathBuf};
use tokio::task::spawn_blocking;
use tracing::warn;
use zip::CompressionMethod;
use zip::write::{FileOptions, ZipWriter};

use crate::error::{Error, Result};

/// Bundle `sources` into a zip archive at `archive_path`, one entry per
/// file, each named by its file name alone. Runs on the blocking pool.
///
/// Entries that cannot be read or written are skipped with a warning; the
/// archive is still produced for the rest. Returns the number of entries
/// written. Failing to create the archive file itself, or to close it, is
/// an error.
pub(crate) async fn build_archive(archive_path: PathBuf, sources: Vec<PathBuf>) -> Result<usize> {
    spawn_blocking(move || write_archive(&archive_path, &sources))
        .await
        .map_err(|e| Error::Background(format!("archive task panicked: {e}")))?
}

fn write_archive(archive_path: &Path, sources: &[PathBuf]) -> Result<usize> {
    if let Some(parent) = archive_path.parent() {
        std::fs::create_dir_all(parent)?;
    }

    let file = File::create(archive_path)?;
    let mut writer = ZipWriter::new(file);
    let options = FileOptions::default().compression_method(CompressionMethod::Deflated);

    let mut written = 0;
    for source in sources {
        let name = match source.file_name().and_then(|n| n.to_str()) {
            Some(name) => name,
            None => {
                warn!(path = %source.display(), "skipping source without a usable file name");
                continue;
            }
        };

        let mut input = match File::open(source) {
            Ok(input) => input,
            Err(e) => {
                warn!(path = %source.display(), error = %e, "skipping unreadable source file");
                continue;
            }
        };

        if let Err(e) = writer.start_file(name, options) {
            warn!(entry = name, error = %e, "skipping entry that could not be started");
            continue;
        }
        if let Err(e) = io::copy(&mut input, &mut writer) {
            warn!(entry = name, error = %e, "skipping entry that could not be written");
            continue;
        }
        written += 1;
    }

    writer.finish()?;
    Ok(written)
}
