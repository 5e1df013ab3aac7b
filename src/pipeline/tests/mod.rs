use super::*;
use crate::config::Config;
use crate::types::{FileFailure, TaskId};
use std::io::Read;
use tempfile::TempDir;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn test_config(staging: &TempDir, archives: &TempDir) -> Config {
    let mut config = Config::default();
    config.storage.staging_dir = staging.path().to_path_buf();
    config.storage.archive_dir = archives.path().to_path_buf();
    config
}

async fn serve(server: &MockServer, route: &str, body: &[u8]) {
    Mock::given(method("GET"))
        .and(path(route))
        .respond_with(ResponseTemplate::new(200).set_body_bytes(body.to_vec()))
        .mount(server)
        .await;
}

/// Read a single entry out of a finished archive.
fn read_entry(archive_path: &std::path::Path, name: &str) -> String {
    let file = std::fs::File::open(archive_path).unwrap();
    let mut zip = zip::ZipArchive::new(file).unwrap();
    let mut entry = zip.by_name(name).unwrap();
    let mut contents = String::new();
    entry.read_to_string(&mut contents).unwrap();
    contents
}

// ---------------------------------------------------------------------------
// URL filename and extension helpers
// ---------------------------------------------------------------------------

#[test]
fn filename_is_last_path_segment() {
    assert_eq!(
        filename_from_url("http://files.example.com/docs/report.pdf"),
        Some("report.pdf".to_string())
    );
}

#[test]
fn filename_is_percent_decoded() {
    assert_eq!(
        filename_from_url("http://files.example.com/docs/annual%20report.pdf"),
        Some("annual report.pdf".to_string())
    );
}

#[test]
fn filename_ignores_query_string() {
    assert_eq!(
        filename_from_url("http://files.example.com/report.pdf?token=abc&v=2"),
        Some("report.pdf".to_string())
    );
}

#[test]
fn filename_missing_for_trailing_slash() {
    assert_eq!(filename_from_url("http://files.example.com/docs/"), None);
    assert_eq!(filename_from_url("http://files.example.com"), None);
}

#[test]
fn filename_missing_for_unparseable_url() {
    assert_eq!(filename_from_url("not a url at all"), None);
}

#[test]
fn filename_missing_when_decoding_introduces_separators() {
    // Decoded dot-dot segments must not survive as filenames
    assert_eq!(
        filename_from_url("http://files.example.com/..%2F..%2F..%2Fescape.pdf"),
        None
    );
    // Nor may a decoded absolute path replace the name outright
    assert_eq!(
        filename_from_url("http://files.example.com/%2Fetc%2Fpasswd.pdf"),
        None
    );
    assert_eq!(
        filename_from_url("http://files.example.com/docs%2Freport.pdf"),
        None
    );
    assert_eq!(filename_from_url("http://files.example.com/%2E%2E"), None);
}

#[test]
fn extension_is_last_dot_suffix_lowercased() {
    assert_eq!(file_extension("report.pdf"), ".pdf");
    assert_eq!(file_extension("IMG_0420.JPEG"), ".jpeg");
    assert_eq!(file_extension("bundle.tar.gz"), ".gz");
}

#[test]
fn extension_is_empty_without_a_dot() {
    assert_eq!(file_extension("README"), "");
}

#[test]
fn bare_dotfile_is_its_own_extension() {
    assert_eq!(file_extension(".pdf"), ".pdf");
}

// ---------------------------------------------------------------------------
// fetch_and_archive
// ---------------------------------------------------------------------------

#[tokio::test]
async fn bundles_every_eligible_file() {
    let server = MockServer::start().await;
    serve(&server, "/files/one.pdf", b"pdf one").await;
    serve(&server, "/files/two.jpg", b"jpg two").await;
    serve(&server, "/files/three.jpeg", b"jpeg three").await;

    let staging = TempDir::new().unwrap();
    let archives = TempDir::new().unwrap();
    let config = test_config(&staging, &archives);
    let client = reqwest::Client::new();
    let task_id = TaskId::from("feedc0de12345678");
    let urls = vec![
        format!("{}/files/one.pdf", server.uri()),
        format!("{}/files/two.jpg", server.uri()),
        format!("{}/files/three.jpeg", server.uri()),
    ];

    let output = fetch_and_archive(&client, &task_id, &urls, &config).await;

    assert!(output.failures.is_empty(), "failures: {:?}", output.failures);
    assert_eq!(output.archived, 3);
    let archive_path = output.archive_path.expect("archive should be written");
    assert_eq!(archive_path, archives.path().join("feedc0de12345678.zip"));

    assert_eq!(read_entry(&archive_path, "one.pdf"), "pdf one");
    assert_eq!(read_entry(&archive_path, "two.jpg"), "jpg two");
    assert_eq!(read_entry(&archive_path, "three.jpeg"), "jpeg three");

    assert!(
        !staging.path().join("feedc0de12345678").exists(),
        "scratch directory must be removed after the run"
    );
}

#[tokio::test]
async fn failed_fetch_is_recorded_and_the_rest_archived() {
    let server = MockServer::start().await;
    serve(&server, "/one.pdf", b"pdf one").await;
    serve(&server, "/three.jpg", b"jpg three").await;
    // /missing.pdf has no mock, so the server answers 404

    let staging = TempDir::new().unwrap();
    let archives = TempDir::new().unwrap();
    let config = test_config(&staging, &archives);
    let client = reqwest::Client::new();
    let task_id = TaskId::from("0102030405060708");
    let missing = format!("{}/missing.pdf", server.uri());
    let urls = vec![
        format!("{}/one.pdf", server.uri()),
        missing.clone(),
        format!("{}/three.jpg", server.uri()),
    ];

    let output = fetch_and_archive(&client, &task_id, &urls, &config).await;

    assert_eq!(output.archived, 2);
    assert_eq!(output.failures.len(), 1);
    assert_eq!(output.failures[&missing], FileFailure::Download);

    let archive_path = output.archive_path.expect("archive should be written");
    let file = std::fs::File::open(&archive_path).unwrap();
    let zip = zip::ZipArchive::new(file).unwrap();
    assert_eq!(zip.len(), 2, "only the fetched files are bundled");
}

#[tokio::test]
async fn disallowed_extension_is_checked_after_the_fetch() {
    let server = MockServer::start().await;
    // expect(1) asserts the request happens even though the file is rejected
    Mock::given(method("GET"))
        .and(path("/setup.exe"))
        .respond_with(ResponseTemplate::new(200).set_body_bytes(b"MZ".to_vec()))
        .expect(1)
        .mount(&server)
        .await;

    let staging = TempDir::new().unwrap();
    let archives = TempDir::new().unwrap();
    let config = test_config(&staging, &archives);
    let client = reqwest::Client::new();
    let task_id = TaskId::from("a1a2a3a4a5a6a7a8");
    let url = format!("{}/setup.exe", server.uri());

    let output = fetch_and_archive(&client, &task_id, &[url.clone()], &config).await;

    assert_eq!(output.failures[&url], FileFailure::TypeNotAllowed);
    assert!(output.archive_path.is_none());
}

#[tokio::test]
async fn url_without_a_filename_is_not_allowed() {
    let server = MockServer::start().await;
    serve(&server, "/", b"index page").await;

    let staging = TempDir::new().unwrap();
    let archives = TempDir::new().unwrap();
    let config = test_config(&staging, &archives);
    let client = reqwest::Client::new();
    let task_id = TaskId::from("b1b2b3b4b5b6b7b8");
    let url = format!("{}/", server.uri());

    let output = fetch_and_archive(&client, &task_id, &[url.clone()], &config).await;

    assert_eq!(output.failures[&url], FileFailure::TypeNotAllowed);
}

#[tokio::test]
async fn traversal_segments_cannot_escape_the_scratch_dir() {
    let server = MockServer::start().await;
    // No path matcher: the server happily answers the hostile URLs too
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_body_bytes(b"payload".to_vec()))
        .mount(&server)
        .await;

    // Staging sits two levels below the tempdir root so a dot-dot chain
    // has directories to climb out of.
    let root = TempDir::new().unwrap();
    let staging = root.path().join("work").join("staging");
    let archives = TempDir::new().unwrap();
    let mut config = Config::default();
    config.storage.staging_dir = staging.clone();
    config.storage.archive_dir = archives.path().to_path_buf();

    let client = reqwest::Client::new();
    let task_id = TaskId::from("0a0b0c0d0e0f1011");
    let relative = format!("{}/..%2F..%2F..%2Fescape.pdf", server.uri());
    let absolute = format!(
        "{}/{}",
        server.uri(),
        urlencoding::encode(&format!("{}/absolute.pdf", root.path().display()))
    );

    let output =
        fetch_and_archive(&client, &task_id, &[relative.clone(), absolute.clone()], &config).await;

    assert_eq!(output.failures[&relative], FileFailure::TypeNotAllowed);
    assert_eq!(output.failures[&absolute], FileFailure::TypeNotAllowed);
    assert!(output.archive_path.is_none());

    // Neither write may land above the task's scratch directory, and the
    // scratch tree itself is gone after the run.
    assert!(!root.path().join("escape.pdf").exists());
    assert!(!root.path().join("work").join("escape.pdf").exists());
    assert!(!root.path().join("absolute.pdf").exists());
    assert!(!staging.join(task_id.as_str()).exists());
}

#[tokio::test]
async fn all_failures_leave_no_archive() {
    let server = MockServer::start().await;
    // no mocks mounted, every fetch gets a 404

    let staging = TempDir::new().unwrap();
    let archives = TempDir::new().unwrap();
    let config = test_config(&staging, &archives);
    let client = reqwest::Client::new();
    let task_id = TaskId::from("c1c2c3c4c5c6c7c8");
    let first = format!("{}/a.pdf", server.uri());
    let second = format!("{}/b.pdf", server.uri());

    let output =
        fetch_and_archive(&client, &task_id, &[first.clone(), second.clone()], &config).await;

    assert!(output.archive_path.is_none());
    assert_eq!(output.archived, 0);
    assert_eq!(output.failures[&first], FileFailure::Download);
    assert_eq!(output.failures[&second], FileFailure::Download);
    assert!(
        !archives.path().join("c1c2c3c4c5c6c7c8.zip").exists(),
        "no archive file may be left behind when nothing was eligible"
    );
}

#[tokio::test]
async fn occupied_scratch_path_turns_into_create_failures() {
    let server = MockServer::start().await;
    serve(&server, "/one.pdf", b"pdf one").await;
    serve(&server, "/two.pdf", b"pdf two").await;

    let staging = TempDir::new().unwrap();
    let archives = TempDir::new().unwrap();
    let config = test_config(&staging, &archives);
    let client = reqwest::Client::new();
    let task_id = TaskId::from("d1d2d3d4d5d6d7d8");

    // A plain file squatting on the scratch directory path makes every
    // per-file create fail while the fetches themselves succeed.
    std::fs::write(staging.path().join(task_id.as_str()), b"squatter").unwrap();

    let first = format!("{}/one.pdf", server.uri());
    let second = format!("{}/two.pdf", server.uri());
    let output =
        fetch_and_archive(&client, &task_id, &[first.clone(), second.clone()], &config).await;

    assert_eq!(output.failures[&first], FileFailure::Create);
    assert_eq!(output.failures[&second], FileFailure::Create);
    assert!(output.archive_path.is_none());
}

#[tokio::test]
async fn unwritable_archive_dir_is_not_a_per_file_failure() {
    let server = MockServer::start().await;
    serve(&server, "/one.pdf", b"pdf one").await;

    let staging = TempDir::new().unwrap();
    let archives = TempDir::new().unwrap();
    let mut config = test_config(&staging, &archives);
    // Point the archive directory at a path occupied by a plain file
    let blocked = archives.path().join("blocked");
    std::fs::write(&blocked, b"squatter").unwrap();
    config.storage.archive_dir = blocked;

    let client = reqwest::Client::new();
    let task_id = TaskId::from("e1e2e3e4e5e6e7e8");
    let url = format!("{}/one.pdf", server.uri());

    let output = fetch_and_archive(&client, &task_id, &[url], &config).await;

    assert!(output.archive_path.is_none());
    assert_eq!(output.archived, 0);
    assert!(
        output.failures.is_empty(),
        "the archive failure belongs to settlement, not to the files: {:?}",
        output.failures
    );
}

#[tokio::test]
async fn duplicate_filenames_still_produce_an_archive() {
    let server = MockServer::start().await;
    serve(&server, "/a/report.pdf", b"first copy").await;
    serve(&server, "/b/report.pdf", b"second copy").await;

    let staging = TempDir::new().unwrap();
    let archives = TempDir::new().unwrap();
    let config = test_config(&staging, &archives);
    let client = reqwest::Client::new();
    let task_id = TaskId::from("f1f2f3f4f5f6f7f8");
    let urls = vec![
        format!("{}/a/report.pdf", server.uri()),
        format!("{}/b/report.pdf", server.uri()),
    ];

    let output = fetch_and_archive(&client, &task_id, &urls, &config).await;

    // Both URLs map to the same scratch file name, so the second download
    // overwrites the first and both zip entries carry the later bytes.
    assert!(output.failures.is_empty());
    assert_eq!(output.archived, 2);
    let archive_path = output.archive_path.expect("archive should be written");
    assert_eq!(read_entry(&archive_path, "report.pdf"), "second copy");
}
