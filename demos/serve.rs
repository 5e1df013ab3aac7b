//! REST API server example
//!
//! This example runs zipfetch as a standalone service controlled over HTTP.
//!
//! After starting, you can:
//! - View Swagger UI at http://localhost:8080/swagger-ui
//! - Create a task via POST http://localhost:8080/tasks
//! - Feed it files via POST http://localhost:8080/tasks/:id/files
//! - Stream events via GET http://localhost:8080/events
//!
//! Configuration is read from the environment (PORT, MAX_FILES_PER_TASK,
//! MAX_ACTIVE_TASKS, ALLOWED_EXTS, STAGING_DIR, ARCHIVE_DIR,
//! FETCH_TIMEOUT_SECS); unset variables fall back to defaults.

use std::sync::Arc;
use zipfetch::{Config, ZipFetcher, run_with_shutdown};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize tracing
    tracing_subscriber::fmt::init();

    // Build configuration from the environment
    let config = Config::from_env()?;
    let bind_address = config.api.bind_address;

    // Create fetcher instance and put the API in front of it
    let fetcher = Arc::new(ZipFetcher::new(config)?);
    let api_handle = fetcher.spawn_api_server();

    println!("🚀 Starting zipfetch REST API server");
    println!("📖 Swagger UI: http://{bind_address}/swagger-ui");
    println!("🔄 Events stream: http://{bind_address}/events");
    println!();
    println!("Example commands:");
    println!("  # Create a task");
    println!("  curl -X POST http://{bind_address}/tasks");
    println!();
    println!("  # Add a file to it");
    println!("  curl -X POST http://{bind_address}/tasks/<id>/files \\");
    println!("    -H 'Content-Type: application/json' \\");
    println!("    -d '{{\"url\": \"https://example.com/report.pdf\"}}'");
    println!();
    println!("  # Poll the task and fetch its archive once done");
    println!("  curl http://{bind_address}/tasks/<id>");
    println!("  curl -OJ http://{bind_address}/tasks/<id>/archive");

    // Block until SIGTERM/SIGINT, then drain in-flight tasks
    run_with_shutdown((*fetcher).clone()).await?;
    api_handle.abort();

    Ok(())
}
