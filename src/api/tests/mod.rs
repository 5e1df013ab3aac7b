use super::*;
use axum::Router;
use axum::body::Body;
use axum::http::{Request, StatusCode};
use std::time::Duration;
use tower::ServiceExt;


/// Helper to create a test ZipFetcher instance wrapped in Arc
fn create_test_fetcher() -> (Arc<ZipFetcher>, tempfile::TempDir) {
    let (fetcher, temp_dir) = crate::manager::test_helpers::create_test_fetcher();
    (Arc::new(fetcher), temp_dir)
}

/// Like [`create_test_fetcher`] but with explicit quota and admission limits
fn create_test_fetcher_with_limits(
    max_files_per_task: usize,
    max_active_tasks: usize,
) -> (Arc<ZipFetcher>, tempfile::TempDir) {
    let (fetcher, temp_dir) = crate::manager::test_helpers::create_test_fetcher_with_limits(
        max_files_per_task,
        max_active_tasks,
    );
    (Arc::new(fetcher), temp_dir)
}

/// Send a request to the router and decode the JSON body (Null when empty)
async fn send_json(
    app: &Router,
    method: &str,
    uri: &str,
    body: Option<serde_json::Value>,
) -> (StatusCode, serde_json::Value) {
    let mut builder = Request::builder().method(method).uri(uri);
    let body = match body {
        Some(json) => {
            builder = builder.header("content-type", "application/json");
            Body::from(serde_json::to_vec(&json).unwrap())
        }
        None => Body::empty(),
    };

    let response = app
        .clone()
        .oneshot(builder.body(body).unwrap())
        .await
        .unwrap();
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let value = if bytes.is_empty() {
        serde_json::Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };

    (status, value)
}

#[tokio::test]
async fn test_api_server_spawns() {
    // Create test fetcher with a unique port
    let (fetcher, _temp_dir) = create_test_fetcher();

    // Use a random available port for testing
    let mut config = (*fetcher.config).clone();
    config.api.bind_address = "127.0.0.1:0".parse().unwrap(); // Port 0 = OS assigns a free port
    let config = Arc::new(config);

    // Spawn the API server
    let api_handle = tokio::spawn({
        let fetcher = fetcher.clone();
        let config = config.clone();
        async move { start_api_server(fetcher, config).await }
    });

    // Give it a moment to start
    tokio::time::sleep(Duration::from_millis(100)).await;

    // Abort the server task
    api_handle.abort();

    // The test passes if we got here without panicking
}

#[tokio::test]
async fn test_spawn_api_server_method() {
    let mut config = Config::default();
    config.api.bind_address = "127.0.0.1:0".parse().unwrap();
    let fetcher = Arc::new(ZipFetcher::new(config).unwrap());

    // Use the spawn_api_server method
    let api_handle = fetcher.spawn_api_server();

    // Give it a moment to start
    tokio::time::sleep(Duration::from_millis(100)).await;

    // Abort the server task
    api_handle.abort();

    // Test passes if we got here
}

#[tokio::test]
async fn test_health_endpoint() {
    let (fetcher, _temp_dir) = create_test_fetcher();
    let config = fetcher.config.clone();

    // Create the router
    let app = create_router(fetcher, config);

    // Make a request to /health
    let response = app
        .oneshot(
            Request::builder()
                .uri("/health")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    // Check that we got a 200 OK
    assert_eq!(response.status(), StatusCode::OK);

    // Check the response body
    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let body_str = String::from_utf8(body.to_vec()).unwrap();

    assert!(body_str.contains("ok"));
    assert!(body_str.contains("0.1.0")); // Version from Cargo.toml
    assert!(body_str.contains("active_tasks"));
}

#[tokio::test]
async fn test_cors_enabled() {
    // Create test fetcher
    let (fetcher, _temp_dir) = create_test_fetcher();

    // Config with CORS enabled (default)
    let mut config = (*fetcher.config).clone();
    config.api.cors_enabled = true;
    config.api.cors_origins = vec!["*".to_string()];
    let config = Arc::new(config);

    // Create router with CORS enabled
    let app = create_router(fetcher, config);

    // Make a request with Origin header
    let request = Request::builder()
        .uri("/health")
        .header("Origin", "http://localhost:3000")
        .body(Body::empty())
        .unwrap();

    let response = app.oneshot(request).await.unwrap();

    // Check that response has CORS headers
    assert_eq!(response.status(), StatusCode::OK);

    // The CORS middleware should add access-control-allow-origin header
    let headers = response.headers();
    assert!(
        headers.contains_key("access-control-allow-origin"),
        "CORS header should be present when CORS is enabled"
    );
}

#[tokio::test]
async fn test_cors_disabled() {
    let (fetcher, _temp_dir) = create_test_fetcher();

    let mut config = (*fetcher.config).clone();
    config.api.cors_enabled = false;
    let config = Arc::new(config);

    let app = create_router(fetcher, config);

    let request = Request::builder()
        .uri("/health")
        .header("Origin", "http://localhost:3000")
        .body(Body::empty())
        .unwrap();

    let response = app.oneshot(request).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert!(
        !response
            .headers()
            .contains_key("access-control-allow-origin"),
        "CORS header should be absent when CORS is disabled"
    );
}

#[tokio::test]
async fn test_swagger_ui_enabled_by_default() {
    let (fetcher, _temp_dir) = create_test_fetcher();
    let config = fetcher.config.clone();

    let app = create_router(fetcher, config);

    let response = app
        .oneshot(
            Request::builder()
                .uri("/swagger-ui")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    // SwaggerUi redirects /swagger-ui to /swagger-ui/
    assert!(
        response.status().is_redirection() || response.status().is_success(),
        "Swagger UI should be mounted, got {}",
        response.status()
    );
}

#[tokio::test]
async fn test_swagger_ui_can_be_disabled() {
    let (fetcher, _temp_dir) = create_test_fetcher();

    let mut config = (*fetcher.config).clone();
    config.api.swagger_ui = false;
    let config = Arc::new(config);

    let app = create_router(fetcher, config);

    let response = app
        .oneshot(
            Request::builder()
                .uri("/swagger-ui")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(
        response.status(),
        StatusCode::NOT_FOUND,
        "Swagger UI routes should not exist when disabled"
    );
}
