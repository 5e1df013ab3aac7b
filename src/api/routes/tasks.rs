//! Task management handlers.

use super::AddFileRequest;
use crate::api::AppState;
use crate::error::ApiError;
use crate::types::TaskId;
use axum::{
    Json,
    extract::{Path, State},
    http::{StatusCode, header},
    response::{IntoResponse, Response},
};
use serde_json::json;

/// POST /tasks - Create a new task
#[utoipa::path(
    post,
    path = "/api/v1/tasks",
    tag = "tasks",
    responses(
        (status = 201, description = "Task created, body carries its ID"),
        (status = 429, description = "Active task limit reached"),
        (status = 503, description = "Shutting down, no new tasks accepted")
    )
)]
pub async fn create_task(State(state): State<AppState>) -> Response {
    match state.fetcher.create_task().await {
        Ok(info) => (StatusCode::CREATED, Json(json!({"id": info.id}))).into_response(),
        Err(e) => e.into_response(),
    }
}

/// GET /tasks - List all tasks
#[utoipa::path(
    get,
    path = "/api/v1/tasks",
    tag = "tasks",
    responses(
        (status = 200, description = "Snapshots of all tasks, oldest first", body = Vec<crate::types::TaskInfo>)
    )
)]
pub async fn list_tasks(State(state): State<AppState>) -> impl IntoResponse {
    let tasks = state.fetcher.list_tasks().await;
    (StatusCode::OK, Json(tasks))
}

/// GET /tasks/:id - Get a task snapshot
#[utoipa::path(
    get,
    path = "/api/v1/tasks/{id}",
    tag = "tasks",
    params(
        ("id" = String, Path, description = "Task ID")
    ),
    responses(
        (status = 200, description = "Task snapshot", body = crate::types::TaskInfo),
        (status = 404, description = "Task not found")
    )
)]
pub async fn get_task(State(state): State<AppState>, Path(id): Path<String>) -> Response {
    match state.fetcher.get_task(&TaskId::from(id)).await {
        Ok(info) => (StatusCode::OK, Json(info)).into_response(),
        Err(e) => e.into_response(),
    }
}

/// POST /tasks/:id/files - Append a file URL to a task
#[utoipa::path(
    post,
    path = "/api/v1/tasks/{id}/files",
    tag = "tasks",
    params(
        ("id" = String, Path, description = "Task ID")
    ),
    request_body = AddFileRequest,
    responses(
        (status = 204, description = "URL appended"),
        (status = 400, description = "Missing or empty url field"),
        (status = 404, description = "Task not found"),
        (status = 409, description = "File quota already reached"),
        (status = 503, description = "Shutting down, no new files accepted")
    )
)]
pub async fn add_file(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(body): Json<AddFileRequest>,
) -> Response {
    let url = body.url.trim();
    if url.is_empty() {
        return (
            StatusCode::BAD_REQUEST,
            Json(ApiError::validation(
                "Request body must include a non-empty 'url' field",
            )),
        )
            .into_response();
    }

    match state.fetcher.add_file(&TaskId::from(id), url).await {
        Ok(()) => StatusCode::NO_CONTENT.into_response(),
        Err(e) => e.into_response(),
    }
}

/// GET /tasks/:id/archive - Download the finished archive
#[utoipa::path(
    get,
    path = "/api/v1/tasks/{id}/archive",
    tag = "tasks",
    params(
        ("id" = String, Path, description = "Task ID")
    ),
    responses(
        (status = 200, description = "Zip archive bytes", content_type = "application/zip"),
        (status = 404, description = "Task not found or archive not ready")
    )
)]
pub async fn fetch_archive(State(state): State<AppState>, Path(id): Path<String>) -> Response {
    let id = TaskId::from(id);
    match state.fetcher.read_archive(&id).await {
        Ok(bytes) => {
            let headers = [
                (header::CONTENT_TYPE, "application/zip".to_string()),
                (
                    header::CONTENT_DISPOSITION,
                    format!("attachment; filename=\"{id}.zip\""),
                ),
            ];
            (StatusCode::OK, headers, bytes).into_response()
        }
        Err(e) => e.into_response(),
    }
}
