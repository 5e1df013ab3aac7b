//! OpenAPI documentation and schema generation
//!
//! This module defines the OpenAPI specification for the zipfetch REST API
//! using utoipa for compile-time spec generation.

use utoipa::OpenApi;

/// OpenAPI documentation for the zipfetch REST API
///
/// This struct is used to generate the OpenAPI 3.1 specification that describes
/// all available endpoints, request/response types, and API behavior.
///
/// The spec can be accessed via:
/// - `/api/v1/openapi.json` - JSON format OpenAPI specification
/// - `/swagger-ui` - Interactive Swagger UI documentation
#[derive(OpenApi)]
#[openapi(
    info(
        title = "zipfetch REST API",
        version = "0.1.0",
        description = "OpenAPI 3.1 compliant REST API for creating fetch tasks, feeding them file URLs and downloading the bundled zip archives",
        contact(
            name = "zipfetch",
            url = "https://github.com/zipfetch/zipfetch"
        ),
        license(
            name = "MIT OR Apache-2.0"
        )
    ),
    servers(
        (url = "http://localhost:8080/api/v1", description = "Local development server")
    ),
    paths(
        // Tasks
        crate::api::routes::create_task,
        crate::api::routes::list_tasks,
        crate::api::routes::get_task,
        crate::api::routes::add_file,
        crate::api::routes::fetch_archive,

        // System
        crate::api::routes::health_check,
        crate::api::routes::openapi_spec,
        crate::api::routes::event_stream,
        crate::api::routes::shutdown,
    ),
    components(schemas(
        // Core types from types.rs
        crate::types::TaskId,
        crate::types::TaskStatus,
        crate::types::FileFailure,
        crate::types::TaskInfo,
        crate::types::Event,

        // Config types from config.rs
        crate::config::Config,
        crate::config::LimitsConfig,
        crate::config::FetchConfig,
        crate::config::StorageConfig,
        crate::config::ApiConfig,

        // API request types from routes.rs
        crate::api::routes::AddFileRequest,

        // Error types from error.rs
        crate::error::ApiError,
        crate::error::ErrorDetail,
    )),
    tags(
        (name = "tasks", description = "Task management - Create tasks, append file URLs, download archives"),
        (name = "system", description = "System endpoints - Health checks, OpenAPI spec, events, shutdown"),
    )
)]
pub struct ApiDoc;
