//! Configuration types for zipfetch

use serde::{Deserialize, Serialize};
use std::net::SocketAddr;
use std::path::PathBuf;
use utoipa::ToSchema;

use crate::error::{Error, Result};

/// Task admission and quota limits
///
/// Groups the two counters that bound how much work the fetcher accepts.
/// Used as a nested sub-config within [`Config`].
#[derive(Clone, Debug, Serialize, Deserialize, ToSchema)]
pub struct LimitsConfig {
    /// Number of URLs a task collects before processing starts (default: 3)
    ///
    /// Appending the file that reaches this count dispatches the task's
    /// fetch-and-archive run; further appends are rejected.
    #[serde(default = "default_max_files_per_task")]
    pub max_files_per_task: usize,

    /// Maximum number of tasks in flight at once (default: 3)
    ///
    /// A task counts against this limit from creation until it settles as
    /// done or error, not merely while its files are being fetched.
    #[serde(default = "default_max_active_tasks")]
    pub max_active_tasks: usize,
}

impl Default for LimitsConfig {
    fn default() -> Self {
        Self {
            max_files_per_task: default_max_files_per_task(),
            max_active_tasks: default_max_active_tasks(),
        }
    }
}

/// Remote fetch behavior
///
/// Used as a nested sub-config within [`Config`].
#[derive(Clone, Debug, Serialize, Deserialize, ToSchema)]
pub struct FetchConfig {
    /// Filename extensions accepted into archives, leading dot included
    /// (default: [".pdf", ".jpeg", ".jpg"])
    ///
    /// Extensions are compared case-insensitively against the last
    /// dot-suffix of the filename taken from the URL path.
    #[serde(default = "default_allowed_extensions")]
    pub allowed_extensions: Vec<String>,

    /// Per-request timeout in seconds (None = no timeout)
    #[serde(default)]
    pub timeout_secs: Option<u64>,
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            allowed_extensions: default_allowed_extensions(),
            timeout_secs: None,
        }
    }
}

/// On-disk layout for scratch space and finished archives
///
/// Used as a nested sub-config within [`Config`].
#[derive(Clone, Debug, Serialize, Deserialize, ToSchema)]
pub struct StorageConfig {
    /// Directory holding per-task scratch subdirectories (default: "tmp")
    ///
    /// Each processing run works in `<staging_dir>/<task id>` and removes
    /// that subdirectory when it finishes, whatever the outcome.
    #[serde(default = "default_staging_dir")]
    pub staging_dir: PathBuf,

    /// Directory holding finished archives (default: "archives")
    #[serde(default = "default_archive_dir")]
    pub archive_dir: PathBuf,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            staging_dir: default_staging_dir(),
            archive_dir: default_archive_dir(),
        }
    }
}

/// REST API configuration
#[derive(Clone, Debug, Serialize, Deserialize, ToSchema)]
pub struct ApiConfig {
    /// Address to bind to (default: 127.0.0.1:8080)
    #[serde(default = "default_bind_address")]
    pub bind_address: SocketAddr,

    /// Enable CORS for browser access (default: true)
    #[serde(default = "default_true")]
    pub cors_enabled: bool,

    /// Allowed CORS origins (default: ["*"])
    #[serde(default = "default_cors_origins")]
    pub cors_origins: Vec<String>,

    /// Enable Swagger UI at /swagger-ui (default: true)
    #[serde(default = "default_true")]
    pub swagger_ui: bool,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            bind_address: default_bind_address(),
            cors_enabled: true,
            cors_origins: default_cors_origins(),
            swagger_ui: true,
        }
    }
}

/// Main configuration for ZipFetcher
///
/// Fields are organized into logical sub-configs:
/// - [`limits`](LimitsConfig) - admission cap and per-task file quota
/// - [`fetch`](FetchConfig) - extension allowlist, timeouts
/// - [`storage`](StorageConfig) - scratch and archive directories
/// - [`api`](ApiConfig) - REST API server settings
///
/// The limit, fetch, and storage fields are flattened for serialization, so
/// the JSON format stays flat (no nesting) for those settings.
#[derive(Clone, Debug, Default, Serialize, Deserialize, ToSchema)]
pub struct Config {
    /// Admission cap and per-task file quota
    #[serde(flatten)]
    pub limits: LimitsConfig,

    /// Remote fetch behavior (allowlist, timeouts)
    #[serde(flatten)]
    pub fetch: FetchConfig,

    /// Scratch and archive directories
    #[serde(flatten)]
    pub storage: StorageConfig,

    /// REST API server settings
    #[serde(default)]
    pub api: ApiConfig,
}

// Convenience accessors - allow call sites to use `config.staging_dir()` etc.
// without reaching through the sub-config structs.
impl Config {
    /// Staging directory for per-task scratch space
    pub fn staging_dir(&self) -> &PathBuf {
        &self.storage.staging_dir
    }

    /// Directory holding finished archives
    pub fn archive_dir(&self) -> &PathBuf {
        &self.storage.archive_dir
    }

    /// Build a configuration from environment variables.
    ///
    /// Starts from [`Config::default`] and overrides any setting whose
    /// variable is present. Recognized variables:
    ///
    /// | Variable             | Setting                      |
    /// |----------------------|------------------------------|
    /// | `PORT`               | API port on 127.0.0.1        |
    /// | `MAX_FILES_PER_TASK` | `limits.max_files_per_task`  |
    /// | `MAX_ACTIVE_TASKS`   | `limits.max_active_tasks`    |
    /// | `ALLOWED_EXTS`       | comma-separated allowlist    |
    /// | `STAGING_DIR`        | `storage.staging_dir`        |
    /// | `ARCHIVE_DIR`        | `storage.archive_dir`        |
    /// | `FETCH_TIMEOUT_SECS` | `fetch.timeout_secs`         |
    ///
    /// Returns [`Error::Config`] naming the offending variable when a value
    /// does not parse, or when a limit is set to zero.
    pub fn from_env() -> Result<Self> {
        let mut config = Config::default();

        if let Some(port) = parse_env::<u16>("PORT")? {
            config.api.bind_address = SocketAddr::from(([127, 0, 0, 1], port));
        }

        if let Some(max) = parse_env::<usize>("MAX_FILES_PER_TASK")? {
            if max == 0 {
                return Err(config_error("MAX_FILES_PER_TASK", "must be at least 1"));
            }
            config.limits.max_files_per_task = max;
        }

        if let Some(max) = parse_env::<usize>("MAX_ACTIVE_TASKS")? {
            if max == 0 {
                return Err(config_error("MAX_ACTIVE_TASKS", "must be at least 1"));
            }
            config.limits.max_active_tasks = max;
        }

        if let Ok(raw) = std::env::var("ALLOWED_EXTS") {
            config.fetch.allowed_extensions = raw
                .split(',')
                .map(|ext| ext.trim().to_lowercase())
                .filter(|ext| !ext.is_empty())
                .collect();
        }

        if let Ok(dir) = std::env::var("STAGING_DIR") {
            config.storage.staging_dir = PathBuf::from(dir);
        }

        if let Ok(dir) = std::env::var("ARCHIVE_DIR") {
            config.storage.archive_dir = PathBuf::from(dir);
        }

        if let Some(secs) = parse_env::<u64>("FETCH_TIMEOUT_SECS")? {
            config.fetch.timeout_secs = Some(secs);
        }

        Ok(config)
    }
}

/// Read and parse an environment variable, treating absence as `None`.
fn parse_env<T: std::str::FromStr>(key: &'static str) -> Result<Option<T>>
where
    T::Err: std::fmt::Display,
{
    match std::env::var(key) {
        Ok(raw) => raw.trim().parse::<T>().map(Some).map_err(|e| Error::Config {
            message: format!("invalid value {raw:?} for {key}: {e}"),
            key: Some(key.to_string()),
        }),
        Err(_) => Ok(None),
    }
}

fn config_error(key: &'static str, reason: &str) -> Error {
    Error::Config {
        message: format!("{key} {reason}"),
        key: Some(key.to_string()),
    }
}

fn default_max_files_per_task() -> usize {
    3
}

fn default_max_active_tasks() -> usize {
    3
}

fn default_allowed_extensions() -> Vec<String> {
    vec![".pdf".into(), ".jpeg".into(), ".jpg".into()]
}

fn default_staging_dir() -> PathBuf {
    PathBuf::from("tmp")
}

fn default_archive_dir() -> PathBuf {
    PathBuf::from("archives")
}

fn default_bind_address() -> SocketAddr {
    SocketAddr::from(([127, 0, 0, 1], 8080))
}

fn default_cors_origins() -> Vec<String> {
    vec!["*".into()]
}

fn default_true() -> bool {
    true
}
