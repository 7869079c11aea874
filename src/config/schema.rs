//! Configuration schema definitions.
//!
//! This module defines the complete configuration structure for a run.
//! All types derive Serde traits for deserialization from config files.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// Dashboards fetched when no local documents are found.
pub const DEFAULT_FALLBACK_URLS: [&str; 3] = [
    "https://raw.githubusercontent.com/pingcap/tidb-ansible/master/scripts/tidb.json",
    "https://raw.githubusercontent.com/pingcap/tidb-ansible/master/scripts/tikv.json",
    "https://raw.githubusercontent.com/pingcap/tidb-ansible/master/scripts/pd.json",
];

/// Name of the image directory created next to the executable.
pub const DEFAULT_OUTPUT_DIR: &str = "PngDir";

/// Root configuration for a plotting run.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct RunConfig {
    /// Monitoring backend settings.
    pub backend: BackendConfig,

    /// Time window queried for every descriptor.
    pub window: WindowConfig,

    /// Input dashboard documents.
    pub sources: SourceConfig,

    /// Where images are written.
    pub output: OutputConfig,

    /// Queue and worker pool sizing.
    pub pipeline: PipelineConfig,

    /// Per-query retry policy.
    pub retries: RetryConfig,

    /// Chart appearance.
    pub render: RenderConfig,

    /// Observability settings.
    pub observability: ObservabilityConfig,

    /// Single ad-hoc query; bypasses document discovery when set.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub adhoc: Option<AdhocQuery>,
}

/// Monitoring backend configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct BackendConfig {
    /// Base URL of the Prometheus-compatible API (e.g., "http://127.0.0.1:9090").
    pub address: String,

    /// Timeout for a single range query in seconds.
    pub request_timeout_secs: u64,

    /// Honour HTTP(S)_PROXY environment variables.
    pub use_proxy_env: bool,

    /// Build one client per worker instead of sharing one.
    pub client_per_worker: bool,
}

impl Default for BackendConfig {
    fn default() -> Self {
        Self {
            address: "http://127.0.0.1:9090".to_string(),
            request_timeout_secs: 30,
            use_proxy_env: true,
            client_per_worker: false,
        }
    }
}

/// Query window. Missing bounds default to a trailing window ending now.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct WindowConfig {
    /// Window start (human-readable timestamp).
    pub start: Option<String>,

    /// Window end (human-readable timestamp).
    pub end: Option<String>,

    /// Length of the default trailing window in hours.
    pub trailing_hours: u64,
}

impl Default for WindowConfig {
    fn default() -> Self {
        Self {
            start: None,
            end: None,
            trailing_hours: 72,
        }
    }
}

/// Input document configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct SourceConfig {
    /// Explicit documents: file paths or http(s) URLs.
    pub paths: Vec<String>,

    /// Directory scanned for `*.json` documents. Defaults to the executable's directory.
    pub discover_dir: Option<PathBuf>,

    /// Used when neither `paths` nor discovery yields a document.
    pub fallback_urls: Vec<String>,

    /// HTTP attempts per remote document.
    pub fetch_attempts: u32,
}

impl Default for SourceConfig {
    fn default() -> Self {
        Self {
            paths: Vec::new(),
            discover_dir: None,
            fallback_urls: DEFAULT_FALLBACK_URLS.iter().map(|u| u.to_string()).collect(),
            fetch_attempts: 3,
        }
    }
}

/// Output configuration.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct OutputConfig {
    /// Image directory. Defaults to `PngDir` next to the executable.
    pub directory: Option<PathBuf>,

    /// What to do when two descriptors share a name.
    pub on_collision: CollisionPolicy,
}

/// Behaviour when an image name was already written during this run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum CollisionPolicy {
    /// Later images replace earlier ones.
    #[default]
    Overwrite,
    /// Later images get `_1`, `_2`, ... appended to their name.
    Suffix,
}

/// Queue and worker pool configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct PipelineConfig {
    /// Number of workers. Defaults to the host's available parallelism.
    pub workers: usize,

    /// Bounded queue capacity.
    pub queue_capacity: usize,

    /// Step used for leaves that carry no `step`.
    pub default_step_secs: u64,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            workers: std::thread::available_parallelism()
                .map(|n| n.get())
                .unwrap_or(1),
            queue_capacity: 10_000,
            default_step_secs: 15,
        }
    }
}

/// Retry configuration for range queries.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct RetryConfig {
    /// Total attempts per query (including the first).
    pub max_attempts: u32,

    /// Fixed delay between attempts in milliseconds.
    pub delay_ms: u64,

    /// Also sleep after the last attempt, success or not.
    pub trailing_delay: bool,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            delay_ms: 1000,
            trailing_delay: false,
        }
    }
}

/// Chart rendering configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct RenderConfig {
    /// Image width in pixels.
    pub width: u32,

    /// Image height in pixels.
    pub height: u32,

    /// TrueType font used for captions and labels.
    pub font_path: Option<PathBuf>,
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            width: 1200,
            height: 600,
            font_path: None,
        }
    }
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
        }
    }
}

/// A single query supplied on the command line.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct AdhocQuery {
    /// Query expression.
    pub query: String,

    /// Output base name.
    pub name: String,

    /// Step in seconds.
    #[serde(default = "default_adhoc_step")]
    pub step_secs: u64,
}

fn default_adhoc_step() -> u64 {
    15
}
