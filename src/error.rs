//! Fatal error taxonomy.
//!
//! Anything surfacing here aborts the run before or instead of processing.
//! Per-item failures are `pipeline::ItemError` and never reach this type.

use thiserror::Error;

use crate::backend::BackendError;
use crate::config::window::WindowError;
use crate::config::ConfigError;
use crate::output::StoreError;
use crate::source::SourceError;

#[derive(Debug, Error)]
pub enum Error {
    #[error("configuration: {0}")]
    Config(#[from] ConfigError),

    #[error("time window: {0}")]
    Window(#[from] WindowError),

    #[error("cannot locate executable directory: {0}")]
    ExecutableDir(#[source] std::io::Error),

    #[error("output: {0}")]
    Output(#[from] StoreError),

    #[error("backend: {0}")]
    Backend(#[from] BackendError),

    #[error("http client: {0}")]
    HttpClient(#[source] reqwest::Error),

    #[error("sources: {0}")]
    Source(#[from] SourceError),

    #[error("extraction task failed: {0}")]
    Producer(String),
}

pub type Result<T> = std::result::Result<T, Error>;
