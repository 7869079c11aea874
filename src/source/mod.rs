//! Dashboard document sources.
//!
//! # Data Flow
//! ```text
//! SourceConfig
//!     → document::discover (explicit paths | *.json in dir | fallback URLs)
//!     → document::load_all (file read | fetch.rs HTTP GET, 200 only)
//!     → ConfigNode::from_json_slice
//!     → Vec<Document> for the pipeline
//! ```

pub mod document;
pub mod fetch;

use std::path::PathBuf;

use thiserror::Error;

pub use document::{discover, load_all, load_document, Document, DocumentSource};
pub use fetch::FetchError;

/// Errors while locating or loading dashboards. All are fatal.
#[derive(Debug, Error)]
pub enum SourceError {
    #[error("invalid source URL {raw}: {source}")]
    InvalidUrl {
        raw: String,
        #[source]
        source: url::ParseError,
    },

    #[error("cannot list dashboards in {dir}: {source}")]
    Discover {
        dir: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("no dashboards found in {dir} and no fallback URLs configured")]
    NoDocuments { dir: PathBuf },

    #[error("cannot read {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("cannot download {url} after {attempts} attempts: {source}")]
    Fetch {
        url: String,
        attempts: u32,
        #[source]
        source: FetchError,
    },

    #[error("{origin} is not valid JSON: {source}")]
    Parse {
        origin: String,
        #[source]
        source: serde_json::Error,
    },
}

pub type SourceResult<T> = Result<T, SourceError>;
