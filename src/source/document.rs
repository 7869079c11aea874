//! Dashboard document sources.
//!
//! # Responsibilities
//! - Decide which documents a run reads (explicit, discovered or fallback)
//! - Load each one from disk or over HTTP
//! - Parse it into a `ConfigNode` tree
//!
//! Any failure here is fatal for the run.

use std::fmt;
use std::path::{Path, PathBuf};

use url::Url;

use crate::config::SourceConfig;
use crate::dashboard::ConfigNode;
use crate::resilience::RetryPolicy;
use crate::source::fetch::fetch_bytes;
use crate::source::{SourceError, SourceResult};

const DOCUMENT_EXTENSION: &str = "json";

/// Where a dashboard document comes from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DocumentSource {
    File(PathBuf),
    Url(Url),
}

impl DocumentSource {
    /// `http://` and `https://` strings are URLs, anything else is a path.
    pub fn parse(raw: &str) -> SourceResult<Self> {
        if raw.starts_with("http://") || raw.starts_with("https://") {
            Url::parse(raw)
                .map(DocumentSource::Url)
                .map_err(|source| SourceError::InvalidUrl {
                    raw: raw.to_string(),
                    source,
                })
        } else {
            Ok(DocumentSource::File(PathBuf::from(raw)))
        }
    }
}

impl fmt::Display for DocumentSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DocumentSource::File(path) => write!(f, "{}", path.display()),
            DocumentSource::Url(url) => write!(f, "{}", url),
        }
    }
}

/// A parsed dashboard.
#[derive(Debug, Clone)]
pub struct Document {
    /// Path or URL it was read from.
    pub origin: String,
    pub root: ConfigNode,
}

/// Resolve the sources for a run.
///
/// Explicit paths win. Otherwise every `*.json` file in the discovery
/// directory is used, in name order, falling back to the configured URLs.
pub fn discover(config: &SourceConfig, default_dir: &Path) -> SourceResult<Vec<DocumentSource>> {
    if !config.paths.is_empty() {
        return config.paths.iter().map(|raw| DocumentSource::parse(raw)).collect();
    }

    let dir = config.discover_dir.as_deref().unwrap_or(default_dir);
    let found = list_documents(dir)?;
    if !found.is_empty() {
        tracing::info!(dir = %dir.display(), count = found.len(), "Discovered dashboard files");
        return Ok(found.into_iter().map(DocumentSource::File).collect());
    }

    tracing::info!(dir = %dir.display(), "No dashboard files found, using fallback URLs");
    let fallback: Vec<DocumentSource> = config
        .fallback_urls
        .iter()
        .map(|raw| DocumentSource::parse(raw))
        .collect::<SourceResult<_>>()?;
    if fallback.is_empty() {
        return Err(SourceError::NoDocuments {
            dir: dir.to_path_buf(),
        });
    }
    Ok(fallback)
}

fn list_documents(dir: &Path) -> SourceResult<Vec<PathBuf>> {
    let discover_err = |source| SourceError::Discover {
        dir: dir.to_path_buf(),
        source,
    };

    let mut files = Vec::new();
    for entry in std::fs::read_dir(dir).map_err(discover_err)? {
        let path = entry.map_err(discover_err)?.path();
        let is_document = path.is_file()
            && path
                .extension()
                .is_some_and(|ext| ext == DOCUMENT_EXTENSION);
        if is_document {
            files.push(path);
        }
    }
    files.sort();
    Ok(files)
}

/// Load and parse one document.
pub async fn load_document(
    source: &DocumentSource,
    client: &reqwest::Client,
    policy: &RetryPolicy,
) -> SourceResult<Document> {
    let origin = source.to_string();
    let bytes = match source {
        DocumentSource::File(path) => {
            tokio::fs::read(path)
                .await
                .map_err(|source| SourceError::Read {
                    path: path.clone(),
                    source,
                })?
        }
        DocumentSource::Url(url) => fetch_bytes(client, url, policy)
            .await
            .map_err(|source| SourceError::Fetch {
                url: url.to_string(),
                attempts: policy.max_attempts,
                source,
            })?,
    };

    let root = ConfigNode::from_json_slice(&bytes).map_err(|source| SourceError::Parse {
        origin: origin.clone(),
        source,
    })?;
    Ok(Document { origin, root })
}

/// Load every source in order, stopping at the first failure.
pub async fn load_all(
    sources: &[DocumentSource],
    client: &reqwest::Client,
    policy: &RetryPolicy,
) -> SourceResult<Vec<Document>> {
    let mut documents = Vec::with_capacity(sources.len());
    for source in sources {
        let document = load_document(source, client, policy).await?;
        tracing::debug!(source = %document.origin, "Loaded dashboard");
        documents.push(document);
    }
    Ok(documents)
}
