//! Startup orchestration.
//!
//! # Responsibilities
//! - Resolve the time window
//! - Create the output directory
//! - Build the backend handles and the renderer
//! - Load every dashboard, or build the ad-hoc descriptor
//!
//! # Design Decisions
//! - Fail fast: every error here is fatal and nothing has been queued yet
//! - Steps run in order, not concurrently

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;

use crate::backend::{ClientHandles, PrometheusClient, RangeQuery};
use crate::config::{BackendConfig, RunConfig, TimeWindow, DEFAULT_OUTPUT_DIR};
use crate::dashboard::QueryDescriptor;
use crate::error::{Error, Result};
use crate::lifecycle::Shutdown;
use crate::output::ImageStore;
use crate::pipeline::{Pipeline, PipelineSettings, Workload};
use crate::render::{ChartRenderer, Renderer};
use crate::resilience::RetryPolicy;
use crate::source;

/// Everything a run needs, fully initialized.
pub struct Prepared {
    pub settings: PipelineSettings,
    pub clients: ClientHandles,
    pub renderer: Arc<dyn Renderer>,
    pub store: Arc<ImageStore>,
    pub workload: Workload,
}

impl Prepared {
    /// Split into the pipeline and the work it should process.
    pub fn into_pipeline(self, shutdown: Shutdown) -> (Pipeline, Workload) {
        let pipeline = Pipeline::new(self.settings, self.clients, self.renderer, self.store, shutdown);
        (pipeline, self.workload)
    }
}

/// Perform the fatal part of a run.
pub async fn prepare(config: &RunConfig) -> Result<Prepared> {
    let window = TimeWindow::resolve(&config.window, Utc::now())?;
    tracing::info!(from = %window.from, to = %window.to, "Time window resolved");

    let output_dir = match &config.output.directory {
        Some(dir) => dir.clone(),
        None => executable_dir()?.join(DEFAULT_OUTPUT_DIR),
    };
    let store = ImageStore::create(output_dir, config.output.on_collision)?;
    tracing::info!(dir = %store.dir().display(), "Writing images");

    let clients = build_clients(&config.backend, config.pipeline.workers)?;
    let renderer = ChartRenderer::new(&config.render);
    if !renderer.draws_text() {
        tracing::warn!("Charts will have no caption, axis labels or legend");
    }

    let default_step = Duration::from_secs(config.pipeline.default_step_secs);
    let workload = match &config.adhoc {
        Some(adhoc) => {
            tracing::info!(name = %adhoc.name, "Running a single ad-hoc query");
            Workload::Descriptors(vec![QueryDescriptor::new(
                adhoc.query.clone(),
                adhoc.name.clone(),
                Duration::from_secs(adhoc.step_secs),
            )])
        }
        None => Workload::Documents(load_documents(config).await?),
    };

    Ok(Prepared {
        settings: PipelineSettings {
            window,
            policy: RetryPolicy::from(&config.retries),
            workers: config.pipeline.workers,
            queue_capacity: config.pipeline.queue_capacity,
            default_step,
        },
        clients,
        renderer: Arc::new(renderer),
        store: Arc::new(store),
        workload,
    })
}

/// One shared client, or one per worker when configured.
pub fn build_clients(config: &BackendConfig, workers: usize) -> Result<ClientHandles> {
    if !config.client_per_worker {
        let client: Arc<dyn RangeQuery> = Arc::new(PrometheusClient::new(config)?);
        return Ok(ClientHandles::Shared(client));
    }

    let mut clients: Vec<Arc<dyn RangeQuery>> = Vec::with_capacity(workers);
    for _ in 0..workers {
        clients.push(Arc::new(PrometheusClient::new(config)?));
    }
    Ok(ClientHandles::PerWorker(clients))
}

async fn load_documents(config: &RunConfig) -> Result<Vec<source::Document>> {
    let discover_dir = match &config.sources.discover_dir {
        Some(dir) => dir.clone(),
        None if config.sources.paths.is_empty() => executable_dir()?,
        None => PathBuf::new(),
    };
    let sources = source::discover(&config.sources, &discover_dir)?;

    let mut builder = reqwest::Client::builder()
        .timeout(Duration::from_secs(config.backend.request_timeout_secs));
    if !config.backend.use_proxy_env {
        builder = builder.no_proxy();
    }
    let http = builder.build().map_err(Error::HttpClient)?;

    let policy = RetryPolicy::immediate(config.sources.fetch_attempts);
    let documents = source::load_all(&sources, &http, &policy).await?;
    tracing::info!(count = documents.len(), "Dashboards loaded");
    Ok(documents)
}

/// Directory holding the running executable.
fn executable_dir() -> Result<PathBuf> {
    let exe = std::env::current_exe().map_err(Error::ExecutableDir)?;
    exe.parent().map(PathBuf::from).ok_or_else(|| {
        Error::ExecutableDir(std::io::Error::new(
            std::io::ErrorKind::NotFound,
            "executable has no parent directory",
        ))
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::AdhocQuery;

    fn config_in(dir: &std::path::Path) -> RunConfig {
        let mut config = RunConfig::default();
        config.output.directory = Some(dir.join("PngDir"));
        config.sources.discover_dir = Some(dir.to_path_buf());
        config.sources.fallback_urls = Vec::new();
        config.pipeline.workers = 2;
        config
    }

    #[tokio::test]
    async fn test_prepare_adhoc() {
        let tmp = tempfile::tempdir().unwrap();
        let mut config = config_in(tmp.path());
        config.adhoc = Some(AdhocQuery {
            query: "up".into(),
            name: "up_now".into(),
            step_secs: 30,
        });

        let prepared = prepare(&config).await.unwrap();

        assert!(tmp.path().join("PngDir").is_dir());
        match prepared.workload {
            Workload::Descriptors(items) => {
                assert_eq!(items, vec![QueryDescriptor::new("up", "up_now", Duration::from_secs(30))]);
            }
            other => panic!("unexpected workload: {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_prepare_discovers_documents() {
        let tmp = tempfile::tempdir().unwrap();
        std::fs::write(tmp.path().join("a.json"), br#"{"panels":[]}"#).unwrap();
        std::fs::write(tmp.path().join("b.json"), br#"{"rows":[]}"#).unwrap();

        let prepared = prepare(&config_in(tmp.path())).await.unwrap();

        match prepared.workload {
            Workload::Documents(docs) => assert_eq!(docs.len(), 2),
            other => panic!("unexpected workload: {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_prepare_fails_without_documents() {
        let tmp = tempfile::tempdir().unwrap();

        let err = prepare(&config_in(tmp.path())).await.err().unwrap();

        assert!(matches!(err, Error::Source(_)));
    }

    #[tokio::test]
    async fn test_prepare_rejects_inverted_window() {
        let tmp = tempfile::tempdir().unwrap();
        let mut config = config_in(tmp.path());
        config.window.start = Some("2024-01-02 00:00:00".into());
        config.window.end = Some("2024-01-01 00:00:00".into());

        let err = prepare(&config).await.err().unwrap();

        assert!(matches!(err, Error::Window(_)));
        assert!(!tmp.path().join("PngDir").exists());
    }

    #[test]
    fn test_client_per_worker() {
        let config = BackendConfig {
            client_per_worker: true,
            ..BackendConfig::default()
        };
        assert_eq!(build_clients(&config, 3).unwrap().capacity(), Some(3));
        assert_eq!(build_clients(&BackendConfig::default(), 3).unwrap().capacity(), None);
    }
}
