//! Run orchestration.
//!
//! # Responsibilities
//! - Start the worker pool before anything is queued
//! - Feed the queue from a blocking producer (document walk or ad-hoc items)
//! - Close the queue, wait for every worker and report the summary
//!
//! # Design Decisions
//! - Workers exist before the first push, so a workload larger than the
//!   queue capacity only applies back-pressure, never deadlocks
//! - The producer stops at the first push after shutdown; once every worker
//!   has exited the queue rejects pushes, unblocking a waiting producer
//! - A panicked producer fails the run once the workers have drained

use std::sync::Arc;
use std::time::Duration;

use crate::backend::ClientHandles;
use crate::config::TimeWindow;
use crate::error::{Error, Result};
use crate::dashboard::{DescriptorSink, ExtractStats, Extractor, QueryDescriptor, SinkClosed};
use crate::lifecycle::Shutdown;
use crate::output::ImageStore;
use crate::pipeline::queue::{self, QueueProducer};
use crate::pipeline::summary::{RunStats, RunSummary};
use crate::pipeline::worker::{Worker, WorkerContext};
use crate::render::Renderer;
use crate::resilience::RetryPolicy;
use crate::source::Document;

/// What a run should process.
#[derive(Debug)]
pub enum Workload {
    /// Dashboard documents to walk for queries.
    Documents(Vec<Document>),
    /// Descriptors given directly, e.g. an ad-hoc query.
    Descriptors(Vec<QueryDescriptor>),
}

/// Tunables for one run.
#[derive(Debug, Clone)]
pub struct PipelineSettings {
    pub window: TimeWindow,
    pub policy: RetryPolicy,
    pub workers: usize,
    pub queue_capacity: usize,
    pub default_step: Duration,
}

/// Extraction → queue → worker pool.
pub struct Pipeline {
    settings: PipelineSettings,
    clients: ClientHandles,
    renderer: Arc<dyn Renderer>,
    store: Arc<ImageStore>,
    shutdown: Shutdown,
}

impl Pipeline {
    pub fn new(
        settings: PipelineSettings,
        clients: ClientHandles,
        renderer: Arc<dyn Renderer>,
        store: Arc<ImageStore>,
        shutdown: Shutdown,
    ) -> Self {
        Self {
            settings,
            clients,
            renderer,
            store,
            shutdown,
        }
    }

    /// Process `workload` to completion or until shutdown.
    ///
    /// Fails only when the producer task itself panicked.
    pub async fn run(self, workload: Workload) -> Result<RunSummary> {
        let stats = Arc::new(RunStats::default());
        let (producer, consumer) = queue::bounded(self.settings.queue_capacity);

        let ctx = Arc::new(WorkerContext {
            window: self.settings.window,
            policy: self.settings.policy,
            renderer: self.renderer,
            store: self.store,
            shutdown: self.shutdown.clone(),
            stats: stats.clone(),
        });

        let worker_count = match self.clients.capacity() {
            Some(available) => available.min(self.settings.workers),
            None => self.settings.workers,
        };
        let mut workers = Vec::with_capacity(worker_count);
        for id in 0..worker_count {
            let Some(client) = self.clients.for_worker(id) else {
                break;
            };
            let worker = Worker::new(id, client, consumer.clone(), ctx.clone());
            workers.push(tokio::spawn(worker.run()));
        }
        // Only workers may hold the consumer, so the queue closes when they all exit.
        drop(consumer);

        if workers.is_empty() {
            tracing::warn!("No workers could be started, nothing will be processed");
        } else {
            tracing::info!(workers = workers.len(), capacity = self.settings.queue_capacity, "Worker pool started");
        }

        let shutdown = self.shutdown.clone();
        let default_step = self.settings.default_step;
        let produced = producer_outcome(
            tokio::task::spawn_blocking(move || produce(producer, workload, default_step, &shutdown))
                .await,
        );
        if let Ok(extract) = &produced {
            tracing::info!(
                queued = extract.emitted,
                malformed = extract.malformed,
                "Extraction finished, queue closed"
            );
        }

        for handle in workers {
            if let Err(e) = handle.await {
                tracing::error!(error = %e, "Worker task failed");
            }
        }

        Ok(stats.snapshot(produced?))
    }
}

fn producer_outcome(
    joined: std::result::Result<ExtractStats, tokio::task::JoinError>,
) -> Result<ExtractStats> {
    joined.map_err(|e| {
        tracing::error!(error = %e, "Producer task failed");
        Error::Producer(e.to_string())
    })
}

/// Queue sink that refuses new items once shutdown is requested.
struct CancellableSink<'a> {
    producer: &'a QueueProducer,
    shutdown: &'a Shutdown,
}

impl DescriptorSink for CancellableSink<'_> {
    fn emit(&mut self, descriptor: QueryDescriptor) -> std::result::Result<(), SinkClosed> {
        if self.shutdown.is_triggered() {
            return Err(SinkClosed);
        }
        self.producer.blocking_push(descriptor)
    }
}

/// Push the whole workload, then close the queue by dropping the producer.
fn produce(
    producer: QueueProducer,
    workload: Workload,
    default_step: Duration,
    shutdown: &Shutdown,
) -> ExtractStats {
    let mut sink = CancellableSink {
        producer: &producer,
        shutdown,
    };
    let mut total = ExtractStats::default();

    match workload {
        Workload::Documents(documents) => {
            for document in &documents {
                let mut extractor = Extractor::new(&mut sink, default_step);
                let result = extractor.extract(&document.root);
                let stats = extractor.stats();
                total += stats;
                tracing::debug!(
                    source = %document.origin,
                    queued = stats.emitted,
                    malformed = stats.malformed,
                    "Document walked"
                );
                if result.is_err() {
                    tracing::info!(source = %document.origin, "Queue closed, extraction stopped");
                    break;
                }
            }
        }
        Workload::Descriptors(descriptors) => {
            for descriptor in descriptors {
                if sink.emit(descriptor).is_err() {
                    tracing::info!("Queue closed, remaining items dropped");
                    break;
                }
                total.emitted += 1;
            }
        }
    }

    producer.close();
    total
}
