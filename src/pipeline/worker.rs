//! Per-item worker loop.
//!
//! # Responsibilities
//! - Pull descriptors until the queue is closed and drained
//! - Stop as soon as shutdown is observed
//! - Fetch, sanitize, render and persist one item at a time
//!
//! Item failures are logged with their descriptor and never abort the run.

use std::path::PathBuf;
use std::sync::Arc;

use thiserror::Error;

use crate::backend::{BackendError, QueryValue, RangeQuery};
use crate::config::TimeWindow;
use crate::dashboard::QueryDescriptor;
use crate::lifecycle::Shutdown;
use crate::output::{ImageStore, StoreError};
use crate::pipeline::fetch::fetch;
use crate::pipeline::queue::QueueConsumer;
use crate::pipeline::sanitize::sanitize;
use crate::pipeline::summary::RunStats;
use crate::render::{RenderError, Renderer};
use crate::resilience::RetryPolicy;

/// Why an item produced no image.
#[derive(Debug, Error)]
pub enum ItemError {
    #[error("fetch failed: {0}")]
    Fetch(#[from] BackendError),

    #[error("render failed: {0}")]
    Render(#[from] RenderError),

    #[error("render task aborted: {0}")]
    Join(String),

    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Result of processing one descriptor.
#[derive(Debug)]
pub enum ItemOutcome {
    /// Image persisted at this path.
    Written(PathBuf),
    /// Expression still contains a template placeholder.
    Placeholder,
    /// Backend answered with a non-matrix result of this type.
    NoData(String),
    Failed(ItemError),
    /// Dequeued after shutdown, or its retries were cut short by it.
    Cancelled,
}

/// State shared by every worker of a run.
pub struct WorkerContext {
    pub window: TimeWindow,
    pub policy: RetryPolicy,
    pub renderer: Arc<dyn Renderer>,
    pub store: Arc<ImageStore>,
    pub shutdown: Shutdown,
    pub stats: Arc<RunStats>,
}

/// One member of the worker pool.
pub struct Worker {
    id: usize,
    client: Arc<dyn RangeQuery>,
    queue: QueueConsumer,
    ctx: Arc<WorkerContext>,
}

impl Worker {
    pub fn new(
        id: usize,
        client: Arc<dyn RangeQuery>,
        queue: QueueConsumer,
        ctx: Arc<WorkerContext>,
    ) -> Self {
        Self {
            id,
            client,
            queue,
            ctx,
        }
    }

    /// Drain the queue. Returns when it is closed and empty, or on shutdown.
    pub async fn run(self) {
        tracing::debug!(worker = self.id, "Worker started");

        while let Some(descriptor) = self.queue.pop().await {
            self.ctx.stats.record_dequeued();

            if self.ctx.shutdown.is_triggered() {
                let outcome = ItemOutcome::Cancelled;
                log_outcome(self.id, &descriptor, &outcome);
                self.ctx.stats.record(&outcome);
                break;
            }

            let outcome = self.process(&descriptor).await;
            log_outcome(self.id, &descriptor, &outcome);
            self.ctx.stats.record(&outcome);
        }

        tracing::debug!(worker = self.id, "Worker stopped");
    }

    /// Process a single descriptor end to end.
    pub async fn process(&self, descriptor: &QueryDescriptor) -> ItemOutcome {
        if descriptor.has_placeholder() {
            return ItemOutcome::Placeholder;
        }

        let value = match fetch(
            self.client.as_ref(),
            &self.ctx.policy,
            &self.ctx.window,
            descriptor,
            &self.ctx.shutdown,
        )
        .await
        {
            Ok(value) => value,
            Err(_) if self.ctx.shutdown.is_triggered() => return ItemOutcome::Cancelled,
            Err(e) => return ItemOutcome::Failed(e.into()),
        };

        let mut matrix = match value {
            QueryValue::Matrix(matrix) => matrix,
            QueryValue::Other(kind) => return ItemOutcome::NoData(kind),
        };

        let replaced = sanitize(&mut matrix);
        if replaced > 0 {
            tracing::debug!(name = %descriptor.name, replaced, "Replaced NaN samples");
        }

        let renderer = self.ctx.renderer.clone();
        let title = descriptor.name.clone();
        let rendered = tokio::task::spawn_blocking(move || renderer.render(&title, &matrix)).await;
        let png = match rendered {
            Ok(Ok(png)) => png,
            Ok(Err(e)) => return ItemOutcome::Failed(e.into()),
            Err(e) => return ItemOutcome::Failed(ItemError::Join(e.to_string())),
        };

        match self.ctx.store.save(&descriptor.name, &png).await {
            Ok(path) => ItemOutcome::Written(path),
            Err(e) => ItemOutcome::Failed(e.into()),
        }
    }
}

fn log_outcome(worker: usize, descriptor: &QueryDescriptor, outcome: &ItemOutcome) {
    match outcome {
        ItemOutcome::Written(path) => {
            tracing::info!(worker, name = %descriptor.name, path = %path.display(), "Image written");
        }
        ItemOutcome::Placeholder => {
            tracing::debug!(worker, name = %descriptor.name, expr = %descriptor.expr, "Skipping templated query");
        }
        ItemOutcome::NoData(kind) => {
            tracing::info!(worker, name = %descriptor.name, result_type = %kind, "Query returned no matrix, skipping");
        }
        ItemOutcome::Failed(e) => {
            tracing::error!(
                worker,
                name = %descriptor.name,
                expr = %descriptor.expr,
                step = ?descriptor.step,
                error = %e,
                "Item failed"
            );
        }
        ItemOutcome::Cancelled => {
            tracing::debug!(worker, name = %descriptor.name, "Shutdown requested, dropping item");
        }
    }
}
