//! Monitoring backend subsystem.
//!
//! # Data Flow
//! ```text
//! QueryDescriptor + TimeWindow
//!     → RangeQuery::query_range (client.rs: GET /api/v1/query_range)
//!     → QueryValue::Matrix(SeriesMatrix) | QueryValue::Other(kind)
//! ```
//!
//! # Design Decisions
//! - The pipeline depends on the `RangeQuery` capability, never on reqwest
//! - `Send + Sync` on the trait is the concurrency contract: a handle may be
//!   shared by every worker without external locking
//! - Non-matrix results are values, not errors; the caller decides to skip

pub mod client;
pub mod types;

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;

use crate::config::TimeWindow;

pub use client::PrometheusClient;
pub use types::{BackendError, BackendResult, QueryValue, Sample, Series, SeriesMatrix};

/// Executes one range query against the monitoring backend.
#[async_trait]
pub trait RangeQuery: Send + Sync {
    async fn query_range(
        &self,
        expr: &str,
        window: &TimeWindow,
        step: Duration,
    ) -> BackendResult<QueryValue>;
}

/// Backend handles handed to the worker pool.
#[derive(Clone)]
pub enum ClientHandles {
    /// One handle used concurrently by every worker.
    Shared(Arc<dyn RangeQuery>),
    /// A dedicated handle per worker.
    PerWorker(Vec<Arc<dyn RangeQuery>>),
}

impl ClientHandles {
    /// Handle for worker `index`.
    pub fn for_worker(&self, index: usize) -> Option<Arc<dyn RangeQuery>> {
        match self {
            ClientHandles::Shared(client) => Some(client.clone()),
            ClientHandles::PerWorker(clients) => clients.get(index).cloned(),
        }
    }

    /// Number of workers these handles can serve, `None` for unbounded.
    pub fn capacity(&self) -> Option<usize> {
        match self {
            ClientHandles::Shared(_) => None,
            ClientHandles::PerWorker(clients) => Some(clients.len()),
        }
    }
}

impl std::fmt::Debug for ClientHandles {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ClientHandles::Shared(_) => f.write_str("ClientHandles::Shared"),
            ClientHandles::PerWorker(c) => write!(f, "ClientHandles::PerWorker({})", c.len()),
        }
    }
}
