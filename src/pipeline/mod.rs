//! Query processing pipeline.
//!
//! # Data Flow
//! ```text
//! Workload (documents | descriptors)
//!     → orchestrator.rs (blocking producer: Extractor → CancellableSink)
//!     → queue.rs (bounded, single producer / many consumers)
//!     → worker.rs × N
//!         ├── placeholder? → skip
//!         ├── fetch.rs (RangeQuery + RetryPolicy)
//!         ├── sanitize.rs (NaN → 0.0)
//!         ├── render::Renderer (blocking pool)
//!         └── output::ImageStore
//!     → summary.rs (RunSummary)
//! ```
//!
//! # Design Decisions
//! - Shutdown is polled once per dequeued item; in-flight items finish
//! - A failing item is logged and counted, the run continues

pub mod fetch;
pub mod orchestrator;
pub mod queue;
pub mod sanitize;
pub mod summary;
pub mod worker;

pub use orchestrator::{Pipeline, PipelineSettings, Workload};
pub use queue::{bounded, QueueConsumer, QueueProducer};
pub use sanitize::{sanitize, DEFAULT_VALUE};
pub use summary::{RunStats, RunSummary};
pub use worker::{ItemError, ItemOutcome, Worker, WorkerContext};
