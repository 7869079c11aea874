//! Dashboard query renderer.
//!
//! Walks monitoring dashboard documents, runs every query they contain as a
//! range query against a Prometheus-compatible backend and writes one PNG
//! line chart per query.

// Inputs
pub mod cli;
pub mod config;
pub mod dashboard;
pub mod source;

// Processing
pub mod backend;
pub mod pipeline;
pub mod render;
pub mod output;

// Cross-cutting concerns
pub mod error;
pub mod lifecycle;
pub mod observability;
pub mod resilience;

pub use config::RunConfig;
pub use error::{Error, Result};
pub use lifecycle::Shutdown;
pub use pipeline::{Pipeline, RunSummary};
