//! Observability subsystem.
//!
//! # Data Flow
//! ```text
//! All subsystems emit tracing events with structured fields
//!     → logging.rs (EnvFilter → fmt layer → stderr)
//! ```
//!
//! # Design Decisions
//! - Per-item failures carry the descriptor's name, expr and step
//! - Retry attempts before the last one are debug-level only

pub mod logging;
