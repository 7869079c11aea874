//! Resilience subsystem.
//!
//! # Data Flow
//! ```text
//! Range query to backend:
//!     → retries.rs (fixed delay between failed attempts)
//!     → final error surfaces to the worker, which logs and skips the item
//!
//! Remote dashboard document:
//!     → retries.rs (immediate retries, no delay)
//!     → final error aborts the run
//! ```
//!
//! # Design Decisions
//! - Every backend request carries the client's request timeout
//! - Retry counts are bounded; nothing retries forever

pub mod retries;

pub use retries::RetryPolicy;
