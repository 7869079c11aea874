//! Lifecycle management subsystem.
//!
//! # Data Flow
//! ```text
//! Startup (startup.rs):
//!     Resolve window → Create output dir → Build clients → Load documents
//!
//! Signals (signals.rs):
//!     SIGINT/SIGTERM/SIGHUP/SIGQUIT → Shutdown::trigger
//!
//! Shutdown (shutdown.rs):
//!     trigger → retry pauses end → workers stop at their next item
//!             → producer stops → run ends
//! ```
//!
//! # Design Decisions
//! - Cancellation is cooperative; in-flight items complete
//! - Startup failures are fatal, item failures are not

pub mod shutdown;
pub mod signals;
pub mod startup;

pub use shutdown::Shutdown;
pub use startup::{prepare, Prepared};
