//! Output subsystem.
//!
//! # Data Flow
//! ```text
//! PNG bytes + descriptor name
//!     → store.rs (collision policy → `.<name>.png.<seq>.part` → rename to `<name>.png`)
//! ```

pub mod store;

pub use store::{file_stem, ImageStore, StoreError};
