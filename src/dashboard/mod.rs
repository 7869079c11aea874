//! Dashboard documents and query discovery.
//!
//! # Data Flow
//! ```text
//! JSON document
//!     → node.rs (ConfigNode: Mapping | Sequence | Scalar)
//!     → extract.rs (depth-first walk with title context)
//!     → QueryDescriptor per `expr` leaf
//!     → DescriptorSink (bounded queue in production, Vec in tests)
//! ```

pub mod descriptor;
pub mod extract;
pub mod node;

pub use descriptor::{descriptor_name, QueryDescriptor, PLACEHOLDER_MARKER};
pub use extract::{DescriptorSink, ExtractStats, Extractor, LeafError, SinkClosed};
pub use node::{ConfigNode, Scalar};
