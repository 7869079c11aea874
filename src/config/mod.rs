//! Configuration management subsystem.
//!
//! # Data Flow
//! ```text
//! config file (TOML, optional)
//!     → loader.rs (parse & deserialize)
//!     → cli overrides (flags win over file values)
//!     → validation.rs (semantic checks)
//!     → RunConfig (validated, immutable)
//!     → shared via Arc with the pipeline
//! ```
//!
//! # Design Decisions
//! - Config is immutable once loaded; nothing is stored in globals
//! - All fields have defaults so a run needs no config file at all
//! - Validation separates syntactic (serde) from semantic checks

pub mod loader;
pub mod schema;
pub mod validation;
pub mod window;

pub use loader::{finalize, read_config, read_or_default, ConfigError};
pub use schema::{
    AdhocQuery, BackendConfig, CollisionPolicy, ObservabilityConfig, OutputConfig,
    PipelineConfig, RenderConfig, RetryConfig, RunConfig, SourceConfig, WindowConfig,
    DEFAULT_FALLBACK_URLS, DEFAULT_OUTPUT_DIR,
};
pub use validation::{validate_config, ValidationError};
pub use window::TimeWindow;
