//! Rendering subsystem.
//!
//! # Data Flow
//! ```text
//! sanitized SeriesMatrix + descriptor name
//!     → Renderer::render (chart.rs: plotters bitmap → PNG bytes)
//!     → output::ImageStore
//! ```
//!
//! # Design Decisions
//! - Renderers are synchronous and CPU-bound; workers call them on the
//!   blocking pool
//! - A renderer returns encoded bytes so persistence stays atomic

pub mod chart;

use thiserror::Error;

use crate::backend::SeriesMatrix;

pub use chart::ChartRenderer;

/// Errors raised while turning a matrix into an image.
#[derive(Debug, Error)]
pub enum RenderError {
    #[error("drawing failed: {0}")]
    Draw(String),

    #[error("encoding failed: {0}")]
    Encode(#[from] image::ImageError),
}

/// Turns a series matrix into encoded image bytes.
pub trait Renderer: Send + Sync {
    fn render(&self, title: &str, matrix: &SeriesMatrix) -> Result<Vec<u8>, RenderError>;
}
