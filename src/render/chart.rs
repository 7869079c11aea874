//! Line chart rendering with plotters.
//!
//! # Responsibilities
//! - Draw every series of a matrix as one coloured line
//! - Encode the bitmap as PNG in memory
//!
//! # Design Decisions
//! - Drawing happens on an in-memory RGB buffer; nothing touches the disk here
//! - Text needs a TrueType font registered once per process. Without one the
//!   chart is still drawn, just without caption, axis labels or legend
//! - Non-finite values are left out of the lines (NaN is sanitized earlier)

use std::io::Cursor;
use std::path::{Path, PathBuf};
use std::sync::OnceLock;

use chrono::{DateTime, Local};
use image::{ImageFormat, RgbImage};
use plotters::prelude::*;
use plotters::style::FontStyle;

use crate::backend::SeriesMatrix;
use crate::config::RenderConfig;
use crate::render::{RenderError, Renderer};

const FONT_FAMILY: &str = "sans-serif";
const MAX_LEGEND_ENTRIES: usize = 12;

const FONT_CANDIDATES: [&str; 6] = [
    "/usr/share/fonts/truetype/dejavu/DejaVuSans.ttf",
    "/usr/share/fonts/TTF/DejaVuSans.ttf",
    "/usr/share/fonts/dejavu/DejaVuSans.ttf",
    "/usr/share/fonts/truetype/liberation/LiberationSans-Regular.ttf",
    "/System/Library/Fonts/Supplemental/Arial.ttf",
    "C:\\Windows\\Fonts\\arial.ttf",
];

static FONT_READY: OnceLock<bool> = OnceLock::new();

/// PNG line chart renderer.
#[derive(Debug, Clone)]
pub struct ChartRenderer {
    width: u32,
    height: u32,
    text: bool,
}

impl ChartRenderer {
    /// Create a renderer, registering a font for labels if one can be found.
    pub fn new(config: &RenderConfig) -> Self {
        let text = *FONT_READY.get_or_init(|| register_font(config.font_path.as_deref()));
        Self {
            width: config.width,
            height: config.height,
            text,
        }
    }

    /// Create a renderer that never draws text.
    pub fn without_text(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            text: false,
        }
    }

    pub fn draws_text(&self) -> bool {
        self.text
    }

    fn draw(&self, title: &str, matrix: &SeriesMatrix, buffer: &mut [u8]) -> Result<(), RenderError> {
        let root = BitMapBackend::with_buffer(buffer, (self.width, self.height)).into_drawing_area();
        root.fill(&WHITE).map_err(draw_err)?;

        let (x_min, x_max) = padded(matrix.time_bounds(), 1.0);
        let (y_min, y_max) = padded(matrix.value_bounds(), 1.0);

        let mut builder = ChartBuilder::on(&root);
        builder.margin(12);
        if self.text {
            builder
                .caption(title, (FONT_FAMILY, 20))
                .x_label_area_size(32)
                .y_label_area_size(64);
        }
        let mut chart = builder
            .build_cartesian_2d(x_min..x_max, y_min..y_max)
            .map_err(draw_err)?;

        if self.text {
            chart
                .configure_mesh()
                .x_labels(6)
                .y_labels(6)
                .x_label_formatter(&format_time_label)
                .y_label_formatter(&format_value_label)
                .label_style((FONT_FAMILY, 12))
                .draw()
                .map_err(draw_err)?;
        }

        for (idx, series) in matrix.series.iter().enumerate() {
            let color = Palette99::pick(idx).to_rgba();
            let points = series
                .samples
                .iter()
                .filter(|s| s.value.is_finite())
                .map(|s| (s.timestamp, s.value));

            let anno = chart
                .draw_series(LineSeries::new(points, color.stroke_width(2)))
                .map_err(draw_err)?;
            if self.text && idx < MAX_LEGEND_ENTRIES {
                anno.label(series.label()).legend(move |(x, y)| {
                    PathElement::new(vec![(x, y), (x + 16, y)], color.stroke_width(2))
                });
            }
        }

        if self.text && !matrix.series.is_empty() {
            chart
                .configure_series_labels()
                .background_style(WHITE.mix(0.8))
                .border_style(BLACK)
                .label_font((FONT_FAMILY, 11))
                .draw()
                .map_err(draw_err)?;
        }

        root.present().map_err(draw_err)?;
        Ok(())
    }
}

impl Renderer for ChartRenderer {
    fn render(&self, title: &str, matrix: &SeriesMatrix) -> Result<Vec<u8>, RenderError> {
        let mut buffer = vec![0u8; self.width as usize * self.height as usize * 3];
        self.draw(title, matrix, &mut buffer)?;

        let image = RgbImage::from_raw(self.width, self.height, buffer)
            .ok_or_else(|| RenderError::Draw("bitmap size mismatch".to_string()))?;
        let mut png = Cursor::new(Vec::new());
        image.write_to(&mut png, ImageFormat::Png)?;
        Ok(png.into_inner())
    }
}

fn draw_err<E: std::fmt::Display>(e: E) -> RenderError {
    RenderError::Draw(e.to_string())
}

/// Widen a degenerate or missing range so plotters gets a non-empty axis.
fn padded(bounds: Option<(f64, f64)>, fallback_span: f64) -> (f64, f64) {
    match bounds {
        None => (0.0, fallback_span),
        Some((lo, hi)) if hi > lo => {
            let pad = (hi - lo) * 0.05;
            (lo - pad, hi + pad)
        }
        Some((v, _)) => {
            let pad = if v == 0.0 { fallback_span } else { v.abs() * 0.1 };
            (v - pad, v + pad)
        }
    }
}

fn format_time_label(ts: &f64) -> String {
    DateTime::from_timestamp(*ts as i64, 0)
        .map(|dt| dt.with_timezone(&Local).format("%m-%d %H:%M").to_string())
        .unwrap_or_default()
}

fn format_value_label(v: &f64) -> String {
    const UNITS: [(f64, &str); 4] = [(1e12, "T"), (1e9, "G"), (1e6, "M"), (1e3, "K")];
    let abs = v.abs();
    for (scale, suffix) in UNITS {
        if abs >= scale {
            return format!("{:.1}{}", v / scale, suffix);
        }
    }
    if abs >= 1.0 || abs == 0.0 {
        format!("{:.1}", v)
    } else {
        format!("{:.3}", v)
    }
}

fn register_font(configured: Option<&Path>) -> bool {
    let candidates = configured
        .map(Path::to_path_buf)
        .into_iter()
        .chain(FONT_CANDIDATES.iter().map(PathBuf::from));

    for path in candidates {
        let Ok(bytes) = std::fs::read(&path) else {
            continue;
        };
        // plotters keeps a reference for the lifetime of the process
        let bytes: &'static [u8] = Box::leak(bytes.into_boxed_slice());
        match plotters::style::register_font(FONT_FAMILY, FontStyle::Normal, bytes) {
            Ok(()) => {
                tracing::debug!(path = %path.display(), "Registered chart font");
                return true;
            }
            Err(_) => {
                tracing::warn!(path = %path.display(), "Ignoring unusable font");
            }
        }
    }

    tracing::warn!("No usable font found, charts will be drawn without text");
    false
}
