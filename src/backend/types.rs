//! Series types and backend error definitions.

use std::collections::BTreeMap;

use thiserror::Error;

/// A single `(timestamp, value)` sample. Timestamps are unix seconds.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Sample {
    pub timestamp: f64,
    pub value: f64,
}

impl Sample {
    pub fn new(timestamp: f64, value: f64) -> Self {
        Self { timestamp, value }
    }
}

/// One labelled time series.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Series {
    pub metric: BTreeMap<String, String>,
    pub samples: Vec<Sample>,
}

impl Series {
    pub fn new(metric: BTreeMap<String, String>, samples: Vec<Sample>) -> Self {
        Self { metric, samples }
    }

    /// Human-readable label in the usual `name{k="v",...}` notation.
    pub fn label(&self) -> String {
        let name = self.metric.get("__name__").map(String::as_str).unwrap_or("");
        let labels: Vec<String> = self
            .metric
            .iter()
            .filter(|(k, _)| k.as_str() != "__name__")
            .map(|(k, v)| format!("{}=\"{}\"", k, v))
            .collect();

        if labels.is_empty() {
            if name.is_empty() {
                "{}".to_string()
            } else {
                name.to_string()
            }
        } else {
            format!("{}{{{}}}", name, labels.join(","))
        }
    }
}

/// Ordered collection of series returned by a range query.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct SeriesMatrix {
    pub series: Vec<Series>,
}

impl SeriesMatrix {
    pub fn new(series: Vec<Series>) -> Self {
        Self { series }
    }

    /// `(min, max)` timestamp over every sample.
    pub fn time_bounds(&self) -> Option<(f64, f64)> {
        bounds(self.samples().map(|s| s.timestamp))
    }

    /// `(min, max)` over every finite value.
    pub fn value_bounds(&self) -> Option<(f64, f64)> {
        bounds(self.samples().map(|s| s.value).filter(|v| v.is_finite()))
    }

    fn samples(&self) -> impl Iterator<Item = &Sample> {
        self.series.iter().flat_map(|s| s.samples.iter())
    }
}

fn bounds(values: impl Iterator<Item = f64>) -> Option<(f64, f64)> {
    values.fold(None, |acc, v| match acc {
        None => Some((v, v)),
        Some((lo, hi)) => Some((lo.min(v), hi.max(v))),
    })
}

/// Decoded result of a range query.
#[derive(Debug, Clone, PartialEq)]
pub enum QueryValue {
    /// Matrix-shaped result: the only kind that can be plotted.
    Matrix(SeriesMatrix),
    /// Any other result type (`vector`, `scalar`, `string`, ...).
    Other(String),
}

/// Errors that can occur while talking to the monitoring backend.
#[derive(Debug, Error)]
pub enum BackendError {
    /// Backend address could not be turned into a query endpoint.
    #[error("invalid backend address: {0}")]
    InvalidAddress(String),

    /// Connection, timeout or protocol failure.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Non-success HTTP status without a decodable error body.
    #[error("backend returned HTTP {status}: {body}")]
    Status { status: u16, body: String },

    /// The backend reported a query error.
    #[error("query failed ({error_type}): {message}")]
    Api { error_type: String, message: String },

    /// Response body did not match the expected envelope.
    #[error("malformed response: {0}")]
    Decode(String),
}

/// Result type for backend operations.
pub type BackendResult<T> = Result<T, BackendError>;
