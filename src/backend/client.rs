//! Prometheus HTTP API client.
//!
//! # Responsibilities
//! - Build the `query_range` endpoint from the configured address
//! - Issue range queries with a per-request timeout
//! - Decode the JSON envelope into a [`QueryValue`]

use std::collections::BTreeMap;
use std::time::Duration;

use async_trait::async_trait;
use serde::Deserialize;
use url::Url;

use crate::backend::types::{
    BackendError, BackendResult, QueryValue, Sample, Series, SeriesMatrix,
};
use crate::backend::RangeQuery;
use crate::config::{BackendConfig, TimeWindow};

const QUERY_RANGE_PATH: &str = "api/v1/query_range";
const MAX_ERROR_BODY: usize = 512;

/// Range-query client for a Prometheus-compatible backend.
///
/// `reqwest::Client` pools connections internally and is safe to share, so
/// one instance may serve every worker.
#[derive(Clone)]
pub struct PrometheusClient {
    http: reqwest::Client,
    endpoint: Url,
}

impl PrometheusClient {
    /// Create a client for the configured backend.
    pub fn new(config: &BackendConfig) -> BackendResult<Self> {
        let endpoint = query_range_endpoint(&config.address)?;

        let mut builder =
            reqwest::Client::builder().timeout(Duration::from_secs(config.request_timeout_secs));
        if !config.use_proxy_env {
            builder = builder.no_proxy();
        }
        let http = builder.build()?;

        tracing::debug!(endpoint = %endpoint, "Backend client initialized");
        Ok(Self { http, endpoint })
    }
}

impl std::fmt::Debug for PrometheusClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PrometheusClient")
            .field("endpoint", &self.endpoint.as_str())
            .finish()
    }
}

#[async_trait]
impl RangeQuery for PrometheusClient {
    async fn query_range(
        &self,
        expr: &str,
        window: &TimeWindow,
        step: Duration,
    ) -> BackendResult<QueryValue> {
        let params = [
            ("query", expr.to_string()),
            ("start", window.from.timestamp().to_string()),
            ("end", window.to.timestamp().to_string()),
            ("step", format_step(step)),
        ];

        let response = self
            .http
            .get(self.endpoint.clone())
            .query(&params)
            .send()
            .await?;
        let status = response.status().as_u16();
        let body = response.bytes().await?;

        decode_response(status, &body)
    }
}

fn query_range_endpoint(address: &str) -> BackendResult<Url> {
    let mut base = Url::parse(address)
        .map_err(|e| BackendError::InvalidAddress(format!("'{}': {}", address, e)))?;
    if !matches!(base.scheme(), "http" | "https") {
        return Err(BackendError::InvalidAddress(format!(
            "'{}': unsupported scheme",
            address
        )));
    }
    if !base.path().ends_with('/') {
        let path = format!("{}/", base.path());
        base.set_path(&path);
    }
    base.join(QUERY_RANGE_PATH)
        .map_err(|e| BackendError::InvalidAddress(format!("'{}': {}", address, e)))
}

fn format_step(step: Duration) -> String {
    if step.subsec_nanos() == 0 {
        step.as_secs().to_string()
    } else {
        format!("{}", step.as_secs_f64())
    }
}

#[derive(Debug, Deserialize)]
struct ApiResponse {
    status: String,
    #[serde(default)]
    data: Option<ApiData>,
    #[serde(default, rename = "errorType")]
    error_type: Option<String>,
    #[serde(default)]
    error: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ApiData {
    #[serde(rename = "resultType")]
    result_type: String,
    #[serde(default)]
    result: serde_json::Value,
}

#[derive(Debug, Deserialize)]
struct MatrixEntry {
    #[serde(default)]
    metric: BTreeMap<String, String>,
    #[serde(default)]
    values: Vec<(f64, String)>,
}

/// Decode a `query_range` response body.
pub(crate) fn decode_response(status: u16, body: &[u8]) -> BackendResult<QueryValue> {
    let api: ApiResponse = match serde_json::from_slice(body) {
        Ok(api) => api,
        Err(_) if !(200..300).contains(&status) => {
            let mut text = String::from_utf8_lossy(body).into_owned();
            if text.len() > MAX_ERROR_BODY {
                let cut = (0..=MAX_ERROR_BODY)
                    .rev()
                    .find(|&i| text.is_char_boundary(i))
                    .unwrap_or(0);
                text.truncate(cut);
            }
            return Err(BackendError::Status { status, body: text });
        }
        Err(e) => return Err(BackendError::Decode(e.to_string())),
    };

    if api.status != "success" {
        return Err(BackendError::Api {
            error_type: api.error_type.unwrap_or_else(|| format!("http_{}", status)),
            message: api.error.unwrap_or_default(),
        });
    }

    let data = api
        .data
        .ok_or_else(|| BackendError::Decode("missing data".to_string()))?;
    if data.result_type != "matrix" {
        return Ok(QueryValue::Other(data.result_type));
    }

    let entries: Vec<MatrixEntry> =
        serde_json::from_value(data.result).map_err(|e| BackendError::Decode(e.to_string()))?;

    let mut series = Vec::with_capacity(entries.len());
    for entry in entries {
        let samples = entry
            .values
            .into_iter()
            .map(|(ts, raw)| {
                raw.parse::<f64>()
                    .map(|value| Sample::new(ts, value))
                    .map_err(|_| BackendError::Decode(format!("invalid sample value '{}'", raw)))
            })
            .collect::<BackendResult<Vec<_>>>()?;
        series.push(Series::new(entry.metric, samples));
    }

    Ok(QueryValue::Matrix(SeriesMatrix::new(series)))
}
