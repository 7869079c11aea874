//! Shared utilities for integration tests.
#![allow(dead_code)]

use std::future::Future;
use std::net::SocketAddr;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;

use dash_plot::backend::{BackendResult, QueryValue, RangeQuery, Sample, Series, SeriesMatrix};
use dash_plot::config::TimeWindow;
use dash_plot::render::{RenderError, Renderer};

/// Bytes every `StubRenderer` image contains.
pub const STUB_PNG: &[u8] = b"\x89PNG stub image";

/// Start a programmable HTTP backend on an ephemeral port.
///
/// `f` receives the request target (path and query) and returns the status
/// and body of the response.
pub async fn start_programmable_backend<F, Fut>(f: F) -> SocketAddr
where
    F: Fn(String) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = (u16, String)> + Send + 'static,
{
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let f = Arc::new(f);

    tokio::spawn(async move {
        loop {
            match listener.accept().await {
                Ok((mut socket, _)) => {
                    let f = f.clone();
                    tokio::spawn(async move {
                        let target = read_request_target(&mut socket).await;
                        let (status, body) = f(target).await;
                        let status_text = match status {
                            200 => "200 OK",
                            404 => "404 Not Found",
                            500 => "500 Internal Server Error",
                            502 => "502 Bad Gateway",
                            503 => "503 Service Unavailable",
                            _ => "400 Bad Request",
                        };

                        let response_str = format!(
                            "HTTP/1.1 {}\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
                            status_text,
                            body.len(),
                            body
                        );
                        let _ = socket.write_all(response_str.as_bytes()).await;
                        let _ = socket.shutdown().await;
                    });
                }
                Err(_) => break,
            }
        }
    });

    addr
}

/// Read the request head and return its target, e.g. `/api/v1/query_range?query=up`.
async fn read_request_target(socket: &mut tokio::net::TcpStream) -> String {
    let mut head = Vec::new();
    let mut buf = [0u8; 1024];
    while !head.windows(4).any(|w| w == b"\r\n\r\n") {
        match socket.read(&mut buf).await {
            Ok(0) | Err(_) => break,
            Ok(n) => head.extend_from_slice(&buf[..n]),
        }
    }
    String::from_utf8_lossy(&head)
        .lines()
        .next()
        .and_then(|line| line.split_whitespace().nth(1))
        .unwrap_or_default()
        .to_string()
}

/// Decoded `query` parameter of a request target.
pub fn query_param(target: &str) -> Option<String> {
    let url = url::Url::parse(&format!("http://mock{}", target)).ok()?;
    url.query_pairs()
        .find(|(k, _)| k == "query")
        .map(|(_, v)| v.into_owned())
}

/// A successful matrix response with one series containing a NaN sample.
pub fn matrix_body() -> String {
    r#"{"status":"success","data":{"resultType":"matrix","result":[
        {"metric":{"__name__":"up","instance":"db-1"},"values":[[1700000000,"1"],[1700000015,"NaN"],[1700000030,"3.5"]]},
        {"metric":{"__name__":"up","instance":"db-2"},"values":[[1700000000,"2"],[1700000015,"2"],[1700000030,"+Inf"]]}
    ]}}"#
        .to_string()
}

pub fn vector_body() -> String {
    r#"{"status":"success","data":{"resultType":"vector","result":[]}}"#.to_string()
}

/// In-process backend that counts calls and can run a hook on each one.
pub struct FakeBackend {
    calls: AtomicUsize,
    latency: Duration,
    hook: Box<dyn Fn(usize) + Send + Sync>,
    queries: Mutex<Vec<String>>,
}

impl FakeBackend {
    pub fn new(latency: Duration) -> Self {
        Self::with_hook(latency, |_| {})
    }

    /// `hook` receives the 1-based call number before the call completes.
    pub fn with_hook(latency: Duration, hook: impl Fn(usize) + Send + Sync + 'static) -> Self {
        Self {
            calls: AtomicUsize::new(0),
            latency,
            hook: Box::new(hook),
            queries: Mutex::new(Vec::new()),
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn queries(&self) -> Vec<String> {
        self.queries.lock().unwrap().clone()
    }
}

#[async_trait]
impl RangeQuery for FakeBackend {
    async fn query_range(
        &self,
        expr: &str,
        window: &TimeWindow,
        step: Duration,
    ) -> BackendResult<QueryValue> {
        let call = self.calls.fetch_add(1, Ordering::SeqCst) + 1;
        self.queries.lock().unwrap().push(expr.to_string());
        (self.hook)(call);
        tokio::time::sleep(self.latency).await;

        let step = step.as_secs_f64().max(1.0);
        let start = window.from.timestamp() as f64;
        let samples = (0..4)
            .map(|i| Sample::new(start + i as f64 * step, i as f64))
            .collect();
        Ok(QueryValue::Matrix(SeriesMatrix::new(vec![Series::new(
            Default::default(),
            samples,
        )])))
    }
}

/// Renderer that returns fixed bytes without drawing.
pub struct StubRenderer;

impl Renderer for StubRenderer {
    fn render(&self, _title: &str, _matrix: &SeriesMatrix) -> Result<Vec<u8>, RenderError> {
        Ok(STUB_PNG.to_vec())
    }
}

/// File names in `dir`, sorted.
pub fn file_names(dir: &std::path::Path) -> Vec<String> {
    let mut names: Vec<String> = std::fs::read_dir(dir)
        .unwrap()
        .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
        .collect();
    names.sort();
    names
}
