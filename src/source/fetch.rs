//! Remote dashboard download.

use thiserror::Error;
use url::Url;

use crate::resilience::RetryPolicy;

/// Failure of a single download attempt.
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("unexpected HTTP status {0}")]
    Status(u16),
}

/// Download `url`, retrying on any non-200 answer.
///
/// Attempts are not spaced; the policy is expected to be immediate.
pub async fn fetch_bytes(
    client: &reqwest::Client,
    url: &Url,
    policy: &RetryPolicy,
) -> Result<Vec<u8>, FetchError> {
    policy.run(|attempt| fetch_once(client, url, attempt)).await
}

async fn fetch_once(client: &reqwest::Client, url: &Url, attempt: u32) -> Result<Vec<u8>, FetchError> {
    tracing::debug!(url = %url, attempt, "Downloading dashboard");
    let response = client.get(url.clone()).send().await?;
    let status = response.status();
    if status != reqwest::StatusCode::OK {
        return Err(FetchError::Status(status.as_u16()));
    }
    Ok(response.bytes().await?.to_vec())
}
