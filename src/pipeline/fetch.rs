//! Range query execution with bounded retries.

use crate::backend::{BackendResult, QueryValue, RangeQuery};
use crate::config::TimeWindow;
use crate::dashboard::QueryDescriptor;
use crate::lifecycle::Shutdown;
use crate::resilience::RetryPolicy;

/// Run `descriptor` against `client` over `window`.
///
/// Failures before the last attempt are retried after the policy delay;
/// only the last attempt's error is returned. Shutdown during a delay stops
/// the retries.
pub async fn fetch(
    client: &dyn RangeQuery,
    policy: &RetryPolicy,
    window: &TimeWindow,
    descriptor: &QueryDescriptor,
    shutdown: &Shutdown,
) -> BackendResult<QueryValue> {
    policy
        .run_until(shutdown, |attempt| {
            tracing::trace!(name = %descriptor.name, attempt, "Querying backend");
            client.query_range(&descriptor.expr, window, descriptor.step)
        })
        .await
}
