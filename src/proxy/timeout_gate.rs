//! Enforced timeout (spec.md §4.2 step 6): wraps the upstream round trip in
//! a deadline derived from the API's `hard_timeout` override or the proxy
//! default.

use crate::errors::GatewayError;
use std::future::Future;
use std::time::Duration;

/// Resolve the effective timeout for a request: the matched extended-path
/// rule's `hard_timeout_secs` if set, else the proxy-wide default.
pub fn effective_timeout(rule_timeout_secs: Option<u64>, default_secs: u64) -> Duration {
    Duration::from_secs(rule_timeout_secs.unwrap_or(default_secs))
}

/// Race `future` against `timeout`, mapping an expiry into
/// `GatewayError::UpstreamTimeout` (spec.md §7).
pub async fn enforce<T, F>(timeout: Duration, future: F) -> Result<T, GatewayError>
where
    F: Future<Output = T>,
{
    tokio::time::timeout(timeout, future)
        .await
        .map_err(|_| GatewayError::UpstreamTimeout)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn enforce_passes_through_fast_futures() {
        let result = enforce(Duration::from_millis(50), async { 42 }).await;
        assert_eq!(result.unwrap(), 42);
    }

    #[tokio::test]
    async fn enforce_times_out_slow_futures() {
        let result = enforce(Duration::from_millis(5), async {
            tokio::time::sleep(Duration::from_millis(50)).await;
            42
        })
        .await;
        assert!(matches!(result, Err(GatewayError::UpstreamTimeout)));
    }

    #[test]
    fn effective_timeout_prefers_rule_override() {
        assert_eq!(effective_timeout(Some(5), 30), Duration::from_secs(5));
        assert_eq!(effective_timeout(None, 30), Duration::from_secs(30));
    }
}
