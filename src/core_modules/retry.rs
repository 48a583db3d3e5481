// THEORY:
// The `retry` module is the resilience wrapper for calls to the inference
// collaborator. Rate limits and transient service hiccups are a fact of life
// at that boundary; the policy here absorbs them with exponential backoff
// while refusing to waste attempts on failures that cannot succeed.
//
// Key architectural principles:
// 1.  **One Composable Policy**: the policy is a small value applied exactly
//     once around each external call site. Stacking it (wrapping a wrapped
//     call) would multiply the attempt budget, so nothing in this crate ever
//     nests it.
// 2.  **Transient-Only**: permanent failures surface immediately. Only errors
//     the collaborator itself classifies as temporary consume backoff time.
// 3.  **No Timeout Of Its Own**: a call occupies its slot until it resolves;
//     the attempt budget is the only bound. Cancellation would belong to the
//     caller's runtime, not this policy.

use crate::detector::DetectorError;
use std::future::Future;
use std::time::Duration;
use tokio::time::sleep;
use tracing::warn;

/// Retry policy for external detector calls: a fixed attempt budget with
/// exponential backoff between transient failures.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RetryPolicy {
    /// Total number of attempts, the first call included.
    pub max_attempts: u32,
    /// Backoff before the second attempt; doubles after each further failure.
    pub initial_backoff: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 5,
            initial_backoff: Duration::from_secs(2),
        }
    }
}

impl RetryPolicy {
    /// Runs `operation`, retrying transient failures with exponential
    /// backoff. Permanent failures and exhausted budgets surface as-is.
    pub async fn run<T, F, Fut>(&self, mut operation: F) -> Result<T, DetectorError>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, DetectorError>>,
    {
        let mut backoff = self.initial_backoff;
        let mut attempt = 1;
        loop {
            match operation().await {
                Ok(value) => return Ok(value),
                Err(error) if error.is_transient() && attempt < self.max_attempts => {
                    warn!(
                        attempt,
                        max_attempts = self.max_attempts,
                        backoff_secs = backoff.as_secs_f64(),
                        %error,
                        "transient detector failure, backing off before retrying"
                    );
                    sleep(backoff).await;
                    backoff *= 2;
                    attempt += 1;
                }
                Err(error) => return Err(error),
            }
        }
    }
}
