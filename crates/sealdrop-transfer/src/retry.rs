//! Bounded retry for transient segment-transport failures

use std::future::Future;

use tracing::warn;

use sealdrop_core::{SdResult, SealdropError};

/// Retry policy for one segment operation: a fixed attempt budget, no
/// backoff. Each attempt starts from scratch; no partial state survives
/// between attempts.
#[derive(Debug, Clone, Copy)]
pub struct RetryPolicy {
    pub max_attempts: u32,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self { max_attempts: 5 }
    }
}

impl RetryPolicy {
    /// Run `attempt` until it succeeds or the budget is exhausted, then
    /// fail with a fatal transfer error naming the last cause.
    pub async fn run<T, F, Fut>(&self, what: &str, mut attempt: F) -> SdResult<T>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = SdResult<T>>,
    {
        let mut last_error = None;
        for n in 1..=self.max_attempts {
            match attempt().await {
                Ok(value) => return Ok(value),
                Err(e) => {
                    warn!(what, attempt = n, max = self.max_attempts, error = %e, "attempt failed");
                    last_error = Some(e);
                }
            }
        }
        let cause = last_error
            .map(|e| e.to_string())
            .unwrap_or_else(|| "no attempts made".into());
        Err(SealdropError::Upload(format!(
            "{what} failed after {} attempts: {cause}",
            self.max_attempts
        )))
    }
}
