//! Retry with exponential back-off and jitter for TourAPI requests.
//!
//! Only transport failures and 5xx statuses are retried. Credential errors,
//! rate limits, client-side statuses, API result codes, and malformed bodies
//! fail the same way on every attempt and are returned immediately.

use std::future::Future;
use std::time::Duration;

use crate::error::TourApiError;

const MAX_DELAY_MS: u64 = 30_000;

pub(crate) fn is_retriable(err: &TourApiError) -> bool {
    match err {
        TourApiError::Http(e) => e.is_timeout() || e.is_connect() || e.is_request() || e.is_body(),
        TourApiError::UnexpectedStatus { status, .. } => *status >= 500,
        TourApiError::MissingServiceKey
        | TourApiError::InvalidServiceKey { .. }
        | TourApiError::RateLimited { .. }
        | TourApiError::Malformed { .. }
        | TourApiError::Deserialize { .. }
        | TourApiError::Api { .. }
        | TourApiError::InvalidBaseUrl { .. } => false,
    }
}

/// How a [`TourApiClient`](crate::TourApiClient) retries one operation.
///
/// The wait before retry `n` is `backoff_base_ms × 2^(n-1)`, capped at 30 s,
/// then spread by ±25 % jitter so parallel enrichment lookups that hit the
/// same gateway outage do not come back in lockstep.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct RetryPolicy {
    pub(crate) max_retries: u32,
    pub(crate) backoff_base_ms: u64,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: 2,
            backoff_base_ms: 500,
        }
    }
}

impl RetryPolicy {
    /// Un-jittered wait before retry `attempt` (1-based).
    pub(crate) fn base_delay_ms(self, attempt: u32) -> u64 {
        let shift = attempt.saturating_sub(1).min(10);
        self.backoff_base_ms
            .saturating_mul(1u64 << shift)
            .min(MAX_DELAY_MS)
    }

    fn jittered_delay(self, attempt: u32) -> Duration {
        let base = self.base_delay_ms(attempt);
        #[allow(
            clippy::cast_possible_truncation,
            clippy::cast_sign_loss,
            clippy::cast_precision_loss
        )]
        let ms = (base as f64 * (rand::random::<f64>() * 0.5 + 0.75)) as u64;
        Duration::from_millis(ms)
    }

    /// Runs `request` for TourAPI operation `op`, retrying transient failures.
    pub(crate) async fn run<T, F, Fut>(self, op: &str, mut request: F) -> Result<T, TourApiError>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, TourApiError>>,
    {
        let mut attempt = 0u32;
        loop {
            let err = match request().await {
                Ok(value) => {
                    if attempt > 0 {
                        tracing::debug!(op, attempts = attempt + 1, "TourAPI call recovered");
                    }
                    return Ok(value);
                }
                Err(err) => err,
            };
            if !is_retriable(&err) || attempt >= self.max_retries {
                if attempt > 0 {
                    tracing::warn!(op, attempts = attempt + 1, error = %err, "TourAPI call failed after retries");
                }
                return Err(err);
            }
            attempt += 1;
            let delay = self.jittered_delay(attempt);
            tracing::warn!(
                op,
                attempt,
                max_retries = self.max_retries,
                delay_ms = u64::try_from(delay.as_millis()).unwrap_or(u64::MAX),
                error = %err,
                "TourAPI transient error, retrying"
            );
            tokio::time::sleep(delay).await;
        }
    }
}
