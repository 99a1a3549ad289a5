//! Retry with exponential back-off and jitter for completion calls.
//!
//! Only transient transport failures are retried: connection errors, HTTP 429
//! and HTTP 5xx. Everything else, including envelope shape problems, is
//! returned on the first failure.

use std::future::Future;
use std::time::Duration;

use crate::error::CompletionError;

const MAX_DELAY: Duration = Duration::from_secs(30);

pub(crate) fn is_retriable(err: &CompletionError) -> bool {
    match err {
        CompletionError::Http(e) => e.is_connect() || e.is_request(),
        CompletionError::UnexpectedStatus { status, .. } => *status == 429 || *status >= 500,
        CompletionError::InvalidEndpoint { .. }
        | CompletionError::Deserialize(_)
        | CompletionError::MissingField(_) => false,
    }
}

/// Retry schedule for one completion exchange.
#[derive(Debug, Clone, Copy)]
pub(crate) struct Backoff {
    max_retries: u32,
    base_ms: u64,
}

impl Backoff {
    pub(crate) fn new(max_retries: u32, base_ms: u64) -> Self {
        Self {
            max_retries,
            base_ms,
        }
    }

    /// Delay before the `retry`-th retry (1-based) after `err`, or `None` to give up.
    ///
    /// A server `Retry-After` hint is used as-is (capped at 30 s). Otherwise the
    /// delay is `base_ms * 2^(retry-1)`, capped at 30 s, with +-25 % jitter.
    pub(crate) fn delay_after(&self, retry: u32, err: &CompletionError) -> Option<Duration> {
        if retry == 0 || retry > self.max_retries || !is_retriable(err) {
            return None;
        }
        if let CompletionError::UnexpectedStatus {
            retry_after: Some(hint),
            ..
        } = err
        {
            return Some((*hint).min(MAX_DELAY));
        }
        Some(self.exponential(retry).mul_f64(rand::random::<f64>() * 0.5 + 0.75))
    }

    fn exponential(&self, retry: u32) -> Duration {
        let factor = 1u64 << (retry - 1).min(10);
        Duration::from_millis(self.base_ms.saturating_mul(factor)).min(MAX_DELAY)
    }
}

/// Runs `operation` until it succeeds or `backoff` gives up on its error.
pub(crate) async fn retry_with_backoff<T, F, Fut>(
    backoff: Backoff,
    mut operation: F,
) -> Result<T, CompletionError>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, CompletionError>>,
{
    let mut retry = 0u32;
    loop {
        let err = match operation().await {
            Ok(value) => return Ok(value),
            Err(err) => err,
        };
        retry += 1;
        let Some(delay) = backoff.delay_after(retry, &err) else {
            return Err(err);
        };
        let status = match &err {
            CompletionError::UnexpectedStatus { status, .. } => Some(*status),
            _ => None,
        };
        tracing::warn!(
            retry,
            max_retries = backoff.max_retries,
            delay_ms = u64::try_from(delay.as_millis()).unwrap_or(u64::MAX),
            status,
            error = %err,
            "transient completion failure, retrying"
        );
        tokio::time::sleep(delay).await;
    }
}
