//! Retry logic with exponential backoff
//!
//! Configurable retry for transient storage-transport failures, with
//! exponential backoff and optional jitter to avoid thundering herd against
//! a router that just came back up. Retryability is decided by
//! [`IsRetryable`]; permanent failures (unauthorized, not found) surface
//! immediately.

use rand::Rng;
use std::future::Future;
use std::time::Duration;

use crate::config::RetryConfig;
use crate::error::IsRetryable;

/// Execute an async operation with exponential backoff retry logic.
///
/// Retries only errors whose [`IsRetryable::is_retryable`] returns true, up
/// to `config.max_attempts` additional attempts. Returns the successful
/// result or the last error once attempts are exhausted.
pub async fn with_retry<F, Fut, T, E>(config: &RetryConfig, mut operation: F) -> Result<T, E>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, E>>,
    E: IsRetryable + std::fmt::Display,
{
    let mut attempt = 0;
    let mut delay = config.initial_delay;

    loop {
        match operation().await {
            Ok(result) => {
                if attempt > 0 {
                    tracing::info!(attempts = attempt + 1, "Operation succeeded after retry");
                }
                return Ok(result);
            }
            Err(e) if e.is_retryable() && attempt < config.max_attempts => {
                attempt += 1;
                tracing::warn!(
                    error = %e,
                    attempt = attempt,
                    max_attempts = config.max_attempts,
                    delay_ms = delay.as_millis(),
                    "Operation failed, retrying"
                );

                let jittered = if config.jitter { add_jitter(delay) } else { delay };
                tokio::time::sleep(jittered).await;

                let next = Duration::from_secs_f64(delay.as_secs_f64() * config.backoff_multiplier);
                delay = next.min(config.max_delay);
            }
            Err(e) => {
                tracing::error!(error = %e, attempts = attempt + 1, "Operation failed permanently");
                return Err(e);
            }
        }
    }
}

/// Add up to 25% random jitter to a delay.
fn add_jitter(delay: Duration) -> Duration {
    let jitter_range = delay.as_secs_f64() * 0.25;
    let jitter = rand::thread_rng().gen_range(0.0..=jitter_range);
    delay + Duration::from_secs_f64(jitter)
}
