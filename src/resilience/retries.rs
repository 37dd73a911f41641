//! Retry logic for idempotent operations.
//!
//! # Design Decisions
//! - Only errors that report themselves retryable are retried
//! - Not-found and other 4xx answers are final on the first attempt
//! - Mutating submissions never go through here

use std::future::Future;

use crate::blockchain::types::ChainError;
use crate::config::RetryConfig;
use crate::resilience::backoff::retry_delay;

/// Errors that know whether another attempt could help.
pub trait Retryable {
    fn is_retryable(&self) -> bool;
}

impl Retryable for ChainError {
    fn is_retryable(&self) -> bool {
        ChainError::is_retryable(self)
    }
}

/// Run `op` until it succeeds, fails with a non-retryable error, or the
/// attempt budget from `config` is spent.
pub async fn retry_idempotent<T, E, F, Fut>(config: &RetryConfig, operation: &str, mut op: F) -> Result<T, E>
where
    E: Retryable + std::fmt::Display,
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, E>>,
{
    let max_attempts = if config.enabled {
        config.max_attempts.max(1)
    } else {
        1
    };

    let mut attempt = 0;
    loop {
        match op().await {
            Ok(value) => return Ok(value),
            Err(e) if e.is_retryable() && attempt + 1 < max_attempts => {
                attempt += 1;
                let delay = retry_delay(config, attempt);
                tracing::warn!(
                    operation,
                    attempt,
                    delay_ms = delay.as_millis() as u64,
                    error = %e,
                    "Retrying after transient failure"
                );
                tokio::time::sleep(delay).await;
            }
            Err(e) => return Err(e),
        }
    }
}
