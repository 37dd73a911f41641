//! Retry delays: doubling per retry, capped, plus up to 10% jitter.

use rand::Rng;
use std::time::Duration;

use crate::config::RetryConfig;

/// Delay before the `retry`-th retry (1 = first retry). Zero for `retry == 0`.
pub fn retry_delay(config: &RetryConfig, retry: u32) -> Duration {
    if retry == 0 {
        return Duration::ZERO;
    }

    let factor = 1u64.checked_shl(retry - 1).unwrap_or(u64::MAX);
    let capped = config.base_delay_ms.saturating_mul(factor).min(config.max_delay_ms);

    let jitter = match capped / 10 {
        0 => 0,
        spread => rand::thread_rng().gen_range(0..spread),
    };
    Duration::from_millis(capped + jitter)
}
