//! Exponential backoff with jitter for pull-channel reconnects.

use std::time::Duration;
use rand::Rng;

/// Exponential backoff delay for the given attempt, plus up to 10% jitter.
///
/// Attempt 0 means "no failure yet" and yields no delay.
pub fn calculate_backoff(attempt: u32, base_ms: u64, max_ms: u64) -> Duration {
    if attempt == 0 || base_ms == 0 {
        return Duration::ZERO;
    }

    let factor = 2u64.saturating_pow(attempt.saturating_sub(1).min(32));
    let capped = base_ms.saturating_mul(factor).min(max_ms);

    let jitter_range = capped / 10;
    let jitter = if jitter_range > 0 {
        rand::thread_rng().gen_range(0..jitter_range)
    } else {
        0
    };

    Duration::from_millis(capped + jitter)
}

/// Consecutive-failure tracker for one reconnecting channel.
#[derive(Debug, Default)]
pub struct ReconnectBackoff {
    failures: u32,
}

impl ReconnectBackoff {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a failure and return how long to wait before the next attempt.
    pub fn next_delay(&mut self, base_ms: u64, max_ms: u64) -> Duration {
        self.failures = self.failures.saturating_add(1);
        calculate_backoff(self.failures, base_ms, max_ms)
    }

    /// The channel came up; start over from the base delay.
    pub fn reset(&mut self) {
        self.failures = 0;
    }

    pub fn failures(&self) -> u32 {
        self.failures
    }
}
