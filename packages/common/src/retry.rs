use std::time::Duration;

use rand::Rng;

/// Bounded retry policy with exponential backoff.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Failed attempts tolerated before giving up.
    pub max_retries: u8,
    pub base_ms: u64,
    pub max_ms: u64,
}

/// Outcome of recording one more failure against a [`RetryPolicy`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RetryDecision {
    /// Wait `delay` and try again. `attempt` is 1-based.
    Retry { attempt: u8, delay: Duration },
    Exhausted { attempts: u8 },
}

impl RetryPolicy {
    pub fn new(max_retries: u8, base_ms: u64, max_ms: u64) -> Self {
        Self {
            max_retries,
            base_ms,
            max_ms,
        }
    }

    /// Decide what to do after the `failures`-th consecutive failure.
    pub fn decide(&self, failures: u8) -> RetryDecision {
        if failures > self.max_retries {
            RetryDecision::Exhausted { attempts: failures }
        } else {
            RetryDecision::Retry {
                attempt: failures,
                delay: calculate_backoff(failures, self.base_ms, self.max_ms),
            }
        }
    }
}

/// Calculate exponential backoff delay with jitter.
///
/// Formula: `min(base_ms * 2^(attempt-1) + jitter, max_ms)` (0-25% jitter)
pub fn calculate_backoff(attempt: u8, base_ms: u64, max_ms: u64) -> Duration {
    if attempt == 0 {
        return Duration::ZERO;
    }

    let exp_factor = 2u64.saturating_pow((attempt - 1) as u32);
    let delay_ms = base_ms.saturating_mul(exp_factor);

    let jitter = if delay_ms > 0 {
        rand::rng().random_range(0..=delay_ms / 4)
    } else {
        0
    };

    let total_delay = delay_ms.saturating_add(jitter).min(max_ms);
    Duration::from_millis(total_delay)
}
