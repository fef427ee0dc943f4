//! Retry strategy for transient listing request failures

use std::time::Duration;

/// Delay shape between attempts
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Backoff {
    /// Same pause after every failure
    Fixed(Duration),
    /// `min(initial * 2^(failures - 1), max)`
    Exponential { initial: Duration, max: Duration },
}

impl Backoff {
    fn delay(&self, failures: u32) -> Duration {
        match *self {
            Backoff::Fixed(delay) => delay,
            Backoff::Exponential { initial, max } => {
                let factor = 2_u32.saturating_pow(failures.saturating_sub(1));
                initial.saturating_mul(factor).min(max)
            }
        }
    }
}

/// How often and how patiently a failed page request is retried.
///
/// `max_attempts` counts every attempt including the first one; `None`
/// retries until the request succeeds.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RetryPolicy {
    pub max_attempts: Option<u32>,
    pub backoff: Backoff,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::forever(Duration::from_secs(2))
    }
}

impl RetryPolicy {
    /// Keep retrying with a fixed pause
    pub fn forever(delay: Duration) -> Self {
        Self {
            max_attempts: None,
            backoff: Backoff::Fixed(delay),
        }
    }

    pub fn bounded(max_attempts: u32, backoff: Backoff) -> Self {
        Self {
            max_attempts: Some(max_attempts.max(1)),
            backoff,
        }
    }

    /// Pause to take after `failures` consecutive failed attempts, or `None`
    /// when no attempts are left.
    pub fn next_delay(&self, failures: u32) -> Option<Duration> {
        if let Some(max) = self.max_attempts {
            if failures >= max {
                return None;
            }
        }
        Some(self.backoff.delay(failures))
    }
}
