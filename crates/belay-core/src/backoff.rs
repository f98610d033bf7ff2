//! Reconnect delay schedule.

use std::time::Duration;

/// Default delay before the first reconnect attempt.
pub const DEFAULT_BASE_DELAY: Duration = Duration::from_millis(500);

/// Default ceiling for any single reconnect delay.
pub const DEFAULT_MAX_DELAY: Duration = Duration::from_secs(10);

/// Bounded exponential backoff.
///
/// Attempt `n` (1-based) waits `min(base * 2^(n-1), max)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BackoffPolicy {
    /// Delay before the first retry.
    pub base: Duration,
    /// Upper bound on any delay.
    pub max: Duration,
}

impl Default for BackoffPolicy {
    fn default() -> Self {
        Self { base: DEFAULT_BASE_DELAY, max: DEFAULT_MAX_DELAY }
    }
}

impl BackoffPolicy {
    /// Delay before retry number `attempt` (1-based). Attempt 0 is treated as
    /// attempt 1.
    pub fn delay(&self, attempt: u32) -> Duration {
        let exponent = attempt.saturating_sub(1).min(31);
        self.base.saturating_mul(1u32 << exponent).min(self.max)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn doubles_until_ceiling() {
        let policy = BackoffPolicy::default();

        assert_eq!(policy.delay(1), Duration::from_millis(500));
        assert_eq!(policy.delay(2), Duration::from_secs(1));
        assert_eq!(policy.delay(3), Duration::from_secs(2));
        assert_eq!(policy.delay(5), Duration::from_secs(8));
        assert_eq!(policy.delay(6), Duration::from_secs(10));
        assert_eq!(policy.delay(60), Duration::from_secs(10));
    }

    #[test]
    fn attempt_zero_uses_base() {
        let policy = BackoffPolicy::default();
        assert_eq!(policy.delay(0), policy.base);
    }
}
