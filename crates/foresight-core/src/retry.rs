//! Retry policy for transient provider failures.

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Exponential backoff configuration for agent provider calls.
///
/// Attempt `n` (0-based) sleeps `base_delay * 2^n`, capped at `max_delay`,
/// with multiplicative jitter so concurrent retries do not synchronize.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct RetryConfig {
    /// Total attempts including the first (must be >= 1).
    pub max_attempts: u32,
    /// Delay before the first retry, in milliseconds.
    pub base_delay_ms: u64,
    /// Upper bound on any single delay, in milliseconds.
    pub max_delay_ms: u64,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            base_delay_ms: 500,
            max_delay_ms: 8_000,
        }
    }
}

impl RetryConfig {
    /// Deterministic backoff delay before retrying after attempt `attempt`
    /// (0-based) failed.
    #[must_use]
    pub fn delay_for(&self, attempt: u32) -> Duration {
        let exp = attempt.min(16); // 2^16 * base already dwarfs any sane cap
        let delay = self.base_delay_ms.saturating_mul(1_u64 << exp);
        Duration::from_millis(delay.min(self.max_delay_ms))
    }

    /// [`delay_for`](Self::delay_for) with jitter in [0.5x, 1.5x).
    #[must_use]
    pub fn jittered_delay_for(&self, attempt: u32) -> Duration {
        let base = self.delay_for(attempt);
        let factor = 0.5 + rand::random::<f64>();
        base.mul_f64(factor)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn delay_doubles_per_attempt() {
        let cfg = RetryConfig::default();
        assert_eq!(cfg.delay_for(0), Duration::from_millis(500));
        assert_eq!(cfg.delay_for(1), Duration::from_millis(1_000));
        assert_eq!(cfg.delay_for(2), Duration::from_millis(2_000));
    }

    #[test]
    fn delay_is_capped() {
        let cfg = RetryConfig::default();
        assert_eq!(cfg.delay_for(10), Duration::from_millis(8_000));
        assert_eq!(cfg.delay_for(63), Duration::from_millis(8_000));
    }

    #[test]
    fn jitter_stays_within_band() {
        let cfg = RetryConfig::default();
        for _ in 0..100 {
            let d = cfg.jittered_delay_for(1);
            assert!(d >= Duration::from_millis(500));
            assert!(d < Duration::from_millis(1_500));
        }
    }

    #[test]
    fn serde_defaults_fill_missing_fields() {
        let cfg: RetryConfig = serde_json::from_str(r#"{"maxAttempts": 5}"#).unwrap();
        assert_eq!(cfg.max_attempts, 5);
        assert_eq!(cfg.base_delay_ms, 500);
    }
}
