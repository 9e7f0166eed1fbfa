//! Retry policy for rate-limited and unavailable providers
//!
//! Only 429 and 503 are treated as "try again later". Everything else is a
//! caller or configuration problem and surfaces on the first attempt.

use rand::Rng;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Statuses that vendors use to signal a transient condition
pub const RETRYABLE_STATUSES: [u16; 2] = [429, 503];

/// Configuration for retry behavior
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct RetryPolicy {
    /// Maximum number of retry attempts (not including the initial attempt)
    pub max_retries: u32,

    /// Delay before the first retry (milliseconds)
    pub initial_delay_ms: u64,

    /// Growth factor between successive delays; must exceed 1
    pub backoff_multiplier: f64,

    /// Upper bound (exclusive) of the random jitter added to every delay
    pub max_jitter_ms: u64,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: 2,
            initial_delay_ms: 500,
            backoff_multiplier: 2.0,
            max_jitter_ms: 250,
        }
    }
}

impl RetryPolicy {
    /// Create a new retry policy with custom retry count
    pub fn new(max_retries: u32) -> Self {
        Self {
            max_retries,
            ..Default::default()
        }
    }

    /// Create a policy with no retries
    pub fn no_retry() -> Self {
        Self::new(0)
    }

    /// Total HTTP calls allowed
    pub fn total_attempts(&self) -> u32 {
        self.max_retries.saturating_add(1)
    }

    /// Check the policy's bounds
    pub fn check(&self) -> Result<(), String> {
        if !self.backoff_multiplier.is_finite() || self.backoff_multiplier <= 1.0 {
            return Err(format!(
                "backoff_multiplier must be greater than 1, got {}",
                self.backoff_multiplier
            ));
        }
        Ok(())
    }

    /// True for statuses that may clear up if retried after a delay
    pub fn is_retryable_status(status: u16) -> bool {
        RETRYABLE_STATUSES.contains(&status)
    }

    /// True when another attempt may follow attempt `attempt` (0-indexed)
    pub fn has_budget_after(&self, attempt: u32) -> bool {
        attempt.saturating_add(1) < self.total_attempts()
    }

    /// Exponential delay for a given attempt (0-indexed), without jitter
    pub fn backoff_delay(&self, attempt: u32) -> Duration {
        let exponent = i32::try_from(attempt).unwrap_or(i32::MAX);
        let delay_ms = (self.initial_delay_ms as f64 * self.backoff_multiplier.powi(exponent)).round();
        // Float-to-int casts saturate, so an overflowing schedule pins at u64::MAX
        Duration::from_millis(delay_ms as u64)
    }

    /// Delay before the next attempt, without jitter.
    ///
    /// A server-supplied Retry-After takes precedence over the exponential
    /// schedule.
    pub fn calculate_delay(&self, attempt: u32, retry_after: Option<Duration>) -> Duration {
        retry_after.unwrap_or_else(|| self.backoff_delay(attempt))
    }

    /// Random jitter in `[0, max_jitter_ms)`
    pub fn jitter(&self) -> Duration {
        if self.max_jitter_ms == 0 {
            return Duration::ZERO;
        }
        let mut rng = rand::thread_rng();
        Duration::from_millis(rng.gen_range(0..self.max_jitter_ms))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_retry_policy_defaults() {
        let policy = RetryPolicy::default();
        assert_eq!(policy.max_retries, 2);
        assert_eq!(policy.initial_delay_ms, 500);
        assert_eq!(policy.backoff_multiplier, 2.0);
        assert_eq!(policy.total_attempts(), 3);
        assert!(policy.check().is_ok());
    }

    #[test]
    fn test_exponential_backoff_calculation() {
        let policy = RetryPolicy::default();

        assert_eq!(policy.backoff_delay(0).as_millis(), 500);
        assert_eq!(policy.backoff_delay(1).as_millis(), 1000);
        assert_eq!(policy.backoff_delay(2).as_millis(), 2000);

        let fractional = RetryPolicy {
            initial_delay_ms: 100,
            backoff_multiplier: 1.5,
            ..Default::default()
        };
        assert_eq!(fractional.backoff_delay(3).as_millis(), 338); // 337.5 rounds up
    }

    #[test]
    fn test_retry_after_respected() {
        let policy = RetryPolicy::default();
        let delay = policy.calculate_delay(0, Some(Duration::from_secs(5)));
        assert_eq!(delay.as_secs(), 5);
        assert_eq!(policy.calculate_delay(1, None).as_millis(), 1000);
    }

    #[test]
    fn test_budget() {
        let policy = RetryPolicy::new(2);
        assert!(policy.has_budget_after(0));
        assert!(policy.has_budget_after(1));
        assert!(!policy.has_budget_after(2));

        assert!(!RetryPolicy::no_retry().has_budget_after(0));
    }

    #[test]
    fn test_retryable_statuses() {
        assert!(RetryPolicy::is_retryable_status(429));
        assert!(RetryPolicy::is_retryable_status(503));
        for status in [400, 401, 403, 404, 500, 502, 504] {
            assert!(!RetryPolicy::is_retryable_status(status));
        }
    }

    #[test]
    fn test_jitter_bounds() {
        let policy = RetryPolicy::default();
        for _ in 0..100 {
            assert!(policy.jitter() < Duration::from_millis(250));
        }
        let none = RetryPolicy {
            max_jitter_ms: 0,
            ..Default::default()
        };
        assert_eq!(none.jitter(), Duration::ZERO);
    }

    #[test]
    fn test_multiplier_bounds() {
        for multiplier in [1.0, 0.5, f64::NAN, f64::INFINITY] {
            let policy = RetryPolicy {
                backoff_multiplier: multiplier,
                ..Default::default()
            };
            assert!(policy.check().is_err());
        }
    }
}
