//! Retry budgets for read requests.

use std::time::Duration;

/// Delay between a failed read and its next attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BackoffStrategy {
    /// Retry immediately.
    None,
    /// Double the delay after every failure, up to `max`.
    Exponential { base: Duration, max: Duration },
}

impl BackoffStrategy {
    /// Delay after the failed attempt `attempt` (0-indexed).
    pub fn delay_after(&self, attempt: u32) -> Duration {
        match self {
            Self::None => Duration::ZERO,
            Self::Exponential { base, max } => {
                base.saturating_mul(2u32.saturating_pow(attempt)).min(*max)
            }
        }
    }
}

impl Default for BackoffStrategy {
    fn default() -> Self {
        Self::Exponential {
            base: Duration::from_millis(200),
            max: Duration::from_secs(2),
        }
    }
}

/// How one attempt at a read went wrong.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AttemptFailure {
    /// The service answered with a non-success status.
    Status(u16),
    /// No response within the endpoint's budget.
    Timeout,
    /// Connection refused, reset or never established.
    Connect,
    /// Any other transport failure.
    Other,
}

impl AttemptFailure {
    /// Failures another attempt may get past: server errors, timeouts and
    /// connection problems. Client errors are final.
    pub fn is_transient(&self) -> bool {
        match self {
            Self::Status(code) => (500..600).contains(code),
            Self::Timeout | Self::Connect => true,
            Self::Other => false,
        }
    }
}

/// Retry budget for one endpoint.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Extra attempts after the first.
    pub max_retries: u32,
    pub backoff: BackoffStrategy,
}

impl RetryPolicy {
    pub fn new(max_retries: u32) -> Self {
        Self {
            max_retries,
            backoff: BackoffStrategy::default(),
        }
    }

    /// Send once, never retry.
    pub fn none() -> Self {
        Self {
            max_retries: 0,
            backoff: BackoffStrategy::None,
        }
    }

    pub fn with_backoff(mut self, backoff: BackoffStrategy) -> Self {
        self.backoff = backoff;
        self
    }

    /// Whether attempt number `attempt` (0-indexed) should be followed by
    /// another one.
    pub fn should_retry(&self, failure: AttemptFailure, attempt: u32) -> bool {
        attempt < self.max_retries && failure.is_transient()
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::new(1)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_exponential_backoff_is_capped() {
        let backoff = BackoffStrategy::Exponential {
            base: Duration::from_millis(100),
            max: Duration::from_millis(350),
        };
        assert_eq!(backoff.delay_after(0), Duration::from_millis(100));
        assert_eq!(backoff.delay_after(1), Duration::from_millis(200));
        assert_eq!(backoff.delay_after(2), Duration::from_millis(350));
        assert_eq!(backoff.delay_after(40), Duration::from_millis(350));
    }

    #[test]
    fn test_only_transient_failures_use_the_budget() {
        let policy = RetryPolicy::new(2);
        assert!(policy.should_retry(AttemptFailure::Status(503), 0));
        assert!(policy.should_retry(AttemptFailure::Timeout, 1));
        assert!(!policy.should_retry(AttemptFailure::Status(500), 2));
        assert!(!policy.should_retry(AttemptFailure::Status(404), 0));
        assert!(!policy.should_retry(AttemptFailure::Status(429), 0));
        assert!(!policy.should_retry(AttemptFailure::Other, 0));
        assert!(!RetryPolicy::none().should_retry(AttemptFailure::Connect, 0));
    }
}
