//! Retry policy: retry budget and a fixed backoff delay.

use std::time::Duration;

/// Retry budget plus a fixed delay for one retry loop.
///
/// `send` and dispatch each hold their own policy and their own counter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Retries allowed after the first attempt.
    pub max_retries: u32,

    /// Wait before every retry.
    pub delay: Duration,
}

impl RetryPolicy {
    pub fn fixed(max_retries: u32, delay: Duration) -> Self {
        Self { max_retries, delay }
    }

    /// 1-indexed retry attempt number for a given remaining budget.
    ///
    /// With `max_retries = 3`: pending 3 → attempt 1, pending 1 → attempt 3.
    pub fn attempt_number(&self, pending: u32) -> u32 {
        self.max_retries.saturating_sub(pending) + 1
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::fixed(3, Duration::from_secs(2))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_policy_is_three_retries_two_seconds_apart() {
        let policy = RetryPolicy::default();
        assert_eq!(policy.max_retries, 3);
        assert_eq!(policy.delay, Duration::from_secs(2));
    }

    #[test]
    fn attempt_numbers_are_one_indexed() {
        let policy = RetryPolicy::default();
        assert_eq!(policy.attempt_number(3), 1);
        assert_eq!(policy.attempt_number(2), 2);
        assert_eq!(policy.attempt_number(1), 3);
    }
}
