//! Bounded retry policy.
//!
//! A [`RetryPolicy`] describes how many failures an operation may absorb and
//! how long to wait between attempts. A [`RetryBudget`] is the per-operation
//! counter created from a policy; callers report each failure and act on the
//! returned [`RetryDecision`]. The budget never resets, so it can span a whole
//! multi-step operation such as a chunked upload.

use std::time::Duration;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Failures tolerated before giving up. `3` means four attempts in total.
    pub max_retries: u32,
    /// Fixed pause before each retry. Zero retries immediately.
    pub backoff: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: 3,
            backoff: Duration::ZERO,
        }
    }
}

impl RetryPolicy {
    pub fn new(max_retries: u32) -> Self {
        Self {
            max_retries,
            backoff: Duration::ZERO,
        }
    }

    pub fn with_backoff(mut self, backoff: Duration) -> Self {
        self.backoff = backoff;
        self
    }

    pub fn budget(&self) -> RetryBudget {
        RetryBudget {
            policy: self.clone(),
            failures: 0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RetryDecision {
    /// Try again after `delay`. `retry` is 1-based.
    Retry { retry: u32, delay: Duration },
    /// The budget is spent; `attempts` counts every failed try.
    Exhausted { attempts: u32 },
}

#[derive(Debug, Clone)]
pub struct RetryBudget {
    policy: RetryPolicy,
    failures: u32,
}

impl RetryBudget {
    pub fn record_failure(&mut self) -> RetryDecision {
        self.failures += 1;
        if self.failures > self.policy.max_retries {
            RetryDecision::Exhausted {
                attempts: self.failures,
            }
        } else {
            RetryDecision::Retry {
                retry: self.failures,
                delay: self.policy.backoff,
            }
        }
    }

    pub fn failures(&self) -> u32 {
        self.failures
    }
}
