//! Retry policy with capped, jittered exponential backoff
//!
//! The retry loop is driven by an explicit state value: every failed
//! attempt is reported to [`RetryState::record_failure`], which answers
//! either with the wait before the next attempt or with the decision to
//! give up. Nothing here performs I/O or sleeps.

use crate::config::CrawlerConfig;
use rand::Rng;
use std::time::Duration;

/// How often and how patiently a logical fetch is retried
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Total attempts, including the first one
    pub max_attempts: u32,

    /// Wait after the first failed attempt
    pub base_delay: Duration,

    /// Upper bound for any single wait, jitter included
    pub max_delay: Duration,

    /// Upper bound of the uniform random jitter added to each wait
    pub jitter: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 5,
            base_delay: Duration::from_millis(500),
            max_delay: Duration::from_secs(4),
            jitter: Duration::from_secs(1),
        }
    }
}

impl RetryPolicy {
    pub fn from_config(config: &CrawlerConfig) -> Self {
        Self {
            max_attempts: config.max_attempts.max(1),
            base_delay: Duration::from_millis(config.backoff_base_ms),
            max_delay: Duration::from_millis(config.backoff_max_ms),
            jitter: Duration::from_millis(config.backoff_jitter_ms),
        }
    }

    /// A policy that never retries
    pub fn no_retry() -> Self {
        Self {
            max_attempts: 1,
            ..Self::default()
        }
    }

    /// Backoff for the `failed_attempt`-th failure without jitter:
    /// `min(max_delay, base_delay * 2^(failed_attempt - 1))`
    pub fn base_wait(&self, failed_attempt: u32) -> Duration {
        let exponent = failed_attempt.saturating_sub(1);
        let factor = 1u32.checked_shl(exponent).unwrap_or(u32::MAX);
        self.base_delay.saturating_mul(factor).min(self.max_delay)
    }

    /// Backoff for the `failed_attempt`-th failure with jitter, still capped
    pub fn wait_after(&self, failed_attempt: u32) -> Duration {
        let jitter_ms = self.jitter.as_millis() as u64;
        let jitter = if jitter_ms == 0 {
            Duration::ZERO
        } else {
            Duration::from_millis(rand::thread_rng().gen_range(0..=jitter_ms))
        };
        self.base_wait(failed_attempt)
            .saturating_add(jitter)
            .min(self.max_delay)
    }

    /// Starts tracking a new logical fetch
    pub fn start(&self) -> RetryState {
        RetryState {
            policy: *self,
            failures: 0,
        }
    }
}

/// What to do after a failed attempt
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RetryStep {
    /// Sleep for `wait`, then make attempt number `next_attempt`
    Retry { next_attempt: u32, wait: Duration },

    /// All attempts are used up
    GiveUp { attempts: u32 },
}

/// Progress of one logical fetch through its retry budget
#[derive(Debug, Clone)]
pub struct RetryState {
    policy: RetryPolicy,
    failures: u32,
}

impl RetryState {
    /// 1-based number of the attempt about to be made
    pub fn attempt(&self) -> u32 {
        self.failures + 1
    }

    /// Records a failed attempt and decides how to continue
    pub fn record_failure(&mut self) -> RetryStep {
        self.failures += 1;
        if self.failures >= self.policy.max_attempts {
            RetryStep::GiveUp {
                attempts: self.failures,
            }
        } else {
            RetryStep::Retry {
                next_attempt: self.failures + 1,
                wait: self.policy.wait_after(self.failures),
            }
        }
    }
}
