//! Bounded retry with exponential backoff.
//!
//! The policy is plain data so it can live in [`Config`](crate::config::Config);
//! the loop that applies it is [`crate::app::ensure_ready`].

use core::fmt;
use core::time::Duration;

use serde::{Deserialize, Serialize};

/// How often and how patiently to retry getting the network ready.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RetryPolicy {
    /// Total number of wait attempts, including the first.
    pub max_attempts: u32,
    /// Delay after the first failed attempt.
    pub initial_delay_ms: u32,
    /// Upper bound for any single delay.
    pub max_delay_ms: u32,
    /// Growth factor between consecutive delays.
    pub multiplier: u32,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 5,
            initial_delay_ms: 500,
            max_delay_ms: 30_000,
            multiplier: 2,
        }
    }
}

/// A [`RetryPolicy`] that can never make progress.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PolicyError {
    /// `max_attempts` is zero.
    NoAttempts,
    /// `multiplier` is zero.
    ZeroMultiplier,
}

impl fmt::Display for PolicyError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PolicyError::NoAttempts => f.write_str("retry policy allows no attempts"),
            PolicyError::ZeroMultiplier => f.write_str("retry multiplier must be at least 1"),
        }
    }
}

impl core::error::Error for PolicyError {}

impl RetryPolicy {
    /// Checks that the policy allows at least one attempt.
    pub fn validate(&self) -> Result<(), PolicyError> {
        if self.max_attempts == 0 {
            return Err(PolicyError::NoAttempts);
        }
        if self.multiplier == 0 {
            return Err(PolicyError::ZeroMultiplier);
        }
        Ok(())
    }

    /// Delay to apply after failed attempt `attempt` (0-based).
    pub fn delay_for(&self, attempt: u32) -> Duration {
        let mut delay = self.initial_delay_ms.min(self.max_delay_ms);
        for _ in 0..attempt {
            if delay >= self.max_delay_ms {
                break;
            }
            delay = delay.saturating_mul(self.multiplier).min(self.max_delay_ms);
        }
        Duration::from_millis(u64::from(delay))
    }

    /// The delays between consecutive attempts, `max_attempts - 1` of them.
    pub fn backoff(&self) -> Backoff {
        Backoff {
            policy: *self,
            attempt: 0,
        }
    }
}

/// Iterator over the delays of a [`RetryPolicy`].
#[derive(Debug, Clone)]
pub struct Backoff {
    policy: RetryPolicy,
    attempt: u32,
}

impl Iterator for Backoff {
    type Item = Duration;

    fn next(&mut self) -> Option<Duration> {
        if self.attempt.saturating_add(1) >= self.policy.max_attempts {
            return None;
        }
        let delay = self.policy.delay_for(self.attempt);
        self.attempt += 1;
        Some(delay)
    }
}

#[cfg(feature = "defmt")]
impl defmt::Format for PolicyError {
    fn format(&self, f: defmt::Formatter) {
        match self {
            PolicyError::NoAttempts => defmt::write!(f, "NoAttempts"),
            PolicyError::ZeroMultiplier => defmt::write!(f, "ZeroMultiplier"),
        }
    }
}
