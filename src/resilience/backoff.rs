//! Backoff schedules.
//!
//! Two shapes are used by the service:
//! - exponential (`initial * 2^attempt`) between retries of upstream fetches
//! - linear capped (`min(attempt * step, max)`) between reconnects to the KV store

use std::time::Duration;

use crate::config::KvConfig;

/// Delay before retrying after the zero-based `attempt` failed.
pub fn exponential_delay(attempt: u32, initial: Duration) -> Duration {
    let factor = 2u32.saturating_pow(attempt);
    initial.saturating_mul(factor)
}

/// Reconnect schedule for the connection-oriented KV client.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReconnectPolicy {
    step: Duration,
    max_delay: Duration,
    max_attempts: u32,
}

impl ReconnectPolicy {
    pub fn new(step: Duration, max_delay: Duration, max_attempts: u32) -> Self {
        Self {
            step,
            max_delay,
            max_attempts,
        }
    }

    pub fn from_config(config: &KvConfig) -> Self {
        Self::new(
            Duration::from_millis(config.reconnect_step_ms),
            Duration::from_millis(config.reconnect_max_delay_ms),
            config.reconnect_max_attempts,
        )
    }

    pub fn max_attempts(&self) -> u32 {
        self.max_attempts
    }

    /// Delay to wait before the one-based reconnect `attempt`, or `None`
    /// once the attempt budget is spent.
    pub fn delay_for_attempt(&self, attempt: u32) -> Option<Duration> {
        if attempt == 0 || attempt > self.max_attempts {
            return None;
        }
        Some(self.step.saturating_mul(attempt).min(self.max_delay))
    }
}

impl Default for ReconnectPolicy {
    fn default() -> Self {
        Self::from_config(&KvConfig::default())
    }
}
