//! Retry with exponential backoff.
//!
//! # Responsibilities
//! - Run a fallible async operation up to `max_attempts` times
//! - Retry only failures classified as transient (service unavailable)
//! - Wait `initial_delay * 2^attempt` between attempts
//!
//! # Design Decisions
//! - Non-transient errors are returned immediately; no attempts are spent
//! - The last attempt's error is returned unchanged
//! - Classification belongs to the error type via [`Transient`]

use std::fmt;
use std::future::Future;
use std::time::Duration;
use thiserror::Error;

use crate::config::RetryConfig;
use crate::observability::metrics;
use crate::resilience::backoff::exponential_delay;

const SERVICE_UNAVAILABLE: u16 = 503;

/// Classifies an error as a temporary upstream unavailability.
pub trait Transient: fmt::Display {
    /// HTTP-style status code carried by the error, if any.
    fn status_code(&self) -> Option<u16> {
        None
    }

    /// A carried status decides on its own; the message is only consulted
    /// for errors without one.
    fn is_transient(&self) -> bool {
        if let Some(status) = self.status_code() {
            return status == SERVICE_UNAVAILABLE;
        }
        let message = self.to_string();
        message.contains("503") || message.contains("Service Unavailable")
    }
}

/// Returned when the retry loop ends without a result, which only happens
/// with a zero attempt budget.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("Max retries reached")]
pub struct RetriesExhausted;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub initial_delay: Duration,
}

impl RetryPolicy {
    pub fn new(max_attempts: u32, initial_delay: Duration) -> Self {
        Self {
            max_attempts,
            initial_delay,
        }
    }

    pub fn from_config(config: &RetryConfig) -> Self {
        Self::new(config.max_attempts, config.initial_delay())
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::new(3, Duration::from_millis(1000))
    }
}

/// Run `operation` under `policy`.
pub async fn retry_with_backoff<T, E, F, Fut>(policy: &RetryPolicy, mut operation: F) -> Result<T, E>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, E>>,
    E: Transient + From<RetriesExhausted>,
{
    for attempt in 0..policy.max_attempts {
        let error = match operation().await {
            Ok(value) => return Ok(value),
            Err(e) => e,
        };

        let transient = error.is_transient();
        let last_attempt = attempt + 1 == policy.max_attempts;

        if last_attempt || !transient {
            tracing::error!(
                attempt = attempt + 1,
                max_attempts = policy.max_attempts,
                transient,
                error = %error,
                "Upstream request failed, no more retries"
            );
            return Err(error);
        }

        let delay = exponential_delay(attempt, policy.initial_delay);
        tracing::warn!(
            attempt = attempt + 1,
            max_attempts = policy.max_attempts,
            delay = ?delay,
            error = %error,
            "Upstream temporarily unavailable, retrying"
        );
        metrics::record_retry();
        tokio::time::sleep(delay).await;
    }

    Err(RetriesExhausted.into())
}
