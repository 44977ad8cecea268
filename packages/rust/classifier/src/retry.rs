//! Retry policy shared by every reasoning service call.

use std::time::Duration;

use newsrelay_shared::ReasoningConfig;

use crate::service::ServiceError;

/// How many times to try a call and how long to wait in between.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Attempts including the first one.
    pub max_attempts: u32,
    /// Attempt `n` (1-based) that failed transiently waits `n * backoff_base`.
    pub backoff_base: Duration,
    /// Wait after a rate limit that carried no hint.
    pub rate_limit_fallback: Duration,
    /// Added on top of a server-suggested wait.
    pub rate_limit_buffer: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::from_config(&ReasoningConfig::default())
    }
}

impl RetryPolicy {
    pub fn from_config(config: &ReasoningConfig) -> Self {
        Self {
            max_attempts: config.max_attempts.max(1),
            backoff_base: Duration::from_millis(config.backoff_base_ms),
            rate_limit_fallback: Duration::from_millis(config.rate_limit_fallback_ms),
            rate_limit_buffer: Duration::from_millis(config.rate_limit_buffer_ms),
        }
    }

    /// A policy that retries without sleeping. For tests.
    pub fn immediate(max_attempts: u32) -> Self {
        Self {
            max_attempts,
            backoff_base: Duration::ZERO,
            rate_limit_fallback: Duration::ZERO,
            rate_limit_buffer: Duration::ZERO,
        }
    }

    /// Wait before the next attempt after `attempt` failed with `error`.
    ///
    /// `None` means stop: the error is fatal or the budget is spent.
    pub fn delay_after(&self, attempt: u32, error: &ServiceError) -> Option<Duration> {
        if attempt >= self.max_attempts {
            return None;
        }
        match error {
            ServiceError::Fatal(_) => None,
            ServiceError::RateLimited {
                retry_after: Some(hint),
            } => Some(*hint + self.rate_limit_buffer),
            ServiceError::RateLimited { retry_after: None } => Some(self.rate_limit_fallback),
            ServiceError::Transient(_) => Some(self.backoff_base * attempt),
        }
    }
}
