// Retry logic for fire-time trigger calls
use crate::config::EngineConfig;
use crate::port::TriggerError;
use std::time::Duration;
use tracing::warn;

/// Retry decision result
#[derive(Debug, PartialEq, Eq)]
pub enum RetryDecision {
    /// Retry the call after this delay
    Retry(Duration),
    /// Do not retry; surface the failure
    GiveUp,
}

/// Bounded retry with a fixed delay.
///
/// Only transient failures are retried. Permanent failures give up at once.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TriggerRetryPolicy {
    max_retries: u32,
    delay: Duration,
}

impl TriggerRetryPolicy {
    /// Create a new retry policy
    ///
    /// # Arguments
    /// * `max_retries` - Retries after the first attempt (reference behavior: 2)
    /// * `delay` - Fixed wait between attempts
    pub fn new(max_retries: u32, delay: Duration) -> Self {
        Self { max_retries, delay }
    }

    pub fn from_config(config: &EngineConfig) -> Self {
        Self::new(
            config.trigger_max_retries,
            Duration::from_millis(config.trigger_retry_delay_ms),
        )
    }

    /// Total attempts including the first
    pub fn max_attempts(&self) -> u32 {
        self.max_retries + 1
    }

    /// Decide what to do after `attempts` calls have been made and the last failed
    pub fn should_retry(&self, attempts: u32, error: &TriggerError) -> RetryDecision {
        if !error.is_transient() {
            return RetryDecision::GiveUp;
        }

        if attempts >= self.max_attempts() {
            warn!(
                attempts,
                max_attempts = self.max_attempts(),
                "Max trigger attempts reached"
            );
            return RetryDecision::GiveUp;
        }

        RetryDecision::Retry(self.delay)
    }
}

impl Default for TriggerRetryPolicy {
    fn default() -> Self {
        Self::from_config(&EngineConfig::default())
    }
}
