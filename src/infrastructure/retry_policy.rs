//! Exponential backoff retry policy
//!
//! One policy object shared by every collector fetch loop and the ingestion
//! client. Delay for attempt `n` (1-based) is
//! `base_delay * backoff_multiplier^(n-1) + jitter`, capped at `max_delay`.

use serde::{Deserialize, Serialize};
use std::fmt::Display;
use std::future::Future;
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, warn};

use crate::infrastructure::config::defaults;

#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum RetryPolicyError {
    #[error("retry.max_attempts must be greater than 0")]
    NoAttempts,

    #[error("retry.base_delay_ms cannot be greater than max_delay_ms")]
    BaseDelayAboveMax,

    #[error("retry.backoff_multiplier must be at least 1.0")]
    ShrinkingBackoff,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub base_delay_ms: u64,
    pub max_delay_ms: u64,
    pub backoff_multiplier: f64,
    pub jitter_range_ms: u64,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: defaults::RETRY_MAX_ATTEMPTS,
            base_delay_ms: defaults::RETRY_BASE_DELAY_MS,
            max_delay_ms: defaults::RETRY_MAX_DELAY_MS,
            backoff_multiplier: defaults::RETRY_BACKOFF_MULTIPLIER,
            jitter_range_ms: defaults::RETRY_JITTER_RANGE_MS,
        }
    }
}

impl RetryPolicy {
    /// Single attempt, no waiting
    pub const fn no_retry() -> Self {
        Self {
            max_attempts: 1,
            base_delay_ms: 0,
            max_delay_ms: 0,
            backoff_multiplier: 1.0,
            jitter_range_ms: 0,
        }
    }

    pub const fn base_delay(&self) -> Duration {
        Duration::from_millis(self.base_delay_ms)
    }

    pub const fn max_delay(&self) -> Duration {
        Duration::from_millis(self.max_delay_ms)
    }

    pub const fn jitter_range(&self) -> Duration {
        Duration::from_millis(self.jitter_range_ms)
    }

    pub fn validate(&self) -> Result<(), RetryPolicyError> {
        if self.max_attempts == 0 {
            return Err(RetryPolicyError::NoAttempts);
        }
        if self.base_delay_ms > self.max_delay_ms {
            return Err(RetryPolicyError::BaseDelayAboveMax);
        }
        if !self.backoff_multiplier.is_finite() || self.backoff_multiplier < 1.0 {
            return Err(RetryPolicyError::ShrinkingBackoff);
        }
        Ok(())
    }

    /// Wait before retry number `attempt` (1 = first retry)
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    pub fn delay_for_attempt(&self, attempt: u32) -> Duration {
        let exponent = i32::try_from(attempt.saturating_sub(1)).unwrap_or(i32::MAX);
        let backoff = self.base_delay_ms as f64 * self.backoff_multiplier.powi(exponent);
        let backoff_ms = if backoff.is_finite() {
            backoff.min(self.max_delay_ms as f64) as u64
        } else {
            self.max_delay_ms
        };
        let jitter_ms = if self.jitter_range_ms == 0 {
            0
        } else {
            fastrand::u64(0..=self.jitter_range_ms)
        };
        Duration::from_millis(backoff_ms.saturating_add(jitter_ms).min(self.max_delay_ms))
    }

    /// Retries every error
    pub async fn execute<T, E, F, Fut>(&self, operation_name: &str, operation: F) -> Result<T, E>
    where
        F: FnMut(u32) -> Fut,
        Fut: Future<Output = Result<T, E>>,
        E: Display,
    {
        self.execute_if(operation_name, |_| true, operation).await
    }

    /// Runs `operation` up to `max_attempts` times; errors for which
    /// `should_retry` is false are returned immediately
    pub async fn execute_if<T, E, F, Fut, P>(
        &self,
        operation_name: &str,
        should_retry: P,
        mut operation: F,
    ) -> Result<T, E>
    where
        F: FnMut(u32) -> Fut,
        Fut: Future<Output = Result<T, E>>,
        E: Display,
        P: Fn(&E) -> bool,
    {
        let max_attempts = self.max_attempts.max(1);
        let mut attempt = 1;
        loop {
            match operation(attempt).await {
                Ok(value) => {
                    if attempt > 1 {
                        debug!("✅ {} succeeded on attempt {}", operation_name, attempt);
                    }
                    return Ok(value);
                }
                Err(error) if attempt < max_attempts && should_retry(&error) => {
                    let delay = self.delay_for_attempt(attempt);
                    warn!(
                        "🔄 {} failed (attempt {}/{}): {}; retrying in {:?}",
                        operation_name, attempt, max_attempts, error, delay
                    );
                    tokio::time::sleep(delay).await;
                    attempt += 1;
                }
                Err(error) => return Err(error),
            }
        }
    }
}
