//! Caller-side retry of recoverable failures.
//!
//! The repository guard only classifies. Whoever drives convention
//! application decides whether to re-run it, using a bounded exponential
//! backoff [`RetryPolicy`].

use std::future::Future;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::error::ConventionApplicationError;
use crate::repository::GuardError;

/// Errors that know whether a retry may help.
pub trait Recoverable {
    fn is_recoverable(&self) -> bool;
}

impl Recoverable for GuardError {
    fn is_recoverable(&self) -> bool {
        GuardError::is_recoverable(self)
    }
}

impl Recoverable for ConventionApplicationError {
    fn is_recoverable(&self) -> bool {
        ConventionApplicationError::is_recoverable(self)
    }
}

/// Bounded exponential backoff.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RetryPolicy {
    /// Total attempts including the first one.
    pub max_attempts: u32,
    pub initial_delay_ms: u64,
    pub max_delay_ms: u64,
    pub multiplier: f64,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            initial_delay_ms: 200,
            max_delay_ms: 5_000,
            multiplier: 2.0,
        }
    }
}

impl RetryPolicy {
    /// Single attempt, no retries.
    pub fn none() -> Self {
        Self {
            max_attempts: 1,
            ..Self::default()
        }
    }

    /// Retries without waiting; for tests and offline runs.
    pub fn immediate(max_attempts: u32) -> Self {
        Self {
            max_attempts,
            initial_delay_ms: 0,
            max_delay_ms: 0,
            multiplier: 1.0,
        }
    }

    /// Delay before retry number `retry` (1-based).
    pub fn delay_for(&self, retry: u32) -> Duration {
        let factor = self.multiplier.max(1.0).powi(retry.saturating_sub(1) as i32);
        let millis = (self.initial_delay_ms as f64 * factor).min(self.max_delay_ms as f64);
        Duration::from_millis(millis as u64)
    }
}

/// Run `operation` until it succeeds, fails fatally, or attempts run out.
///
/// Returns the final result together with the number of attempts made.
pub async fn retry_recoverable<F, Fut, T, E>(policy: &RetryPolicy, mut operation: F) -> (Result<T, E>, u32)
where
    F: FnMut(u32) -> Fut,
    Fut: Future<Output = Result<T, E>>,
    E: Recoverable + std::fmt::Display,
{
    let max_attempts = policy.max_attempts.max(1);
    let mut attempt = 0;

    loop {
        attempt += 1;

        match operation(attempt).await {
            Ok(value) => return (Ok(value), attempt),
            Err(err) => {
                if attempt >= max_attempts || !err.is_recoverable() {
                    return (Err(err), attempt);
                }

                let delay = policy.delay_for(attempt);
                warn!(
                    attempt = attempt,
                    max_attempts = max_attempts,
                    delay_ms = delay.as_millis() as u64,
                    error = %err,
                    "Recoverable failure, retrying"
                );
                if !delay.is_zero() {
                    tokio::time::sleep(delay).await;
                }
            }
        }
    }
}
