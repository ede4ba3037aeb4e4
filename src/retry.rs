//! Retry with exponential backoff.

use serde::Deserialize;
use std::fmt::Display;
use std::future::Future;
use std::time::Duration;
use tracing::{trace, warn};

/// Retry configuration. Attempts are counted from 1, so `max_retries` is the
/// total number of attempts made before giving up.
#[derive(Deserialize, Debug, Clone, PartialEq)]
pub struct RetryPolicy {
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,
    /// Sleep after the first failed attempt, in seconds
    #[serde(default = "default_delay_secs")]
    pub delay_secs: f64,
    /// Multiplier applied to the sleep after each further failure
    #[serde(default = "default_backoff")]
    pub backoff: f64,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: default_max_retries(),
            delay_secs: default_delay_secs(),
            backoff: default_backoff(),
        }
    }
}

fn default_max_retries() -> u32 {
    3
}

fn default_delay_secs() -> f64 {
    1.0
}

fn default_backoff() -> f64 {
    2.0
}

impl RetryPolicy {
    /// Sleep before the attempt following failed attempt `attempt`:
    /// `delay * backoff^(attempt - 1)`.
    pub fn delay_after(&self, attempt: u32) -> Duration {
        let exponent = attempt.saturating_sub(1) as i32;
        let secs = self.delay_secs * self.backoff.powi(exponent);
        Duration::try_from_secs_f64(secs.max(0.0)).unwrap_or(Duration::MAX)
    }

    fn attempts(&self) -> u32 {
        self.max_retries.max(1)
    }
}

/// Run `op` until it succeeds, `is_retryable` rejects its error, or the
/// policy's attempts are exhausted. The last error is returned unchanged.
pub async fn with_retry<T, E, F, Fut, P>(policy: &RetryPolicy, is_retryable: P, mut op: F) -> Result<T, E>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, E>>,
    P: Fn(&E) -> bool,
    E: Display,
{
    let max_attempts = policy.attempts();
    let mut attempt = 1;
    loop {
        trace!("Attempt {}/{}", attempt, max_attempts);
        match op().await {
            Ok(value) => return Ok(value),
            Err(e) if attempt < max_attempts && is_retryable(&e) => {
                let sleep = policy.delay_after(attempt);
                warn!(
                    "Attempt {}/{} failed: {}; retrying in {:.2}s",
                    attempt,
                    max_attempts,
                    e,
                    sleep.as_secs_f64()
                );
                tokio::time::sleep(sleep).await;
                attempt += 1;
            }
            Err(e) => return Err(e),
        }
    }
}
