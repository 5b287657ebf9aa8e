//! Bounded retry for transient per-polygon failures.

use std::future::Future;
use std::time::Duration;

use wb_config::RetryConfig;

/// Retries an operation a fixed number of times with a doubling backoff.
///
/// The policy is deliberately separate from the work it wraps: the engine
/// reports transient failures as `Err` and nothing more, and the consumption
/// loop decides how often that is worth repeating.
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    max_attempts: u32,
    backoff: Duration,
}

impl RetryPolicy {
    pub fn new(max_attempts: u32, backoff: Duration) -> Self {
        Self {
            max_attempts: max_attempts.max(1),
            backoff,
        }
    }

    pub fn from_config(config: &RetryConfig) -> Self {
        Self::new(config.max_attempts, config.backoff.as_duration())
    }

    /// Run `op` until it succeeds or the attempt budget is spent, returning
    /// the last error. Sleeps `backoff` before the first retry, doubling on
    /// each further one.
    pub async fn run<T, E, F, Fut>(&self, label: &str, mut op: F) -> Result<T, E>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, E>>,
        E: std::fmt::Display,
    {
        let mut delay = self.backoff;
        let mut attempt = 1u32;
        loop {
            match op().await {
                Ok(value) => return Ok(value),
                Err(e) if attempt < self.max_attempts => {
                    wb_warn!(
                        pipe,
                        error = %e,
                        attempt,
                        "{label}: transient failure, retrying"
                    );
                    tokio::time::sleep(delay).await;
                    delay = delay.saturating_mul(2);
                    attempt += 1;
                }
                Err(e) => return Err(e),
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
