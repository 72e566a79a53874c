//! Retry with exponential backoff and randomized jitter.
//!
//! Chunk sends, deletes and health probes all fail transiently when a
//! storage node is briefly unreachable. The executor here retries an
//! async operation a bounded number of times and reports either the
//! value or the last error together with the attempt count. Callers
//! decide what an exhausted retry means; the executor never panics.

use rand::Rng;
use std::future::Future;
use std::time::Duration;

/// Configuration for retry behavior.
#[derive(Debug, Clone)]
pub struct RetryConfig {
    /// Maximum number of retries after the first attempt (default: 3).
    pub max_retries: u32,
    /// Initial backoff duration (default: 500ms).
    pub initial_backoff: Duration,
    /// Maximum backoff duration (default: 10 seconds).
    pub max_backoff: Duration,
    /// Multiplier for exponential backoff (default: 2.0).
    pub backoff_multiplier: f64,
    /// Whether to add random jitter of up to 50% to each backoff.
    pub jitter: bool,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_retries: 3,
            initial_backoff: Duration::from_millis(500),
            max_backoff: Duration::from_secs(10),
            backoff_multiplier: 2.0,
            jitter: true,
        }
    }
}

/// Outcome of a retried operation.
#[derive(Debug)]
pub enum RetryOutcome<T, E> {
    /// Operation succeeded.
    Success(T),
    /// All attempts failed.
    Exhausted {
        /// The error from the final attempt.
        last_error: E,
        /// Total number of attempts made.
        attempts: u32,
    },
}

impl<T, E> RetryOutcome<T, E> {
    /// Returns true if the operation eventually succeeded.
    pub fn is_success(&self) -> bool {
        matches!(self, RetryOutcome::Success(_))
    }
}

/// Executes async operations with bounded retries.
#[derive(Debug, Clone)]
pub struct RetryExecutor {
    config: RetryConfig,
}

impl RetryExecutor {
    /// Creates a new executor with the given configuration.
    pub fn new(config: RetryConfig) -> Self {
        Self { config }
    }

    /// Runs `operation`, retrying on any error with exponential backoff.
    ///
    /// Makes at most `1 + max_retries` attempts. Every error is treated
    /// as transient; permanent-failure classification belongs to the
    /// caller, which sees the last error on exhaustion.
    pub async fn execute<F, Fut, T, E>(&self, operation: F) -> RetryOutcome<T, E>
    where
        F: Fn() -> Fut,
        Fut: Future<Output = std::result::Result<T, E>>,
    {
        let mut attempt = 0u32;
        loop {
            attempt += 1;
            match operation().await {
                Ok(value) => return RetryOutcome::Success(value),
                Err(e) => {
                    if attempt > self.config.max_retries {
                        return RetryOutcome::Exhausted {
                            last_error: e,
                            attempts: attempt,
                        };
                    }
                    let backoff = self.compute_backoff(attempt - 1);
                    tracing::debug!(attempt, backoff_ms = backoff.as_millis() as u64, "retrying after backoff");
                    tokio::time::sleep(backoff).await;
                }
            }
        }
    }

    /// Backoff for the given zero-based attempt number.
    ///
    /// `initial_backoff * multiplier^attempt`, capped at `max_backoff`,
    /// plus 0-50% random jitter when enabled.
    fn compute_backoff(&self, attempt: u32) -> Duration {
        let base_ms = self.config.initial_backoff.as_millis() as f64;
        let max_ms = self.config.max_backoff.as_millis() as f64;
        let computed = base_ms * self.config.backoff_multiplier.powi(attempt as i32);
        let capped = computed.min(max_ms) as u64;

        if self.config.jitter && capped > 0 {
            let jitter = rand::thread_rng().gen_range(0..=capped / 2);
            Duration::from_millis(capped.saturating_add(jitter))
        } else {
            Duration::from_millis(capped)
        }
    }
}

impl Default for RetryExecutor {
    fn default() -> Self {
        Self::new(RetryConfig::default())
    }
}
