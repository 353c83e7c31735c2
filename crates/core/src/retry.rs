//! Retrying fallible async operations.
//!
//! [`with_retry`] wraps an async function `A -> Result<T, E>` and returns a
//! [`Retrying`] whose [`call`](Retrying::call) has the same shape. Failed
//! calls are retried with exponential backoff capped at
//! [`RetryConfig::max_delay`]. When attempts run out, or the `on_retry`
//! callback declines, the last error is returned unchanged.

use std::fmt;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

/// Attempt budget of a retrying call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Attempts {
    /// At most this many invocations in total. Zero behaves like one.
    Finite(u32),
    /// Keep retrying until success, cancellation or `on_retry` returns `false`.
    Infinite,
}

impl Attempts {
    /// Whether the budget is used up once `attempt` invocations have run.
    pub fn exhausted_after(&self, attempt: u32) -> bool {
        match self {
            Attempts::Finite(max) => attempt >= *max,
            Attempts::Infinite => false,
        }
    }
}

impl fmt::Display for Attempts {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Attempts::Finite(n) => write!(f, "{}", n),
            Attempts::Infinite => write!(f, "∞"),
        }
    }
}

/// Retry configuration.
#[derive(Debug, Clone)]
pub struct RetryConfig {
    /// When disabled, the first failure is returned immediately.
    pub enabled: bool,

    /// Total invocation budget.
    pub num_attempts: Attempts,

    /// Delay before the first retry. Doubles for every further retry.
    pub initial_delay: Duration,

    /// Upper bound for a single backoff delay.
    pub max_delay: Duration,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            num_attempts: Attempts::Finite(3),
            initial_delay: Duration::from_millis(200),
            max_delay: Duration::from_secs(10),
        }
    }
}

impl RetryConfig {
    /// A configuration that never retries.
    pub fn disabled() -> Self {
        Self {
            enabled: false,
            ..Default::default()
        }
    }

    /// Set the total invocation budget.
    pub fn with_num_attempts(mut self, attempts: u32) -> Self {
        self.num_attempts = Attempts::Finite(attempts);
        self
    }

    /// Retry without an attempt limit.
    pub fn with_infinite_attempts(mut self) -> Self {
        self.num_attempts = Attempts::Infinite;
        self
    }

    /// Set the delay before the first retry.
    pub fn with_initial_delay(mut self, delay: Duration) -> Self {
        self.initial_delay = delay;
        self
    }

    /// Set the backoff cap.
    pub fn with_max_delay(mut self, delay: Duration) -> Self {
        self.max_delay = delay;
        self
    }

    /// Backoff before retrying after failed attempt number `attempt` (1-based).
    pub fn delay_for(&self, attempt: u32) -> Duration {
        let factor = 1u32
            .checked_shl(attempt.saturating_sub(1))
            .unwrap_or(u32::MAX);
        self.initial_delay
            .saturating_mul(factor)
            .min(self.max_delay)
    }
}

/// Information handed to the `on_retry` callback after a failed attempt.
#[derive(Debug)]
pub struct RetryAttempt<'a, A, E> {
    /// Number of the attempt that just failed (1-based).
    pub attempt: u32,
    /// Total invocation budget.
    pub max_attempts: Attempts,
    /// The error of the failed attempt.
    pub error: &'a E,
    /// Arguments the operation was invoked with.
    pub args: &'a A,
}

/// Callback run before each retry. Returning `false` stops retrying.
pub type OnRetry<A, E> = Arc<dyn Fn(RetryAttempt<'_, A, E>) -> bool + Send + Sync>;

/// A retrying wrapper around an async operation.
pub struct Retrying<F, A, E> {
    op: F,
    config: RetryConfig,
    on_retry: Option<OnRetry<A, E>>,
    cancellation: Option<CancellationToken>,
}

/// Wrap `op` so that failed calls are retried according to `config`.
///
/// State the operation needs (an SDK handle, a client, `self` of a method)
/// is captured by the closure and therefore shared by every attempt.
pub fn with_retry<F, Fut, A, T, E>(op: F, config: RetryConfig) -> Retrying<F, A, E>
where
    F: Fn(A) -> Fut,
    Fut: Future<Output = Result<T, E>>,
{
    Retrying {
        op,
        config,
        on_retry: None,
        cancellation: None,
    }
}

impl<F, A, E> Retrying<F, A, E> {
    /// Inspect each failure before retrying; returning `false` stops.
    pub fn on_retry(
        mut self,
        callback: impl Fn(RetryAttempt<'_, A, E>) -> bool + Send + Sync + 'static,
    ) -> Self {
        self.on_retry = Some(Arc::new(callback));
        self
    }

    /// Stop retrying once `token` is cancelled.
    ///
    /// A running attempt is never interrupted; cancellation takes effect while
    /// waiting for the next one.
    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.cancellation = Some(token);
        self
    }

    pub fn config(&self) -> &RetryConfig {
        &self.config
    }
}

impl<F, Fut, A, T, E> Retrying<F, A, E>
where
    F: Fn(A) -> Fut,
    Fut: Future<Output = Result<T, E>>,
    A: Clone,
    E: fmt::Debug,
{
    /// Invoke the operation, retrying failures.
    pub async fn call(&self, args: A) -> Result<T, E> {
        let mut attempt = 0u32;
        loop {
            attempt += 1;
            let error = match (self.op)(args.clone()).await {
                Ok(value) => return Ok(value),
                Err(error) => error,
            };

            if !self.config.enabled || self.config.num_attempts.exhausted_after(attempt) {
                if self.config.enabled {
                    warn!(attempt, ?error, "Giving up after final attempt");
                }
                return Err(error);
            }

            if let Some(on_retry) = &self.on_retry {
                let proceed = on_retry(RetryAttempt {
                    attempt,
                    max_attempts: self.config.num_attempts,
                    error: &error,
                    args: &args,
                });
                if !proceed {
                    debug!(attempt, ?error, "Retry declined by callback");
                    return Err(error);
                }
            }

            let delay = self.config.delay_for(attempt);
            debug!(
                attempt,
                max_attempts = %self.config.num_attempts,
                ?delay,
                ?error,
                "Attempt failed, retrying"
            );

            match &self.cancellation {
                Some(token) => {
                    tokio::select! {
                        _ = token.cancelled() => {
                            debug!(attempt, "Retry cancelled");
                            return Err(error);
                        }
                        _ = tokio::time::sleep(delay) => {}
                    }
                }
                None => tokio::time::sleep(delay).await,
            }
        }
    }
}

/// Run a zero-argument async operation with retries.
pub async fn retry<F, Fut, T, E>(config: RetryConfig, op: F) -> Result<T, E>
where
    F: Fn() -> Fut,
    Fut: Future<Output = Result<T, E>>,
    E: fmt::Debug,
{
    with_retry(move |()| op(), config).call(()).await
}
