//! Retry envelope for the encryption oracle
//!
//! The oracle (relayer) sitting in front of the FHE coprocessor drops
//! requests under load and sometimes answers with a truncated JSON body.
//! Those failures are worth retrying; everything else is returned at once.
//!
//! Backoff is linear: the wait after attempt `n` is `base_delay * n`.

use std::future::Future;
use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Message fragments that mark a failure as transient
const TRANSIENT_MARKERS: &[&str] = &[
    "relayer didn't response",
    "bad json",
    "relayer",
    "network",
    "timeout",
];

/// Whether an oracle error message describes a transient condition
///
/// Case-insensitive.
pub fn is_transient_message(message: &str) -> bool {
    let lower = message.to_lowercase();
    TRANSIENT_MARKERS.iter().any(|m| lower.contains(m))
}

/// Whether an exhausted oracle failure is an outage worth normalizing
///
/// Narrower than [`is_transient_message`]: a message that merely mentions the
/// relayer must also speak of a response, unavailability or an error. Anything
/// else (a relayer rejecting the contract, a plain timeout) keeps its own text.
pub fn is_oracle_outage(message: &str) -> bool {
    let lower = message.to_lowercase();
    if lower.contains("relayer didn't response") || lower.contains("bad json") {
        return true;
    }
    lower.contains("relayer")
        && ["response", "unavailable", "error"]
            .iter()
            .any(|m| lower.contains(m))
}

/// Retry configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RetryPolicy {
    /// Total attempts including the first one
    pub max_attempts: u32,
    /// Delay unit; the wait after attempt `n` is `n * base_delay_ms`
    pub base_delay_ms: u64,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::oracle()
    }
}

impl RetryPolicy {
    /// Three attempts, 1s then 2s between them
    pub fn oracle() -> Self {
        Self {
            max_attempts: 3,
            base_delay_ms: 1000,
        }
    }

    /// Same shape as `oracle()` with millisecond delays
    pub fn fast() -> Self {
        Self {
            max_attempts: 3,
            base_delay_ms: 5,
        }
    }

    /// Single attempt
    pub fn none() -> Self {
        Self {
            max_attempts: 1,
            base_delay_ms: 0,
        }
    }

    pub fn with_max_attempts(mut self, max: u32) -> Self {
        self.max_attempts = max;
        self
    }

    pub fn with_base_delay(mut self, delay: Duration) -> Self {
        self.base_delay_ms = u64::try_from(delay.as_millis()).unwrap_or(u64::MAX);
        self
    }

    /// Delay to wait after a failed attempt (1-indexed)
    pub fn delay_after(&self, attempt: u32) -> Duration {
        Duration::from_millis(self.base_delay_ms.saturating_mul(attempt as u64))
    }
}

/// Result of a retried operation
#[derive(Debug)]
pub struct RetryResult<T, E> {
    /// The final result (success or last error)
    pub result: Result<T, E>,
    /// Number of attempts made (1 = succeeded on first try)
    pub attempts: u32,
    /// Delays actually waited, one per retry
    pub delays: Vec<Duration>,
}

impl<T, E> RetryResult<T, E> {
    pub fn is_success(&self) -> bool {
        self.result.is_ok()
    }

    pub fn into_result(self) -> Result<T, E> {
        self.result
    }
}

/// Retry executor
pub struct Retry {
    policy: RetryPolicy,
}

impl Retry {
    pub fn new(policy: RetryPolicy) -> Self {
        Self { policy }
    }

    pub fn policy(&self) -> &RetryPolicy {
        &self.policy
    }

    /// Run with the transient-message classifier
    pub async fn run<F, Fut, T, E>(&self, operation: F) -> RetryResult<T, E>
    where
        F: Fn() -> Fut,
        Fut: Future<Output = Result<T, E>>,
        E: std::fmt::Display,
    {
        self.run_with_predicate(operation, |e: &E| is_transient_message(&e.to_string()))
            .await
    }

    /// Run with an explicit classifier
    ///
    /// `should_retry` receives each error and returns true if it is
    /// transient.
    pub async fn run_with_predicate<F, Fut, T, E, P>(
        &self,
        operation: F,
        should_retry: P,
    ) -> RetryResult<T, E>
    where
        F: Fn() -> Fut,
        Fut: Future<Output = Result<T, E>>,
        P: Fn(&E) -> bool,
    {
        self.run_observed(operation, should_retry, |_| {}).await
    }

    /// Run with a classifier and a hook called before every attempt
    pub async fn run_observed<F, Fut, T, E, P, H>(
        &self,
        operation: F,
        should_retry: P,
        mut on_attempt: H,
    ) -> RetryResult<T, E>
    where
        F: Fn() -> Fut,
        Fut: Future<Output = Result<T, E>>,
        P: Fn(&E) -> bool,
        H: FnMut(u32),
    {
        let max_attempts = self.policy.max_attempts.max(1);
        let mut attempts = 0;
        let mut delays = Vec::new();

        loop {
            attempts += 1;
            on_attempt(attempts);

            match operation().await {
                Ok(value) => {
                    return RetryResult {
                        result: Ok(value),
                        attempts,
                        delays,
                    };
                }
                Err(e) => {
                    if attempts >= max_attempts || !should_retry(&e) {
                        return RetryResult {
                            result: Err(e),
                            attempts,
                            delays,
                        };
                    }

                    let delay = self.policy.delay_after(attempts);

                    tracing::warn!(
                        attempt = attempts,
                        max_attempts,
                        delay_ms = u64::try_from(delay.as_millis()).unwrap_or(u64::MAX),
                        "oracle call failed, retrying"
                    );

                    tokio::time::sleep(delay).await;
                    delays.push(delay);
                }
            }
        }
    }
}

/// Run `operation` under `policy` with the transient-message classifier
pub async fn run_with_retry<F, Fut, T, E>(operation: F, policy: &RetryPolicy) -> RetryResult<T, E>
where
    F: Fn() -> Fut,
    Fut: Future<Output = Result<T, E>>,
    E: std::fmt::Display,
{
    Retry::new(policy.clone()).run(operation).await
}
