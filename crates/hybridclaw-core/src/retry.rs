//! Exponential-backoff retry executor for transient failures.
//!
//! Shared by the sandbox turn runner's model-call retry (spec §4.4.1) and the
//! delegation manager's task retry (spec §4.7): both retry a fallible async
//! operation up to a bounded number of attempts, doubling the delay each
//! time up to a cap.

use std::future::Future;
use std::time::Duration;

/// Retry policy: starting delay, cap, and attempt budget.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryConfig {
    /// Delay before the first retry.
    pub base_delay: Duration,
    /// Delay is doubled after each attempt, never exceeding this.
    pub max_delay: Duration,
    /// Total attempts allowed, including the first.
    pub max_attempts: u32,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            base_delay: Duration::from_secs(2),
            max_delay: Duration::from_secs(8),
            max_attempts: 3,
        }
    }
}

/// What happened to a retried operation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RetryOutcome<T, E> {
    /// The operation succeeded, possibly after retries.
    Succeeded {
        /// The successful value.
        value: T,
        /// Attempt number (1-based) on which it succeeded.
        attempt: u32,
    },
    /// The operation never succeeded within the attempt budget.
    Exhausted {
        /// The error from the final attempt.
        last_error: E,
        /// Total attempts made.
        attempts: u32,
    },
}

/// Run `op` up to `config.max_attempts` times, classifying each failure with
/// `is_retryable` and sleeping with doubling backoff between attempts.
///
/// `on_retry` is invoked before each sleep, receiving the attempt number that
/// just failed and the delay about to be slept — callers use this to emit a
/// `model_retry`-style event.
pub async fn retry_with_backoff<T, E, Fut, Op, Retryable, OnRetry>(
    config: RetryConfig,
    mut op: Op,
    is_retryable: Retryable,
    mut on_retry: OnRetry,
) -> RetryOutcome<T, E>
where
    Op: FnMut(u32) -> Fut,
    Fut: Future<Output = Result<T, E>>,
    Retryable: Fn(&E) -> bool,
    OnRetry: FnMut(u32, Duration),
{
    let mut delay = config.base_delay;
    let mut attempt = 1;

    loop {
        match op(attempt).await {
            Ok(value) => return RetryOutcome::Succeeded { value, attempt },
            Err(err) => {
                let attempts_remaining = attempt < config.max_attempts;
                if attempts_remaining && is_retryable(&err) {
                    on_retry(attempt, delay);
                    tokio::time::sleep(delay).await;
                    delay = (delay * 2).min(config.max_delay);
                    attempt += 1;
                    continue;
                }
                return RetryOutcome::Exhausted {
                    last_error: err,
                    attempts: attempt,
                };
            }
        }
    }
}

/// Classify transport failures per spec §4.4.1: HTTP 429/5xx or a matching
/// network-error phrase is retryable.
#[must_use]
pub fn is_retryable_transport_error(status: Option<u16>, message: &str) -> bool {
    if let Some(code) = status {
        if code == 429 || (500..=504).contains(&code) {
            return true;
        }
    }
    let lower = message.to_ascii_lowercase();
    [
        "fetch failed",
        "network",
        "socket",
        "timeout",
        "timed out",
        "econnreset",
        "econnrefused",
        "eai_again",
    ]
    .iter()
    .any(|needle| lower.contains(needle))
}

/// Classify delegation-task failures per spec §4.7.
#[must_use]
pub fn classify_delegation_error(message: &str) -> DelegationErrorClass {
    let lower = message.to_ascii_lowercase();
    let permanent = [
        "forbidden",
        "permission denied",
        "unauthorized",
        "not found",
        "invalid api key",
        "blocked by security hook",
    ];
    if permanent.iter().any(|needle| lower.contains(needle)) {
        return DelegationErrorClass::Permanent;
    }
    let transient = [
        "econnreset",
        "etimedout",
        "429",
        "network",
        "socket",
        "fetch failed",
        "temporar",
        "rate limit",
        "unavailable",
    ];
    if transient.iter().any(|needle| lower.contains(needle)) || contains_5xx_code(&lower) {
        return DelegationErrorClass::Transient;
    }
    DelegationErrorClass::Unknown
}

/// True if `text` contains a 3-digit HTTP status code starting with `5`
/// (e.g. `500`, `503`), matching spec's `5\d\d` pattern.
fn contains_5xx_code(text: &str) -> bool {
    let bytes = text.as_bytes();
    bytes.windows(3).any(|w| {
        w[0] == b'5' && w[1].is_ascii_digit() && w[2].is_ascii_digit()
    })
}

/// Result of classifying a delegation task failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DelegationErrorClass {
    /// Never retry; surface directly.
    Permanent,
    /// Retry with backoff while attempts remain.
    Transient,
    /// Unclassified; treated the same as transient per spec §4.7.
    Unknown,
}
