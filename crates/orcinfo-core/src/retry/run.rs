//! Retry loop: run a closure until success or policy says stop.

use super::classify;
use super::error::RequestError;
use super::policy::{RetryDecision, RetryPolicy};

/// Runs a closure until it succeeds or the retry policy says to stop.
/// On retryable failure, sleeps for the backoff duration then tries again.
pub fn run_with_retry<T, F>(policy: &RetryPolicy, mut f: F) -> Result<T, RequestError>
where
    F: FnMut() -> Result<T, RequestError>,
{
    let mut attempt = 1u32;
    loop {
        match f() {
            Ok(v) => return Ok(v),
            Err(e) => {
                let kind = classify::classify(&e);
                match policy.decide(attempt, kind) {
                    RetryDecision::NoRetry => return Err(e),
                    RetryDecision::RetryAfter(d) => {
                        tracing::warn!(attempt, ?kind, delay_ms = d.as_millis() as u64, "retrying: {}", e);
                        std::thread::sleep(d);
                        attempt += 1;
                    }
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    fn fast_policy(max_attempts: u32) -> RetryPolicy {
        RetryPolicy {
            max_attempts,
            base_delay: Duration::from_millis(1),
            max_delay: Duration::from_millis(2),
        }
    }

    #[test]
    fn retries_transient_until_success() {
        let mut calls = 0;
        let out = run_with_retry(&fast_policy(4), || {
            calls += 1;
            if calls < 3 {
                Err(RequestError::Http(503))
            } else {
                Ok(calls)
            }
        });
        assert_eq!(out.unwrap(), 3);
    }

    #[test]
    fn gives_up_after_max_attempts() {
        let mut calls = 0;
        let out: Result<(), _> = run_with_retry(&fast_policy(3), || {
            calls += 1;
            Err(RequestError::Http(500))
        });
        assert!(matches!(out, Err(RequestError::Http(500))));
        assert_eq!(calls, 3);
    }

    #[test]
    fn permanent_errors_are_not_retried() {
        let mut calls = 0;
        let out: Result<(), _> = run_with_retry(&fast_policy(5), || {
            calls += 1;
            Err(RequestError::Http(404))
        });
        assert!(out.is_err());
        assert_eq!(calls, 1);
    }
}
