use std::time::Duration;

use crate::config::RetryConfig;

/// High-level classification of a request fault for retry purposes.
///
/// Callers map HTTP status codes, curl errors, or short reads into these kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FaultKind {
    /// Operation timed out (connect/read).
    Timeout,
    /// Server asked us to slow down (e.g. 429, 503).
    Throttled,
    /// Network-level failure (connection reset, DNS, truncated body, etc.).
    Connection,
    /// HTTP status that is retryable but not strictly throttling (5xx).
    Http5xx(u16),
    /// Any other fault (not retried).
    Other,
}

/// Decision returned by the retry policy.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RetryDecision {
    /// Do not retry this fault.
    NoRetry,
    /// Retry after the given delay.
    RetryAfter(Duration),
}

/// Exponential backoff policy with caps.
#[derive(Debug, Clone, Copy)]
pub struct RetryPolicy {
    /// Maximum number of attempts (including the first).
    pub max_attempts: u32,
    /// Base delay for backoff.
    pub base_delay: Duration,
    /// Upper bound on backoff delay.
    pub max_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::from_config(&RetryConfig::default())
    }
}

impl RetryPolicy {
    /// Build from the `[retry]` config section. `max_retries` counts retries,
    /// so the first attempt is added on top.
    pub fn from_config(cfg: &RetryConfig) -> Self {
        let max_delay = Duration::from_secs(cfg.max_delay_secs);
        let base = if cfg.base_delay_secs > 0.0 {
            Duration::try_from_secs_f64(cfg.base_delay_secs)
                .map_or(max_delay, |d| d.min(max_delay))
        } else {
            Duration::ZERO
        };
        Self {
            max_attempts: cfg.max_retries.saturating_add(1),
            base_delay: base,
            max_delay,
        }
    }

    /// A policy that never retries.
    pub fn none() -> Self {
        Self {
            max_attempts: 1,
            base_delay: Duration::ZERO,
            max_delay: Duration::ZERO,
        }
    }

    /// Compute the next backoff delay for a given attempt and fault kind.
    ///
    /// `attempt` is 1-based (1 = first attempt). Returns `RetryDecision::NoRetry`
    /// when we should stop retrying.
    pub fn decide(&self, attempt: u32, kind: FaultKind) -> RetryDecision {
        if attempt >= self.max_attempts {
            return RetryDecision::NoRetry;
        }

        match kind {
            FaultKind::Other => RetryDecision::NoRetry,
            FaultKind::Timeout
            | FaultKind::Connection
            | FaultKind::Throttled
            | FaultKind::Http5xx(_) => {
                // base * 2^(attempt-1), capped.
                let exp = 1u32 << attempt.saturating_sub(1).min(8);
                let raw = self.base_delay.saturating_mul(exp);
                RetryDecision::RetryAfter(raw.min(self.max_delay))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn no_retry_for_other() {
        let p = RetryPolicy::default();
        assert_eq!(p.decide(1, FaultKind::Other), RetryDecision::NoRetry);
    }

    #[test]
    fn exponential_backoff_grows_and_is_capped() {
        let mut p = RetryPolicy::default();
        p.max_attempts = 20;
        let d1 = match p.decide(1, FaultKind::Timeout) {
            RetryDecision::RetryAfter(d) => d,
            _ => panic!("expected retry"),
        };
        let d2 = match p.decide(2, FaultKind::Timeout) {
            RetryDecision::RetryAfter(d) => d,
            _ => panic!("expected retry"),
        };
        assert_eq!(d2, d1 * 2);

        let d_last = match p.decide(15, FaultKind::Timeout) {
            RetryDecision::RetryAfter(d) => d,
            _ => panic!("expected retry"),
        };
        assert!(d_last <= p.max_delay);
    }

    #[test]
    fn max_retries_counts_retries_not_attempts() {
        let cfg = RetryConfig {
            max_retries: 2,
            ..RetryConfig::default()
        };
        let p = RetryPolicy::from_config(&cfg);
        assert_eq!(p.max_attempts, 3);
        assert!(matches!(
            p.decide(1, FaultKind::Throttled),
            RetryDecision::RetryAfter(_)
        ));
        assert!(matches!(
            p.decide(2, FaultKind::Throttled),
            RetryDecision::RetryAfter(_)
        ));
        assert_eq!(p.decide(3, FaultKind::Throttled), RetryDecision::NoRetry);
    }

    #[test]
    fn zero_retries_never_retries() {
        let cfg = RetryConfig {
            max_retries: 0,
            ..RetryConfig::default()
        };
        let p = RetryPolicy::from_config(&cfg);
        assert_eq!(p.decide(1, FaultKind::Timeout), RetryDecision::NoRetry);
        assert_eq!(RetryPolicy::none().decide(1, FaultKind::Connection), RetryDecision::NoRetry);
    }
}
