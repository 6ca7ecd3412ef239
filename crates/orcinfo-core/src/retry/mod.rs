//! Retry and backoff policy for remote object requests.
//!
//! This module encapsulates fault classification (timeouts, throttling,
//! connection failures) and exponential backoff decisions so that every
//! accessor call shares one consistent policy.

mod classify;
mod error;
mod policy;
mod run;

pub use classify::{classify, classify_curl_error, classify_http_status};
pub use error::RequestError;
pub use policy::{FaultKind, RetryDecision, RetryPolicy};
pub use run::run_with_retry;
