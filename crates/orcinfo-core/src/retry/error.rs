//! Request error type for retry classification.

use std::fmt;

use crate::error::{ErrorKind, ProbeError};

use super::classify;

/// Error returned by a single HTTP request (curl failure, HTTP status, or short body).
/// Kept typed so we can classify and decide retries before mapping to a [`ProbeError`].
#[derive(Debug)]
pub enum RequestError {
    /// Curl reported an error (timeout, connection, etc.).
    Curl(curl::Error),
    /// HTTP response had a non-2xx status.
    Http(u32),
    /// Body was shorter than the requested range. `total` is the object size
    /// from `Content-Range` when the server sent one.
    ShortRead {
        expected: u64,
        received: u64,
        total: Option<u64>,
    },
    /// Response headers were unusable (e.g. HEAD without `Content-Length`).
    BadResponse(String),
}

impl fmt::Display for RequestError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RequestError::Curl(e) => write!(f, "{}", e),
            RequestError::Http(code) => write!(f, "HTTP {}", code),
            RequestError::ShortRead {
                expected, received, ..
            } => write!(f, "short read: expected {} bytes, got {}", expected, received),
            RequestError::BadResponse(msg) => write!(f, "bad response: {}", msg),
        }
    }
}

impl std::error::Error for RequestError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            RequestError::Curl(e) => Some(e),
            _ => None,
        }
    }
}

impl RequestError {
    /// Map a terminal (post-retry) request error into the probe taxonomy.
    pub fn into_probe_error(self, what: &str) -> ProbeError {
        let kind = match &self {
            RequestError::Http(404) | RequestError::Http(410) => ErrorKind::NotFound,
            RequestError::Http(401) | RequestError::Http(403) => ErrorKind::AccessDenied,
            RequestError::Http(416) => ErrorKind::RangeUnsatisfiable,
            RequestError::ShortRead {
                expected,
                received,
                total: Some(total),
            } if received < expected && *total < *expected => ErrorKind::RangeUnsatisfiable,
            _ => ErrorKind::TransientIo,
        };
        let fault = classify(&self);
        tracing::debug!(?fault, %self, "request failed");
        ProbeError::new(kind, format!("{}: {}", what, self))
    }
}
