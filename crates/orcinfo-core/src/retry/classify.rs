//! Classify HTTP status and curl errors into retry fault kinds.

use super::error::RequestError;
use super::policy::FaultKind;

/// Classify an HTTP status code for retry decisions.
pub fn classify_http_status(code: u32) -> FaultKind {
    match code {
        408 => FaultKind::Timeout,
        429 | 503 => FaultKind::Throttled,
        500..=599 => FaultKind::Http5xx(code as u16),
        _ => FaultKind::Other,
    }
}

/// Classify a curl error for retry decisions.
pub fn classify_curl_error(e: &curl::Error) -> FaultKind {
    if e.is_operation_timedout() {
        return FaultKind::Timeout;
    }
    if e.is_couldnt_connect()
        || e.is_couldnt_resolve_host()
        || e.is_couldnt_resolve_proxy()
        || e.is_read_error()
        || e.is_recv_error()
        || e.is_send_error()
        || e.is_got_nothing()
        || e.is_partial_file()
    {
        return FaultKind::Connection;
    }
    FaultKind::Other
}

/// Classify a request error into a FaultKind.
pub fn classify(e: &RequestError) -> FaultKind {
    match e {
        RequestError::Curl(ce) => classify_curl_error(ce),
        RequestError::Http(code) => classify_http_status(*code),
        RequestError::ShortRead {
            expected,
            received,
            total,
        } => match total {
            // The object really is that short; asking again will not help.
            Some(t) if *t < *expected && received < expected => FaultKind::Other,
            _ => FaultKind::Connection,
        },
        RequestError::BadResponse(_) => FaultKind::Other,
    }
}
