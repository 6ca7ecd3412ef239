//! Error taxonomy shared by accessors, the trailer locator and the batch runner.
//!
//! Every per-target failure is a [`ProbeError`] carrying an [`ErrorKind`];
//! only [`ConfigError`] is fatal for a whole run.

use serde::Serialize;
use std::fmt;

/// What went wrong for one target.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    /// The object does not exist.
    NotFound,
    /// Credentials or permissions are insufficient.
    AccessDenied,
    /// Network fault or timeout; already retried by the accessor.
    TransientIo,
    /// The requested range ends past the object size.
    RangeUnsatisfiable,
    /// Structurally invalid trailer (bad lengths, magic, protobuf, codec).
    CorruptFormat,
    /// The input line is not a usable target.
    InvalidTarget,
    /// The run was stopped before this target was dispatched.
    Cancelled,
    /// Invalid configuration; raised before any probe starts.
    Configuration,
}

impl ErrorKind {
    /// Stable lowercase name used in reports.
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorKind::NotFound => "not_found",
            ErrorKind::AccessDenied => "access_denied",
            ErrorKind::TransientIo => "transient_io",
            ErrorKind::RangeUnsatisfiable => "range_unsatisfiable",
            ErrorKind::CorruptFormat => "corrupt_format",
            ErrorKind::InvalidTarget => "invalid_target",
            ErrorKind::Cancelled => "cancelled",
            ErrorKind::Configuration => "configuration",
        }
    }

    /// Whether the locator may try the next trailer tier after this error.
    ///
    /// A missing object or a permission failure will not change by reading
    /// the file another way, so those stop the chain.
    pub fn allows_fallback(&self) -> bool {
        matches!(
            self,
            ErrorKind::CorruptFormat | ErrorKind::TransientIo | ErrorKind::RangeUnsatisfiable
        )
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Per-target failure: a kind plus a human-readable cause.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{kind}: {message}")]
pub struct ProbeError {
    pub kind: ErrorKind,
    pub message: String,
}

impl ProbeError {
    pub fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::NotFound, message)
    }

    pub fn corrupt(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::CorruptFormat, message)
    }

    pub fn invalid_target(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::InvalidTarget, message)
    }

    pub fn range_unsatisfiable(offset: u64, length: u64, size: u64) -> Self {
        Self::new(
            ErrorKind::RangeUnsatisfiable,
            format!(
                "range {}..{} exceeds object size {}",
                offset,
                offset.saturating_add(length),
                size
            ),
        )
    }

    /// Map a local I/O error to the taxonomy.
    pub fn from_io(err: &std::io::Error, what: &str) -> Self {
        let kind = match err.kind() {
            std::io::ErrorKind::NotFound => ErrorKind::NotFound,
            std::io::ErrorKind::PermissionDenied => ErrorKind::AccessDenied,
            std::io::ErrorKind::UnexpectedEof => ErrorKind::RangeUnsatisfiable,
            _ => ErrorKind::TransientIo,
        };
        Self::new(kind, format!("{}: {}", what, err))
    }
}

/// Invalid run configuration. Aborts the run before dispatch.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ConfigError {
    #[error("concurrency must be a positive integer (got {0})")]
    Concurrency(usize),
    #[error("tail_read_size must be a positive number of bytes")]
    TailReadSize,
    #[error("{name} must be a positive, finite number of seconds (got {value})")]
    Duration { name: &'static str, value: String },
    #[error("invalid endpoint {endpoint:?}: {reason}")]
    Endpoint { endpoint: String, reason: String },
    #[error("invalid header {0:?}")]
    Header(String),
}

impl ConfigError {
    pub fn kind(&self) -> ErrorKind {
        ErrorKind::Configuration
    }
}
