//! Batch probing: many targets, bounded concurrency, results in input order.

mod cancel;
mod progress;
mod run;

use crate::config::ProbeConfig;
use crate::error::{ErrorKind, ProbeError};
use crate::trailer::TrailerInfo;

pub use cancel::CancelToken;
pub use progress::BatchProgress;
pub use run::{probe_one, run_batch};

/// Outcome for one input target.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProbeResult {
    /// The input string, unchanged.
    pub target: String,
    pub outcome: Result<TrailerInfo, ProbeError>,
}

impl ProbeResult {
    pub fn cancelled(target: &str) -> Self {
        Self {
            target: target.to_string(),
            outcome: Err(ProbeError::new(
                ErrorKind::Cancelled,
                "run stopped before this target was probed",
            )),
        }
    }

    pub fn is_ok(&self) -> bool {
        self.outcome.is_ok()
    }

    pub fn error_kind(&self) -> Option<ErrorKind> {
        self.outcome.as_ref().err().map(|e| e.kind)
    }
}

/// Options consumed by [`run_batch`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BatchOptions {
    pub concurrency: usize,
}

impl Default for BatchOptions {
    fn default() -> Self {
        Self { concurrency: 10 }
    }
}

impl BatchOptions {
    pub fn from_config(cfg: &ProbeConfig) -> Self {
        Self {
            concurrency: cfg.concurrency,
        }
    }
}

/// Counts by outcome, for the end-of-run log line.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BatchSummary {
    pub succeeded: usize,
    pub failed: usize,
    pub cancelled: usize,
}

impl BatchSummary {
    pub fn of(results: &[ProbeResult]) -> Self {
        let mut summary = Self::default();
        for result in results {
            match result.error_kind() {
                None => summary.succeeded += 1,
                Some(ErrorKind::Cancelled) => summary.cancelled += 1,
                Some(_) => summary.failed += 1,
            }
        }
        summary
    }

    pub fn total(&self) -> usize {
        self.succeeded + self.failed + self.cancelled
    }
}
