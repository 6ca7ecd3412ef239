//! Progress reporting for a batch (targets done out of total).

/// Snapshot sent after each completed probe.
#[derive(Debug, Clone, PartialEq)]
pub struct BatchProgress {
    /// Probes finished so far, including failures.
    pub completed: usize,
    pub total: usize,
    /// Target that just finished.
    pub target: String,
    /// Whether that probe succeeded.
    pub ok: bool,
    /// Seconds since the batch started.
    pub elapsed_secs: f64,
}

impl BatchProgress {
    /// Fraction complete in [0.0, 1.0].
    pub fn fraction(&self) -> f64 {
        if self.total == 0 {
            return 1.0;
        }
        (self.completed as f64 / self.total as f64).min(1.0)
    }

    /// Completed probes per second (0 if elapsed is 0).
    pub fn rate(&self) -> f64 {
        if self.elapsed_secs <= 0.0 {
            return 0.0;
        }
        self.completed as f64 / self.elapsed_secs
    }
}
