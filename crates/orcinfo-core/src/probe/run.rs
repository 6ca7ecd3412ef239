//! Bounded worker pool over a shared accessor.

use std::any::Any;
use std::collections::VecDeque;
use std::panic::{self, AssertUnwindSafe};
use std::sync::mpsc;
use std::sync::{Mutex, PoisonError};
use std::thread;
use std::time::Instant;

use super::{BatchOptions, BatchProgress, BatchSummary, CancelToken, ProbeResult};
use crate::accessor::ObjectAccessor;
use crate::error::{ConfigError, ProbeError};
use crate::target::ObjectLocation;
use crate::trailer::Locator;

/// Probe a single target. Never panics: a panic inside decoding becomes a
/// `CorruptFormat` failure.
pub fn probe_one(accessor: &dyn ObjectAccessor, locator: &Locator, target: &str) -> ProbeResult {
    let outcome = ObjectLocation::parse(target).and_then(|location| {
        panic::catch_unwind(AssertUnwindSafe(|| locator.locate(accessor, &location)))
            .unwrap_or_else(|payload| {
                Err(ProbeError::corrupt(format!(
                    "trailer decoding panicked: {}",
                    panic_message(payload.as_ref())
                )))
            })
    });
    ProbeResult {
        target: target.to_string(),
        outcome,
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        s.to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_string()
    }
}

/// Probe every target with at most `options.concurrency` in flight.
///
/// Returns one result per target, in input order. Individual failures never
/// abort the batch; only an invalid `concurrency` is an error, raised before
/// anything is dispatched. After `cancel` is set no new target starts and
/// the rest are reported as `Cancelled`.
pub fn run_batch(
    accessor: &dyn ObjectAccessor,
    locator: &Locator,
    targets: &[String],
    options: &BatchOptions,
    cancel: &CancelToken,
    progress_tx: Option<&tokio::sync::mpsc::Sender<BatchProgress>>,
) -> Result<Vec<ProbeResult>, ConfigError> {
    if options.concurrency == 0 {
        return Err(ConfigError::Concurrency(options.concurrency));
    }
    let total = targets.len();
    let mut slots: Vec<Option<ProbeResult>> = (0..total).map(|_| None).collect();
    let work: Mutex<VecDeque<usize>> = Mutex::new((0..total).collect());
    let num_workers = options.concurrency.min(total);
    let started = Instant::now();
    tracing::debug!(total, workers = num_workers, "starting batch");

    thread::scope(|scope| {
        let (tx, rx) = mpsc::channel::<(usize, ProbeResult)>();
        for _ in 0..num_workers {
            let tx = tx.clone();
            let work = &work;
            scope.spawn(move || loop {
                // Checked under the queue lock so a cancel is never raced by a dequeue.
                let index = {
                    let mut queue = work.lock().unwrap_or_else(PoisonError::into_inner);
                    if cancel.is_cancelled() {
                        break;
                    }
                    match queue.pop_front() {
                        Some(index) => index,
                        None => break,
                    }
                };
                let result = probe_one(accessor, locator, &targets[index]);
                if tx.send((index, result)).is_err() {
                    break;
                }
            });
        }
        drop(tx);

        let mut completed = 0usize;
        for (index, result) in rx {
            completed += 1;
            match &result.outcome {
                Ok(_) => tracing::info!("processed {}/{}: {}", completed, total, result.target),
                Err(e) => tracing::warn!(
                    kind = %e.kind,
                    "processed {}/{}: {} failed: {}",
                    completed,
                    total,
                    result.target,
                    e.message
                ),
            }
            if let Some(progress_tx) = progress_tx {
                let _ = progress_tx.try_send(BatchProgress {
                    completed,
                    total,
                    target: result.target.clone(),
                    ok: result.is_ok(),
                    elapsed_secs: started.elapsed().as_secs_f64(),
                });
            }
            slots[index] = Some(result);
        }
    });

    let results: Vec<ProbeResult> = slots
        .into_iter()
        .zip(targets)
        .map(|(slot, target)| slot.unwrap_or_else(|| ProbeResult::cancelled(target)))
        .collect();

    let summary = BatchSummary::of(&results);
    tracing::info!(
        succeeded = summary.succeeded,
        failed = summary.failed,
        cancelled = summary.cancelled,
        elapsed_secs = started.elapsed().as_secs_f64(),
        "batch finished"
    );
    Ok(results)
}
