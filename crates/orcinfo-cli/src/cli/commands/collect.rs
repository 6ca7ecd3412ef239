//! `orcinfo collect` – probe a list of files and write the report.

use anyhow::{bail, Context, Result};
use orcinfo_core::accessor::RouterAccessor;
use orcinfo_core::config::{ProbeConfig, RetryConfig};
use orcinfo_core::probe::{run_batch, BatchOptions, BatchProgress, BatchSummary, CancelToken};
use orcinfo_core::report::{self, OutputFormat, ProbeRecord};
use orcinfo_core::trailer::Locator;
use std::fs::File;
use std::io::{self, BufWriter, IsTerminal, Read, Write};
use std::path::Path;
use std::time::Instant;

use crate::cli::CollectArgs;

const PROGRESS_INTERVAL_MS: u128 = 500;

/// Command-line flags override values from the config file.
pub(crate) fn apply_overrides(cfg: &mut ProbeConfig, args: &CollectArgs) {
    if let Some(workers) = args.workers {
        cfg.concurrency = workers;
    }
    if let Some(size) = args.tail_read_size {
        cfg.tail_read_size = size;
    }
    if let Some(secs) = args.timeout_secs {
        cfg.per_call_timeout_secs = secs;
    }
    if let Some(retries) = args.max_retries {
        cfg.retry.get_or_insert_with(RetryConfig::default).max_retries = retries;
    }
    if let Some(endpoint) = &args.endpoint {
        cfg.endpoint = Some(endpoint.clone());
    }
    if let Some(region) = &args.region {
        cfg.region = Some(region.clone());
    }
}

fn read_targets(input: &Path) -> Result<Vec<String>> {
    if input == Path::new("-") {
        let mut text = String::new();
        io::stdin()
            .read_to_string(&mut text)
            .context("read target list from stdin")?;
        return Ok(report::parse_target_list(&text));
    }
    report::read_target_list(input)
}

fn write_report(format: OutputFormat, records: &[ProbeRecord], output: Option<&Path>) -> Result<()> {
    match output {
        Some(path) => {
            let file =
                File::create(path).with_context(|| format!("create report {}", path.display()))?;
            let mut out = BufWriter::new(file);
            report::render(format, records, &mut out)?;
            out.flush()?;
            tracing::info!("report written to {}", path.display());
        }
        None => {
            let mut out = io::stdout().lock();
            report::render(format, records, &mut out)?;
            out.flush()?;
        }
    }
    Ok(())
}

pub async fn run_collect(mut cfg: ProbeConfig, args: &CollectArgs) -> Result<()> {
    apply_overrides(&mut cfg, args);
    cfg.validate()?;

    let targets = read_targets(&args.input)?;
    tracing::info!(
        "probing {} target(s) with {} worker(s)",
        targets.len(),
        cfg.concurrency
    );

    let accessor = RouterAccessor::from_config(&cfg)?;
    let locator = Locator::from_config(&cfg);
    let options = BatchOptions::from_config(&cfg);
    let cancel = CancelToken::new();

    let interrupt = {
        let cancel = cancel.clone();
        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                tracing::warn!("interrupted; finishing in-flight probes");
                cancel.cancel();
            }
        })
    };

    let (progress_tx, mut progress_rx) = tokio::sync::mpsc::channel::<BatchProgress>(64);
    let interactive = io::stderr().is_terminal();
    let progress_handle = tokio::spawn(async move {
        let mut last_print = Instant::now();
        let mut printed = false;
        while let Some(p) = progress_rx.recv().await {
            if !interactive {
                continue;
            }
            let now = Instant::now();
            if now.duration_since(last_print).as_millis() >= PROGRESS_INTERVAL_MS
                || p.completed == p.total
            {
                eprint!(
                    "\r  {}/{} files ({:.1}%)  {:.1} files/s  ",
                    p.completed,
                    p.total,
                    p.fraction() * 100.0,
                    p.rate()
                );
                last_print = now;
                printed = true;
            }
        }
        if printed {
            eprintln!();
        }
    });

    let results = tokio::task::spawn_blocking(move || {
        run_batch(
            &accessor,
            &locator,
            &targets,
            &options,
            &cancel,
            Some(&progress_tx),
        )
    })
    .await
    .context("probe batch panicked")??;
    interrupt.abort();
    let _ = progress_handle.await;

    write_report(args.format, &report::records(&results), args.output.as_deref())?;

    let summary = BatchSummary::of(&results);
    if summary.cancelled > 0 {
        bail!(
            "interrupted: {} of {} target(s) not probed",
            summary.cancelled,
            summary.total()
        );
    }
    Ok(())
}
