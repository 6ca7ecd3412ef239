//! CLI for orcinfo.

mod commands;

use anyhow::Result;
use clap::{Args, Parser, Subcommand};
use orcinfo_core::config::{self, ProbeConfig};
use orcinfo_core::report::OutputFormat;
use std::path::{Path, PathBuf};

use commands::{run_collect, run_completions, run_inspect, run_man};

/// Top-level CLI for orcinfo.
#[derive(Debug, Parser)]
#[command(name = "orcinfo", version)]
#[command(about = "orcinfo: stripe counts and sizes of ORC files in object storage", long_about = None)]
pub struct Cli {
    /// Config file to use instead of ~/.config/orcinfo/config.toml.
    #[arg(long, global = true, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Debug logging for orcinfo itself.
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Append logs to this file instead of stderr.
    #[arg(long, global = true, value_name = "PATH")]
    pub log_file: Option<PathBuf>,

    #[command(subcommand)]
    pub command: CliCommand,
}

#[derive(Debug, Subcommand)]
pub enum CliCommand {
    /// Probe every file in a target list and write one report row per file.
    Collect(CollectArgs),

    /// Show the decoded tail of one file: stripes, schema and writer.
    Inspect {
        /// s3://bucket/key, file:///path or a local path.
        target: String,
    },

    /// Print shell completions to stdout.
    Completions {
        #[arg(value_enum)]
        shell: clap_complete::Shell,
    },

    /// Print the man page (roff) to stdout.
    Man,
}

#[derive(Debug, Args)]
pub struct CollectArgs {
    /// File with one target per line (`-` for stdin). Blank lines and `#` comments are skipped.
    pub input: PathBuf,

    /// Write the report here instead of stdout.
    #[arg(short, long, value_name = "PATH")]
    pub output: Option<PathBuf>,

    /// Files probed concurrently (default 10, or `concurrency` from the config).
    #[arg(short, long, value_name = "N")]
    pub workers: Option<usize>,

    /// Report format: table, csv or json (one object per line).
    #[arg(short, long, default_value_t = OutputFormat::Table)]
    pub format: OutputFormat,

    /// Bytes fetched from the end of each file on the first read.
    #[arg(long, value_name = "BYTES")]
    pub tail_read_size: Option<u64>,

    /// Retries for transient network faults (0 disables retrying).
    #[arg(long, value_name = "N")]
    pub max_retries: Option<u32>,

    /// Timeout for each size or range request, in seconds.
    #[arg(long, value_name = "SECS")]
    pub timeout_secs: Option<f64>,

    /// S3-compatible endpoint, addressed path-style (e.g. http://127.0.0.1:9000).
    #[arg(long, value_name = "URL")]
    pub endpoint: Option<String>,

    /// AWS region for virtual-hosted addressing.
    #[arg(long)]
    pub region: Option<String>,
}

impl Cli {
    pub async fn run(self) -> Result<()> {
        match self.command {
            CliCommand::Collect(args) => {
                let cfg = load_config(self.config.as_deref())?;
                run_collect(cfg, &args).await?;
            }
            CliCommand::Inspect { target } => {
                let cfg = load_config(self.config.as_deref())?;
                run_inspect(&cfg, &target).await?;
            }
            CliCommand::Completions { shell } => run_completions(shell)?,
            CliCommand::Man => run_man()?,
        }
        Ok(())
    }
}

fn load_config(path: Option<&Path>) -> Result<ProbeConfig> {
    let cfg = match path {
        Some(path) => config::load_from_path(path)?,
        None => config::load_or_init()?,
    };
    tracing::debug!("loaded config: {:?}", cfg);
    Ok(cfg)
}

#[cfg(test)]
mod tests;
