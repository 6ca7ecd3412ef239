use clap::Parser;
use orcinfo_core::logging;

mod cli;

use crate::cli::Cli;

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    // Initialize logging as early as possible; a bad --log-file falls back to stderr.
    if let Err(err) = logging::init_logging(cli.verbose, cli.log_file.as_deref()) {
        logging::init_logging_stderr(cli.verbose);
        tracing::warn!("{:#}", err);
    }

    if let Err(err) = cli.run().await {
        eprintln!("orcinfo error: {:#}", err);
        std::process::exit(1);
    }
}
