//! Binary crate for the `wxpipe` command-line tool.
//!
//! This crate focuses on:
//! - Parsing and validating CLI arguments
//! - Interactive credential configuration
//! - Writing reports as text, JSON or CSV, or handing them to a publisher

use clap::Parser;

mod cli;
mod output;
mod publish;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cmd = cli::Cli::parse();
    init_tracing(cmd.verbose());
    cmd.run().await
}

fn init_tracing(verbose: bool) {
    let default_filter = if verbose {
        "wxpipe=debug,wxpipe_core=debug"
    } else {
        "wxpipe=info,wxpipe_core=info"
    };

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| default_filter.into()),
        )
        .with_writer(std::io::stderr)
        .init();
}
