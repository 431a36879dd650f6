use anyhow::Result;
use clap::Parser;
use jobhunt_pipeline::cli::{handle_command, Cli};
use std::process::ExitCode;

use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{fmt, EnvFilter};

#[tokio::main]
async fn main() -> Result<ExitCode> {
    let cli = Cli::parse();

    // stdout carries the JSON output, so logs go to stderr
    let default_directive = if cli.verbose {
        "jobhunt=debug,jobhunt_pipeline=debug"
    } else {
        "jobhunt=info,jobhunt_pipeline=info"
    };
    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr).with_target(false))
        .with(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(default_directive)),
        )
        .init();

    handle_command(cli).await
}
