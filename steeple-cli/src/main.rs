//! Steeple CLI - Command-line interface
//!
//! Serves the church search API or runs one-off searches against the
//! configured backend.

mod commands;

use std::path::PathBuf;

use clap::Parser;
use steeple_core::tracing_setup::{CliLogLevel, init_tracing};

#[derive(Parser)]
#[command(name = "steeple")]
#[command(about = "Geospatial church directory search")]
struct Cli {
    /// Console log level (RUST_LOG overrides)
    #[arg(long, global = true, value_enum, default_value_t = CliLogLevel::Info)]
    log_level: CliLogLevel,

    /// Directory for the full debug log
    #[arg(long, global = true)]
    logs_dir: Option<PathBuf>,

    #[command(subcommand)]
    command: commands::Commands,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    init_tracing(cli.log_level.as_tracing_level(), cli.logs_dir.as_deref())
        .map_err(|e| anyhow::anyhow!("failed to initialize tracing: {e}"))?;

    commands::handle_command(cli.command).await
}
