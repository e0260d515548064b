//! mixtrain CLI
//!
//! ```bash
//! # Train from config
//! mixtrain train config.yaml
//!
//! # Train with overrides
//! mixtrain train config.yaml --epochs 10 --lr 0.001 --bf16
//!
//! # Validate config
//! mixtrain validate config.yaml
//!
//! # Show model and memory summary
//! mixtrain info config.yaml
//! ```

use clap::Parser;
use mixtrain::cli::{run_command, Cli, LogLevel};
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;

fn main() -> ExitCode {
    let cli = Cli::parse();

    let level = LogLevel::from_flags(cli.verbose, cli.quiet);
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(level.filter_directive()));
    tracing_subscriber::fmt().with_env_filter(filter).with_writer(std::io::stderr).init();

    match run_command(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {e}");
            ExitCode::FAILURE
        }
    }
}
