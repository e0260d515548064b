//! Command handlers for the `mixtrain` binary

mod commands;
mod logging;

pub use commands::run_command;
pub use logging::LogLevel;

pub use crate::config::Cli;
