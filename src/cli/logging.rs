//! Output levels for CLI messages and the tracing filter

/// How chatty the CLI is
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogLevel {
    /// Errors only
    Quiet,
    /// Progress and results
    #[default]
    Normal,
    /// Adds effective settings and per-epoch detail
    Verbose,
}

impl LogLevel {
    /// Level from the global flags; `quiet` wins
    pub fn from_flags(verbose: bool, quiet: bool) -> Self {
        if quiet {
            LogLevel::Quiet
        } else if verbose {
            LogLevel::Verbose
        } else {
            LogLevel::Normal
        }
    }

    /// Default `tracing` filter directive when `RUST_LOG` is unset
    pub fn filter_directive(self) -> &'static str {
        match self {
            LogLevel::Quiet => "error",
            LogLevel::Normal => "mixtrain=info",
            LogLevel::Verbose => "mixtrain=debug",
        }
    }
}

/// Print `msg` if `level` permits messages that need `required`
pub fn log(level: LogLevel, required: LogLevel, msg: &str) {
    if level != LogLevel::Quiet && (level == required || required == LogLevel::Normal) {
        println!("{msg}");
    }
}
