//! Command-line arguments
//!
//! ```bash
//! mixtrain train config.yaml
//! mixtrain train config.yaml --epochs 20 --bf16
//! mixtrain validate config.yaml
//! mixtrain info config.yaml --format json
//! ```

use clap::{ArgGroup, Parser, Subcommand};
use std::path::PathBuf;

use super::loader::TrainOverrides;
use crate::autograd::Precision;

/// mixtrain: mixed-precision training with dynamic loss scaling
#[derive(Parser, Debug, Clone, PartialEq)]
#[command(name = "mixtrain")]
#[command(version)]
#[command(about = "Mixed-precision training with loss scaling and fp32 master weights")]
pub struct Cli {
    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Command,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Suppress all output except errors
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    pub quiet: bool,
}

/// Available commands
#[derive(Subcommand, Debug, Clone, PartialEq)]
pub enum Command {
    /// Train a model from YAML configuration
    Train(TrainArgs),

    /// Validate a configuration file without training
    Validate(ValidateArgs),

    /// Show the model summary and memory estimate
    Info(InfoArgs),
}

/// Arguments for the train command
#[derive(Parser, Debug, Clone, PartialEq)]
#[command(group(ArgGroup::new("precision").args(["fp16", "bf16", "fp32"])))]
pub struct TrainArgs {
    /// Path to YAML configuration file
    #[arg(value_name = "CONFIG")]
    pub config: PathBuf,

    /// Override number of epochs
    #[arg(short, long)]
    pub epochs: Option<usize>,

    /// Override learning rate
    #[arg(short, long)]
    pub lr: Option<f32>,

    /// Train with fp16 compute and dynamic loss scaling
    #[arg(long)]
    pub fp16: bool,

    /// Train with bf16 compute
    #[arg(long)]
    pub bf16: bool,

    /// Train in full precision
    #[arg(long)]
    pub fp32: bool,

    /// Validate config and print settings without training
    #[arg(long)]
    pub dry_run: bool,

    /// Print the training result as JSON
    #[arg(long)]
    pub json: bool,
}

impl TrainArgs {
    /// Precision flag, if one was given
    pub fn precision(&self) -> Option<Precision> {
        if self.fp16 {
            Some(Precision::Fp16)
        } else if self.bf16 {
            Some(Precision::Bf16)
        } else if self.fp32 {
            Some(Precision::Fp32)
        } else {
            None
        }
    }

    /// Overrides to apply on top of the loaded config
    pub fn overrides(&self) -> TrainOverrides {
        TrainOverrides { epochs: self.epochs, lr: self.lr, precision: self.precision() }
    }
}

/// Arguments for the validate command
#[derive(Parser, Debug, Clone, PartialEq)]
pub struct ValidateArgs {
    /// Path to YAML configuration file
    #[arg(value_name = "CONFIG")]
    pub config: PathBuf,
}

/// Arguments for the info command
#[derive(Parser, Debug, Clone, PartialEq)]
pub struct InfoArgs {
    /// Path to YAML configuration file
    #[arg(value_name = "CONFIG")]
    pub config: PathBuf,

    /// Output format (text, json)
    #[arg(short, long, default_value = "text")]
    pub format: OutputFormat,
}

/// Output format for the info command
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub enum OutputFormat {
    #[default]
    Text,
    Json,
}

impl std::str::FromStr for OutputFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "text" => Ok(OutputFormat::Text),
            "json" => Ok(OutputFormat::Json),
            _ => Err(format!("Unknown format: {s}. Valid formats: text, json")),
        }
    }
}

/// Parse arguments from an iterator, mainly for tests
pub fn parse_args<I, T>(args: I) -> Result<Cli, clap::Error>
where
    I: IntoIterator<Item = T>,
    T: Into<std::ffi::OsString> + Clone,
{
    Cli::try_parse_from(args)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn train_args(args: &[&str]) -> TrainArgs {
        let mut argv = vec!["mixtrain", "train", "config.yaml"];
        argv.extend_from_slice(args);
        match parse_args(argv).unwrap().command {
            Command::Train(args) => args,
            other => panic!("Expected Train command, got {other:?}"),
        }
    }

    #[test]
    fn test_parse_train_command() {
        let args = train_args(&[]);
        assert_eq!(args.config, PathBuf::from("config.yaml"));
        assert!(!args.dry_run);
        assert!(!args.json);
        assert_eq!(args.overrides(), TrainOverrides::default());
    }

    #[test]
    fn test_parse_train_with_overrides() {
        let args = train_args(&["--epochs", "12", "--lr", "0.001", "--bf16"]);
        let overrides = args.overrides();
        assert_eq!(overrides.epochs, Some(12));
        assert!((overrides.lr.unwrap() - 0.001).abs() < 1e-6);
        assert_eq!(overrides.precision, Some(Precision::Bf16));
    }

    #[test]
    fn test_precision_flags_conflict() {
        let result = parse_args(["mixtrain", "train", "config.yaml", "--fp16", "--fp32"]);
        assert!(result.is_err());
    }

    #[test]
    fn test_parse_fp32_flag() {
        assert_eq!(train_args(&["--fp32"]).precision(), Some(Precision::Fp32));
        assert_eq!(train_args(&["--fp16"]).precision(), Some(Precision::Fp16));
    }

    #[test]
    fn test_global_flags() {
        let cli = parse_args(["mixtrain", "validate", "config.yaml", "--verbose"]).unwrap();
        assert!(cli.verbose);
        assert!(!cli.quiet);

        let cli = parse_args(["mixtrain", "-q", "info", "config.yaml"]).unwrap();
        assert!(cli.quiet);
    }

    #[test]
    fn test_verbose_and_quiet_conflict() {
        assert!(parse_args(["mixtrain", "-q", "-v", "info", "config.yaml"]).is_err());
    }

    #[test]
    fn test_parse_info_format() {
        let cli = parse_args(["mixtrain", "info", "config.yaml", "--format", "json"]).unwrap();
        match cli.command {
            Command::Info(args) => assert_eq!(args.format, OutputFormat::Json),
            _ => panic!("Expected Info command"),
        }
        assert!(parse_args(["mixtrain", "info", "config.yaml", "--format", "xml"]).is_err());
    }

    #[test]
    fn test_missing_config_is_error() {
        assert!(parse_args(["mixtrain", "train"]).is_err());
    }
}
