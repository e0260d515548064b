//! CLI command tests

use super::*;
use crate::cli::LogLevel;
use crate::config::*;
use std::path::PathBuf;
use tempfile::TempDir;

const CONFIG: &str = r"
model:
  layers:
    - type: linear
      inputs: 3
      outputs: 6
    - type: layer_norm
      features: 6
    - type: relu
    - type: linear
      inputs: 6
      outputs: 1
data:
  samples: 48
  features: 3
  batch_size: 8
optimizer:
  name: adamw
  lr: 0.01
training:
  epochs: 2
mixed_precision:
  precision: fp16
";

fn create_test_config(dir: &TempDir, text: &str) -> PathBuf {
    let path = dir.path().join("train.yaml");
    std::fs::write(&path, text).unwrap();
    path
}

fn train_args(config: PathBuf) -> TrainArgs {
    TrainArgs {
        config,
        epochs: None,
        lr: None,
        fp16: false,
        bf16: false,
        fp32: false,
        dry_run: false,
        json: false,
    }
}

#[test]
fn test_validate_command_basic() {
    let dir = TempDir::new().unwrap();
    let args = ValidateArgs { config: create_test_config(&dir, CONFIG) };
    assert!(validate::run_validate(args, LogLevel::Verbose).is_ok());
}

#[test]
fn test_validate_command_reports_error() {
    let dir = TempDir::new().unwrap();
    let bad = CONFIG.replace("lr: 0.01", "lr: 0.0");
    let args = ValidateArgs { config: create_test_config(&dir, &bad) };
    let err = validate::run_validate(args, LogLevel::Quiet).unwrap_err();
    assert!(err.contains("Config error"));
    assert!(err.contains("learning rate"));
}

#[test]
fn test_validate_missing_file() {
    let args = ValidateArgs { config: PathBuf::from("/nonexistent/train.yaml") };
    assert!(validate::run_validate(args, LogLevel::Quiet).is_err());
}

#[test]
fn test_train_dry_run() {
    let dir = TempDir::new().unwrap();
    let mut args = train_args(create_test_config(&dir, CONFIG));
    args.dry_run = true;
    args.bf16 = true;
    assert!(train::run_train(args, LogLevel::Quiet).is_ok());
}

#[test]
fn test_train_runs_with_overrides() {
    let dir = TempDir::new().unwrap();
    let mut args = train_args(create_test_config(&dir, CONFIG));
    args.epochs = Some(1);
    args.json = true;
    assert!(train::run_train(args, LogLevel::Quiet).is_ok());
}

#[test]
fn test_train_rejects_invalid_override() {
    let dir = TempDir::new().unwrap();
    let mut args = train_args(create_test_config(&dir, CONFIG));
    args.epochs = Some(0);
    let err = train::run_train(args, LogLevel::Quiet).unwrap_err();
    assert!(err.contains("Config error"));
}

#[test]
fn test_info_text_and_json() {
    let dir = TempDir::new().unwrap();
    let config = create_test_config(&dir, CONFIG);
    let text = InfoArgs { config: config.clone(), format: OutputFormat::Text };
    assert!(info::run_info(text, LogLevel::Quiet).is_ok());
    let json = InfoArgs { config, format: OutputFormat::Json };
    assert!(info::run_info(json, LogLevel::Quiet).is_ok());
}

#[test]
fn test_format_spec_sections() {
    let spec = parse_config(CONFIG).unwrap();
    let text = validate::format_spec(&spec);
    assert!(text.contains("linear 3 -> 6"));
    assert!(text.contains("layer_norm 6"));
    assert!(text.contains("Optimizer: adamw"));
    assert!(text.contains("Precision: fp16 (mixed)"));
    assert!(text.contains("dynamic"));
}

#[test]
fn test_format_precision_shows_inherited_clip() {
    let spec = parse_config(&CONFIG.replace("epochs: 2", "epochs: 2\n  max_grad_norm: 1.5")).unwrap();
    assert!(validate::format_precision_info(&spec).contains("Master gradient clip: 1.5"));
}

#[test]
fn test_format_fp32_precision() {
    let mut spec = parse_config(CONFIG).unwrap();
    spec.mixed_precision = None;
    assert_eq!(validate::format_precision_info(&spec), "  Precision: fp32");
}

#[test]
fn test_format_summary() {
    let spec = parse_config(CONFIG).unwrap();
    let text = info::format_summary(&summarize(&spec));
    assert!(text.contains("LayerNorm"));
    assert!(text.contains("Total parameters: 43"));
    assert!(text.contains("saved"));
}

#[test]
fn test_run_command_dispatch() {
    let dir = TempDir::new().unwrap();
    let config = create_test_config(&dir, CONFIG);
    let path = config.to_str().unwrap();
    let cli = parse_args(["mixtrain", "--quiet", "validate", path]).unwrap();
    assert!(run_command(cli).is_ok());
}
