//! Train command implementation

use super::validate::format_spec;
use crate::cli::logging::log;
use crate::cli::LogLevel;
use crate::config::{apply_overrides, load_config, train_from_spec, TrainArgs, TrainRun};

pub fn run_train(args: TrainArgs, level: LogLevel) -> Result<(), String> {
    log(
        level,
        LogLevel::Normal,
        &format!("mixtrain: training from {}", args.config.display()),
    );

    let mut spec = load_config(&args.config).map_err(|e| format!("Config error: {e}"))?;
    apply_overrides(&mut spec, &args.overrides()).map_err(|e| format!("Config error: {e}"))?;

    if args.dry_run {
        log(level, LogLevel::Normal, "Dry run - config validated successfully");
        log(level, LogLevel::Normal, &format_spec(&spec));
        return Ok(());
    }

    let TrainRun { result, val_loss, .. } =
        train_from_spec(&spec).map_err(|e| format!("Training error: {e}"))?;

    if args.json {
        let mut json = result.to_json();
        json["val_loss"] = serde_json::json!(val_loss);
        let text =
            serde_json::to_string_pretty(&json).map_err(|e| format!("JSON serialization error: {e}"))?;
        println!("{text}");
        return Ok(());
    }

    log(level, LogLevel::Normal, "Training complete!");
    log(level, LogLevel::Normal, &format!("  Epochs: {}", result.final_epoch));
    log(level, LogLevel::Normal, &format!("  Final loss: {:.6}", result.final_loss));
    log(level, LogLevel::Normal, &format!("  Best loss: {:.6}", result.best_loss));
    if let Some(val) = val_loss {
        log(level, LogLevel::Normal, &format!("  Validation loss: {val:.6}"));
    }
    if result.skipped_steps > 0 {
        log(
            level,
            LogLevel::Normal,
            &format!("  Skipped steps (overflow): {}", result.skipped_steps),
        );
    }
    if result.stopped_early {
        log(level, LogLevel::Normal, "  Stopped early");
    }
    log(level, LogLevel::Verbose, &format!("  Elapsed: {:.2}s", result.elapsed_secs));
    Ok(())
}
