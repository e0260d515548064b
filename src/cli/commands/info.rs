//! Info command implementation

use crate::cli::logging::log;
use crate::cli::LogLevel;
use crate::config::{load_config, summarize, InfoArgs, ModelSummary, OutputFormat};

/// Human-readable summary table
pub fn format_summary(summary: &ModelSummary) -> String {
    let mut lines = vec![format!("{:<4} {:<10} {:>8}", "#", "Layer", "Params")];
    for (i, (name, params)) in summary.layers.iter().enumerate() {
        lines.push(format!("{i:<4} {name:<10} {params:>8}"));
    }
    lines.push(format!("Total parameters: {}", summary.num_params));
    lines.push(format!("Compute precision: {}", summary.precision.name()));
    lines.push(format!("Estimated memory (fp32): {} bytes", summary.fp32_bytes));
    lines.push(format!(
        "Estimated memory ({}): {} bytes ({:.1}% saved)",
        summary.precision.name(),
        summary.mixed_bytes,
        summary.savings * 100.0
    ));
    lines.join("\n")
}

pub fn run_info(args: InfoArgs, level: LogLevel) -> Result<(), String> {
    let spec = load_config(&args.config).map_err(|e| format!("Config error: {e}"))?;
    let summary = summarize(&spec);

    match args.format {
        OutputFormat::Text => {
            log(level, LogLevel::Normal, &format!("Model summary: {}", args.config.display()));
            println!("{}", format_summary(&summary));
        }
        OutputFormat::Json => {
            let json = serde_json::to_string_pretty(&summary.to_json())
                .map_err(|e| format!("JSON serialization error: {e}"))?;
            println!("{json}");
        }
    }

    Ok(())
}
