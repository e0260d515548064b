//! Validate command implementation

use crate::cli::logging::log;
use crate::cli::LogLevel;
use crate::config::{
    load_config, mixed_precision_config, spec_precision, LayerSpec, TrainSpec, ValidateArgs,
};

/// One line per layer
pub fn format_model_info(spec: &TrainSpec) -> String {
    let mut lines = vec![format!("  Layers: {} (seed {})", spec.model.layers.len(), spec.model.seed)];
    for layer in &spec.model.layers {
        let line = match layer {
            LayerSpec::Linear { inputs, outputs } => format!("    linear {inputs} -> {outputs}"),
            LayerSpec::LayerNorm { features, eps } => format!("    layer_norm {features} (eps {eps})"),
            LayerSpec::Relu => "    relu".to_string(),
        };
        lines.push(line);
    }
    lines.join("\n")
}

/// Dataset shape and split
pub fn format_data_info(spec: &TrainSpec) -> String {
    let data = &spec.data;
    [
        format!("  Samples: {} x {} features", data.samples, data.features),
        format!("  Batch size: {}", data.batch_size),
        format!("  Validation fraction: {}", data.val_fraction),
    ]
    .join("\n")
}

/// Optimizer name, learning rate and extra parameters
pub fn format_optimizer_info(spec: &TrainSpec) -> String {
    let mut lines = vec![
        format!("  Optimizer: {}", spec.optimizer.name),
        format!("  Learning rate: {}", spec.optimizer.lr),
    ];
    let mut extra: Vec<_> = spec.optimizer.params.iter().collect();
    extra.sort_by(|a, b| a.0.cmp(b.0));
    for (key, value) in extra {
        lines.push(format!("  {key}: {value}"));
    }
    lines.join("\n")
}

/// Loop settings
pub fn format_training_info(spec: &TrainSpec) -> String {
    let mut lines = vec![format!("  Epochs: {}", spec.training.epochs)];
    if let Some(clip) = spec.training.max_grad_norm {
        lines.push(format!("  Gradient clipping: {clip}"));
    }
    if let Some(patience) = spec.training.early_stopping_patience {
        lines.push(format!("  Early stopping patience: {patience}"));
    }
    lines.join("\n")
}

/// Resolved mixed-precision settings, if enabled
pub fn format_precision_info(spec: &TrainSpec) -> String {
    let Some(config) = mixed_precision_config(spec) else {
        return format!("  Precision: {}", spec_precision(spec).name());
    };
    let mut lines = vec![
        format!("  Precision: {} (mixed)", config.compute_precision.name()),
        format!(
            "    Loss scale: {} ({})",
            config.initial_scale,
            if config.dynamic_scaling { "dynamic" } else { "static" }
        ),
        format!(
            "    Master layout: {}",
            if config.flat_master { "flat" } else { "per-parameter" }
        ),
        format!("    Norm layers in fp32: {}", config.keep_norm_fp32),
    ];
    if let Some(clip) = config.clip {
        lines.push(format!("    Master gradient clip: {clip}"));
    }
    lines.join("\n")
}

/// Every section, as printed by `validate` and `train --dry-run`
pub fn format_spec(spec: &TrainSpec) -> String {
    [
        "Model:".to_string(),
        format_model_info(spec),
        "Data:".to_string(),
        format_data_info(spec),
        "Optimizer:".to_string(),
        format_optimizer_info(spec),
        "Training:".to_string(),
        format_training_info(spec),
        format_precision_info(spec),
    ]
    .join("\n")
}

pub fn run_validate(args: ValidateArgs, level: LogLevel) -> Result<(), String> {
    log(
        level,
        LogLevel::Normal,
        &format!("Validating config: {}", args.config.display()),
    );

    let spec = load_config(&args.config).map_err(|e| format!("Config error: {e}"))?;

    log(level, LogLevel::Normal, "Configuration is valid");
    log(level, LogLevel::Verbose, &format_spec(&spec));
    Ok(())
}
