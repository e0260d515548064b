//! Configuration validation logic
//!
//! Validates training specifications for correctness before execution.

use super::error::ValidationError;
use crate::autograd::{MixedPrecisionConfig, Precision};
use crate::config::builder::split_sizes;
use crate::config::schema::{LayerSpec, TrainSpec};

/// Optimizers the builder knows
pub const VALID_OPTIMIZERS: [&str; 2] = ["sgd", "adamw"];

/// Validate a training specification
///
/// Checks:
/// - Numeric values are in valid ranges
/// - The validation split leaves at least one training sample
/// - Layer widths chain from the data features to a single output
/// - Enums match allowed values
/// - The mixed-precision section resolves to a usable scaler
pub fn validate_config(spec: &TrainSpec) -> Result<(), ValidationError> {
    let data = &spec.data;
    if data.samples == 0 {
        return Err(ValidationError::InvalidSampleCount(data.samples));
    }
    if data.features == 0 {
        return Err(ValidationError::InvalidFeatureCount(data.features));
    }
    if data.batch_size == 0 {
        return Err(ValidationError::InvalidBatchSize(data.batch_size));
    }
    if !(0.0..1.0).contains(&data.val_fraction) {
        return Err(ValidationError::InvalidValFraction(data.val_fraction));
    }
    if split_sizes(data.samples, data.val_fraction).0 == 0 {
        return Err(ValidationError::EmptyTrainSplit {
            samples: data.samples,
            val_fraction: data.val_fraction,
        });
    }
    if !data.noise.is_finite() || data.noise < 0.0 {
        return Err(ValidationError::InvalidNoise(data.noise));
    }

    // Validate learning rate (must be positive and reasonable)
    if !is_positive(spec.optimizer.lr) || spec.optimizer.lr > 1.0 {
        return Err(ValidationError::InvalidLearningRate(spec.optimizer.lr));
    }

    if !VALID_OPTIMIZERS.contains(&spec.optimizer.name.to_lowercase().as_str()) {
        return Err(ValidationError::InvalidOptimizer(spec.optimizer.name.clone()));
    }

    if spec.training.epochs == 0 {
        return Err(ValidationError::InvalidEpochs(spec.training.epochs));
    }
    if let Some(max_norm) = spec.training.max_grad_norm {
        if !is_positive(max_norm) {
            return Err(ValidationError::InvalidGradClip(max_norm));
        }
    }
    if spec.training.log_interval == 0 {
        return Err(ValidationError::InvalidLogInterval(spec.training.log_interval));
    }

    validate_layers(&spec.model.layers, data.features)?;

    if let Some(mp) = &spec.mixed_precision {
        if mp.precision == Precision::Fp32 {
            return Err(ValidationError::Fp32MixedPrecision);
        }
        validate_mixed_precision(&mp.to_config())?;
    }

    Ok(())
}

/// Check that layer widths chain from `features` to a single output
pub fn validate_layers(layers: &[LayerSpec], features: usize) -> Result<(), ValidationError> {
    if layers.is_empty() {
        return Err(ValidationError::EmptyModel);
    }

    let mut width = features;
    let mut width_fixed = false;
    for (index, layer) in layers.iter().enumerate() {
        if layer.input_width() == Some(0) || layer.output_width() == Some(0) {
            return Err(ValidationError::ZeroWidthLayer { index });
        }
        if let LayerSpec::LayerNorm { eps, .. } = layer {
            if !is_positive(*eps) {
                return Err(ValidationError::InvalidNormEpsilon { index, eps: *eps });
            }
        }
        if let Some(expected) = layer.input_width() {
            if expected != width {
                return Err(if width_fixed {
                    ValidationError::LayerWidthMismatch { index, expected, actual: width }
                } else {
                    ValidationError::InputWidthMismatch { index, expected, features }
                });
            }
        }
        if let Some(out) = layer.output_width() {
            width = out;
            width_fixed = true;
        }
    }

    if width != 1 {
        return Err(ValidationError::InvalidOutputWidth(width));
    }
    Ok(())
}

/// Check the scaler settings of a resolved mixed-precision config
pub fn validate_mixed_precision(config: &MixedPrecisionConfig) -> Result<(), ValidationError> {
    let scales = [
        ("initial_scale", config.initial_scale),
        ("max_scale", config.max_scale),
        ("min_scale", config.min_scale),
    ];
    for (name, value) in scales {
        if !is_positive(value) {
            return Err(ValidationError::InvalidScale { name, value });
        }
    }
    if config.min_scale > config.max_scale {
        return Err(ValidationError::ScaleBoundsInverted {
            min: config.min_scale,
            max: config.max_scale,
        });
    }
    let backoff = config.scale_backoff_factor;
    if !is_positive(backoff) || backoff >= 1.0 {
        return Err(ValidationError::InvalidBackoffFactor(backoff));
    }
    let growth = config.scale_growth_factor;
    if !is_positive(growth) || growth <= 1.0 {
        return Err(ValidationError::InvalidGrowthFactor(growth));
    }
    if config.scale_growth_interval == 0 {
        return Err(ValidationError::InvalidGrowthInterval(config.scale_growth_interval));
    }
    if let Some(clip) = config.clip {
        if !is_positive(clip) {
            return Err(ValidationError::InvalidGradClip(clip));
        }
    }
    Ok(())
}

fn is_positive(value: f32) -> bool {
    value.is_finite() && value > 0.0
}
