//! Validation error types
//!
//! Defines all validation error variants for training specifications.

/// Validation error type
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ValidationError {
    #[error("Invalid learning rate: {0} (must be > 0.0 and <= 1.0)")]
    InvalidLearningRate(f32),

    #[error("Invalid batch size: {0} (must be > 0)")]
    InvalidBatchSize(usize),

    #[error("Invalid epochs: {0} (must be > 0)")]
    InvalidEpochs(usize),

    #[error("Invalid sample count: {0} (must be > 0)")]
    InvalidSampleCount(usize),

    #[error("Invalid feature count: {0} (must be > 0)")]
    InvalidFeatureCount(usize),

    #[error("Invalid validation fraction: {0} (must be in [0.0, 1.0))")]
    InvalidValFraction(f32),

    #[error("Validation fraction {val_fraction} of {samples} samples leaves no training samples")]
    EmptyTrainSplit { samples: usize, val_fraction: f32 },

    #[error("Invalid noise amplitude: {0} (must be finite and >= 0.0)")]
    InvalidNoise(f32),

    #[error("Invalid optimizer: {0} (must be one of: sgd, adamw)")]
    InvalidOptimizer(String),

    #[error("Invalid gradient clip value: {0} (must be > 0.0)")]
    InvalidGradClip(f32),

    #[error("Invalid log interval: {0} (must be > 0)")]
    InvalidLogInterval(usize),

    #[error("Model has no layers")]
    EmptyModel,

    #[error("Layer {index} has zero width")]
    ZeroWidthLayer { index: usize },

    #[error("Layer {index} expects {expected} inputs but the data has {features} features")]
    InputWidthMismatch { index: usize, expected: usize, features: usize },

    #[error("Layer {index} expects width {expected} but the previous layer produces {actual}")]
    LayerWidthMismatch { index: usize, expected: usize, actual: usize },

    #[error("Layer {index} has invalid epsilon {eps} (must be finite and > 0.0)")]
    InvalidNormEpsilon { index: usize, eps: f32 },

    #[error("Model output width is {0} (regression needs 1)")]
    InvalidOutputWidth(usize),

    #[error("Mixed precision section selects fp32; remove it or choose fp16/bf16")]
    Fp32MixedPrecision,

    #[error("Invalid {name}: {value} (must be finite and > 0.0)")]
    InvalidScale { name: &'static str, value: f32 },

    #[error("min_scale {min} exceeds max_scale {max}")]
    ScaleBoundsInverted { min: f32, max: f32 },

    #[error("Invalid backoff factor: {0} (must be in (0.0, 1.0))")]
    InvalidBackoffFactor(f32),

    #[error("Invalid growth factor: {0} (must be > 1.0)")]
    InvalidGrowthFactor(f32),

    #[error("Invalid growth interval: {0} (must be > 0)")]
    InvalidGrowthInterval(usize),
}
