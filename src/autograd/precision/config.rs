//! Mixed-precision settings and presets

use serde::{Deserialize, Serialize};

use super::Precision;

/// Clean steps before the dynamic scale doubles
pub(crate) const DEFAULT_SCALE_GROWTH_INTERVAL: usize = 2000;

/// Ceiling for the dynamic scale, 2^24
pub(crate) const DEFAULT_MAX_SCALE: f32 = 16_777_216.0;

/// Compute precision, loss-scaling policy and master-copy layout
///
/// Master weights are always fp32; only the model copy changes precision.
///
/// ```rust
/// use mixtrain::autograd::{MixedPrecisionConfig, Precision};
///
/// let config = MixedPrecisionConfig::fp16().with_growth_interval(500).with_clip(1.0);
/// assert_eq!(config.compute_precision, Precision::Fp16);
/// assert!(config.dynamic_scaling);
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MixedPrecisionConfig {
    /// Precision of the model parameters, activations and gradients
    pub compute_precision: Precision,
    /// Loss scale at the start of training
    pub initial_scale: f32,
    /// Scale multiplier after a full growth window
    pub scale_growth_factor: f32,
    /// Scale multiplier after an overflow
    pub scale_backoff_factor: f32,
    /// Length of the growth window in clean steps
    pub scale_growth_interval: usize,
    /// Adapt the scale to overflows; a static scale never changes
    pub dynamic_scaling: bool,
    pub max_scale: f32,
    pub min_scale: f32,
    /// Pack the master copy into a single tensor
    pub flat_master: bool,
    /// Leave normalization parameters in fp32
    pub keep_norm_fp32: bool,
    /// Global-norm clip on the unscaled master gradients
    #[serde(skip_serializing_if = "Option::is_none")]
    pub clip: Option<f32>,
}

impl MixedPrecisionConfig {
    fn preset(compute_precision: Precision, initial_scale: f32, dynamic_scaling: bool) -> Self {
        Self {
            compute_precision,
            initial_scale,
            scale_growth_factor: 2.0,
            scale_backoff_factor: 0.5,
            scale_growth_interval: DEFAULT_SCALE_GROWTH_INTERVAL,
            dynamic_scaling,
            max_scale: DEFAULT_MAX_SCALE,
            min_scale: 1.0,
            flat_master: false,
            keep_norm_fp32: true,
            clip: None,
        }
    }

    /// Plain fp32 training, scale fixed at 1
    pub fn fp32() -> Self {
        Self::preset(Precision::Fp32, 1.0, false)
    }

    /// fp16 compute, dynamic scale starting at 2^16
    pub fn fp16() -> Self {
        Self::preset(Precision::Fp16, 65536.0, true)
    }

    /// bf16 compute; shares the fp32 exponent range so the scale stays at 1
    pub fn bf16() -> Self {
        Self::preset(Precision::Bf16, 1.0, false)
    }

    pub fn for_precision(precision: Precision) -> Self {
        match precision {
            Precision::Fp32 => Self::fp32(),
            Precision::Fp16 => Self::fp16(),
            Precision::Bf16 => Self::bf16(),
        }
    }

    /// True when the model computes in a reduced precision
    pub fn is_mixed(&self) -> bool {
        self.compute_precision.is_reduced()
    }

    pub fn with_initial_scale(mut self, scale: f32) -> Self {
        self.initial_scale = scale;
        self
    }

    pub fn with_dynamic_scaling(mut self, enabled: bool) -> Self {
        self.dynamic_scaling = enabled;
        self
    }

    pub fn with_growth_interval(mut self, steps: usize) -> Self {
        self.scale_growth_interval = steps;
        self
    }

    pub fn with_flat_master(mut self, flat: bool) -> Self {
        self.flat_master = flat;
        self
    }

    pub fn with_keep_norm_fp32(mut self, keep: bool) -> Self {
        self.keep_norm_fp32 = keep;
        self
    }

    pub fn with_clip(mut self, max_norm: f32) -> Self {
        self.clip = Some(max_norm);
        self
    }
}

impl Default for MixedPrecisionConfig {
    fn default() -> Self {
        Self::fp32()
    }
}
