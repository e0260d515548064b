//! YAML schema definitions for declarative training configuration

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::autograd::{MixedPrecisionConfig, Precision};

/// Complete training specification
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrainSpec {
    /// Model architecture
    pub model: ModelSpec,

    /// Synthetic data configuration
    #[serde(default)]
    pub data: DataConfig,

    /// Optimizer configuration
    pub optimizer: OptimSpec,

    /// Training hyperparameters
    #[serde(default)]
    pub training: TrainingParams,

    /// Optional mixed-precision configuration
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mixed_precision: Option<MixedPrecisionSpec>,
}

/// Model architecture as an ordered list of layers
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelSpec {
    /// Layers, input first
    pub layers: Vec<LayerSpec>,

    /// Seed for parameter initialization
    #[serde(default = "default_seed")]
    pub seed: u64,
}

/// One layer of the model
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum LayerSpec {
    /// Dense layer
    Linear {
        /// Input width
        inputs: usize,
        /// Output width
        outputs: usize,
    },
    /// Layer normalization (parameters stay fp32 by default)
    LayerNorm {
        /// Normalized width
        features: usize,
        /// Variance epsilon
        #[serde(default = "default_eps")]
        eps: f32,
    },
    /// Rectified linear unit
    Relu,
}

impl LayerSpec {
    /// Width this layer requires on its input, if it fixes one
    pub fn input_width(&self) -> Option<usize> {
        match self {
            LayerSpec::Linear { inputs, .. } => Some(*inputs),
            LayerSpec::LayerNorm { features, .. } => Some(*features),
            LayerSpec::Relu => None,
        }
    }

    /// Width this layer produces, if it fixes one
    pub fn output_width(&self) -> Option<usize> {
        match self {
            LayerSpec::Linear { outputs, .. } => Some(*outputs),
            LayerSpec::LayerNorm { features, .. } => Some(*features),
            LayerSpec::Relu => None,
        }
    }
}

/// Synthetic linear-regression data
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DataConfig {
    /// Total number of samples
    pub samples: usize,

    /// Input features per sample
    pub features: usize,

    /// Batch size
    pub batch_size: usize,

    /// Fraction of samples held out for validation
    pub val_fraction: f32,

    /// Amplitude of the uniform noise added to targets
    pub noise: f32,

    /// Seed for data generation
    pub seed: u64,
}

impl Default for DataConfig {
    fn default() -> Self {
        Self {
            samples: 256,
            features: 4,
            batch_size: default_batch_size(),
            val_fraction: 0.2,
            noise: 0.01,
            seed: default_seed(),
        }
    }
}

/// Optimizer specification
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OptimSpec {
    /// Optimizer name: "sgd" | "adamw"
    pub name: String,

    /// Learning rate
    pub lr: f32,

    /// Optimizer-specific parameters (momentum, beta1, beta2, eps, weight_decay)
    #[serde(flatten)]
    pub params: HashMap<String, serde_json::Value>,
}

/// Training hyperparameters
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TrainingParams {
    /// Number of epochs
    pub epochs: usize,

    /// Gradient clipping threshold
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_grad_norm: Option<f32>,

    /// Stop after this many epochs without improvement
    #[serde(skip_serializing_if = "Option::is_none")]
    pub early_stopping_patience: Option<usize>,

    /// Log every N steps
    pub log_interval: usize,
}

impl Default for TrainingParams {
    fn default() -> Self {
        Self { epochs: 10, max_grad_norm: None, early_stopping_patience: None, log_interval: 10 }
    }
}

/// Mixed-precision section: a preset plus optional overrides
///
/// ```yaml
/// mixed_precision:
///   precision: fp16
///   initial_scale: 1024
///   flat_master: true
/// ```
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct MixedPrecisionSpec {
    /// Compute precision; selects the preset
    pub precision: Precision,

    /// Initial loss scale
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub initial_scale: Option<f32>,

    /// Whether the scale adapts to overflow
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dynamic_scaling: Option<bool>,

    /// Clean steps before the scale grows
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub growth_interval: Option<usize>,

    /// Multiplier applied on growth
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub growth_factor: Option<f32>,

    /// Multiplier applied on overflow
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub backoff_factor: Option<f32>,

    /// Ceiling for the scale
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_scale: Option<f32>,

    /// Floor for the scale
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min_scale: Option<f32>,

    /// Pack master weights into one tensor
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub flat_master: Option<bool>,

    /// Leave normalization parameters in fp32
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub keep_norm_fp32: Option<bool>,

    /// Global-norm clip on master gradients
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub clip: Option<f32>,
}

impl MixedPrecisionSpec {
    /// Section selecting a preset with no overrides
    pub fn new(precision: Precision) -> Self {
        Self { precision, ..Default::default() }
    }

    /// Resolve the preset and apply the overrides
    pub fn to_config(&self) -> MixedPrecisionConfig {
        let mut config = MixedPrecisionConfig::for_precision(self.precision);
        if let Some(v) = self.initial_scale {
            config.initial_scale = v;
        }
        if let Some(v) = self.dynamic_scaling {
            config.dynamic_scaling = v;
        }
        if let Some(v) = self.growth_interval {
            config.scale_growth_interval = v;
        }
        if let Some(v) = self.growth_factor {
            config.scale_growth_factor = v;
        }
        if let Some(v) = self.backoff_factor {
            config.scale_backoff_factor = v;
        }
        if let Some(v) = self.max_scale {
            config.max_scale = v;
        }
        if let Some(v) = self.min_scale {
            config.min_scale = v;
        }
        if let Some(v) = self.flat_master {
            config.flat_master = v;
        }
        if let Some(v) = self.keep_norm_fp32 {
            config.keep_norm_fp32 = v;
        }
        if self.clip.is_some() {
            config.clip = self.clip;
        }
        config
    }
}

fn default_seed() -> u64 {
    42
}

fn default_eps() -> f32 {
    1e-5
}

fn default_batch_size() -> usize {
    16
}
