//! Loading, overriding and running YAML training specs

use std::fs;
use std::path::Path;

use super::builder::{build_data, build_model, build_optimizer, Dataset};
use super::schema::{MixedPrecisionSpec, TrainSpec};
use super::validate::validate_config;
use crate::autograd::{estimate_memory_savings, MixedPrecisionConfig, Precision};
use crate::error::{Error, Result};
use crate::nn::Module;
use crate::train::{EarlyStopping, MSELoss, ProgressCallback, TrainConfig, TrainResult, Trainer};

/// Read, parse and validate a training spec
///
/// # Example
///
/// ```no_run
/// use mixtrain::config::load_config;
///
/// let spec = load_config("train.yaml")?;
/// println!("{} epochs", spec.training.epochs);
/// # Ok::<(), mixtrain::Error>(())
/// ```
pub fn load_config<P: AsRef<Path>>(path: P) -> Result<TrainSpec> {
    let path = path.as_ref();
    let yaml = fs::read_to_string(path).map_err(|e| Error::io("reading config", path, e))?;
    parse_config(&yaml)
}

/// Parse and validate a spec from YAML text
pub fn parse_config(yaml: &str) -> Result<TrainSpec> {
    let spec: TrainSpec = serde_yaml::from_str(yaml)?;
    validate_config(&spec)?;
    Ok(spec)
}

/// Values given on the command line that win over the file
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct TrainOverrides {
    /// Replace `training.epochs`
    pub epochs: Option<usize>,
    /// Replace `optimizer.lr`
    pub lr: Option<f32>,
    /// Fp32 removes the mixed-precision section; fp16/bf16 select that preset
    pub precision: Option<Precision>,
}

/// Apply overrides and validate the result
pub fn apply_overrides(spec: &mut TrainSpec, overrides: &TrainOverrides) -> Result<()> {
    if let Some(epochs) = overrides.epochs {
        spec.training.epochs = epochs;
    }
    if let Some(lr) = overrides.lr {
        spec.optimizer.lr = lr;
    }
    match overrides.precision {
        Some(Precision::Fp32) => spec.mixed_precision = None,
        Some(precision) => match spec.mixed_precision.as_mut() {
            Some(mp) if mp.precision == precision => {}
            _ => spec.mixed_precision = Some(MixedPrecisionSpec::new(precision)),
        },
        None => {}
    }
    validate_config(spec)?;
    Ok(())
}

/// Assemble a trainer for a `TrainSpec`; registers mixed precision when configured
pub fn build_trainer(spec: &TrainSpec) -> Result<Trainer> {
    let model = build_model(&spec.model);
    let optimizer = build_optimizer(&spec.optimizer)?;

    let mut config = TrainConfig::new().with_log_interval(spec.training.log_interval);
    config.max_grad_norm = spec.training.max_grad_norm;

    let mut trainer = Trainer::new(Box::new(model), optimizer, config);
    trainer.set_loss(Box::new(MSELoss));
    trainer.add_callback(ProgressCallback::new(spec.training.log_interval));
    if let Some(patience) = spec.training.early_stopping_patience {
        trainer.add_callback(EarlyStopping::new(patience, 1e-6).monitor_validation());
    }
    if let Some(mp) = mixed_precision_config(spec) {
        trainer.to_fp16(mp);
    }
    Ok(trainer)
}

/// Resolved mixed-precision settings of a `TrainSpec`
///
/// With a master copy installed the optimizer steps the master tensors, so
/// `training.max_grad_norm` becomes the master-gradient clip unless the
/// section sets its own `clip`.
pub fn mixed_precision_config(spec: &TrainSpec) -> Option<MixedPrecisionConfig> {
    let mut config = spec.mixed_precision.as_ref()?.to_config();
    if config.clip.is_none() {
        config.clip = spec.training.max_grad_norm;
    }
    Some(config)
}

/// Outcome of a spec-driven run
#[derive(Debug)]
pub struct TrainRun {
    /// Loop result
    pub result: TrainResult,
    /// Trainer after training; the model is back in fp32
    pub trainer: Trainer,
    /// Loss on the held-out split after training
    pub val_loss: Option<f32>,
}

/// Build model, optimizer and data from a `TrainSpec`, then train
pub fn train_from_spec(spec: &TrainSpec) -> Result<TrainRun> {
    let Dataset { train, val } = build_data(&spec.data)?;
    let mut trainer = build_trainer(spec)?;

    tracing::info!(
        train_batches = train.len(),
        val_batches = val.len(),
        epochs = spec.training.epochs,
        precision = %spec_precision(spec),
        "starting training"
    );

    let val_split = (!val.is_empty()).then_some(val.as_slice());
    let result = trainer.fit(spec.training.epochs, &train, val_split)?;
    let val_loss = match val_split {
        Some(batches) => Some(trainer.evaluate(batches)?),
        None => None,
    };
    Ok(TrainRun { result, trainer, val_loss })
}

/// Compute precision a `TrainSpec` trains in
pub fn spec_precision(spec: &TrainSpec) -> Precision {
    spec.mixed_precision.as_ref().map_or(Precision::Fp32, |mp| mp.precision)
}

/// Per-layer summary and memory estimate
#[derive(Debug, Clone, PartialEq)]
pub struct ModelSummary {
    /// Layer names and parameter counts, in order
    pub layers: Vec<(String, usize)>,
    /// Total parameters
    pub num_params: usize,
    /// Compute precision
    pub precision: Precision,
    /// Estimated bytes for fp32 training
    pub fp32_bytes: usize,
    /// Estimated bytes for training at `precision`
    pub mixed_bytes: usize,
    /// `1 - mixed / fp32`
    pub savings: f32,
}

impl ModelSummary {
    /// Serialize as a JSON object
    pub fn to_json(&self) -> serde_json::Value {
        let layers: Vec<_> = self
            .layers
            .iter()
            .map(|(name, params)| serde_json::json!({ "layer": name, "params": params }))
            .collect();
        serde_json::json!({
            "layers": layers,
            "num_params": self.num_params,
            "precision": self.precision.name(),
            "fp32_bytes": self.fp32_bytes,
            "mixed_bytes": self.mixed_bytes,
            "savings": self.savings,
        })
    }
}

/// Summarize the model a spec builds
///
/// Activations are estimated as one batch times the sum of layer output
/// widths.
pub fn summarize(spec: &TrainSpec) -> ModelSummary {
    let model = build_model(&spec.model);
    let layers: Vec<(String, usize)> =
        model.layers().iter().map(|l| (l.name().to_string(), l.num_params())).collect();
    let num_params = model.num_params();

    let mut width = spec.data.features;
    let mut activation_width = 0;
    for layer in &spec.model.layers {
        width = layer.output_width().unwrap_or(width);
        activation_width += width;
    }
    let activations = spec.data.batch_size * activation_width;

    let precision = spec_precision(spec);
    let (fp32_bytes, mixed_bytes, savings) = estimate_memory_savings(num_params, activations, precision);
    ModelSummary { layers, num_params, precision, fp32_bytes, mixed_bytes, savings }
}
