//! Build training components from configuration

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use super::schema::{DataConfig, LayerSpec, ModelSpec, OptimSpec};
use crate::error::{Error, Result};
use crate::nn::{LayerNorm, Linear, Relu, Sequential};
use crate::optim::{AdamW, Optimizer, SGD};
use crate::train::Batch;
use crate::Tensor;

// Optimizer parameter field names
const PARAM_MOMENTUM: &str = "momentum";
const PARAM_BETA1: &str = "beta1";
const PARAM_BETA2: &str = "beta2";
const PARAM_EPS: &str = "eps";
const PARAM_WEIGHT_DECAY: &str = "weight_decay";

fn param_or(spec: &OptimSpec, key: &str, default: f32) -> f32 {
    spec.params.get(key).and_then(serde_json::Value::as_f64).map_or(default, |v| v as f32)
}

/// Build optimizer from configuration
pub fn build_optimizer(spec: &OptimSpec) -> Result<Box<dyn Optimizer>> {
    match spec.name.to_lowercase().as_str() {
        "sgd" => {
            let momentum = param_or(spec, PARAM_MOMENTUM, 0.0);
            Ok(Box::new(SGD::new(spec.lr, momentum)))
        }
        "adamw" => {
            let beta1 = param_or(spec, PARAM_BETA1, 0.9);
            let beta2 = param_or(spec, PARAM_BETA2, 0.999);
            let eps = param_or(spec, PARAM_EPS, 1e-8);
            let weight_decay = param_or(spec, PARAM_WEIGHT_DECAY, 0.01);
            Ok(Box::new(AdamW::new(spec.lr, beta1, beta2, eps, weight_decay)))
        }
        name => Err(Error::Config(format!("Unknown optimizer: {name}. Supported: sgd, adamw"))),
    }
}

/// Build a model from its layer list, initialized from `spec.seed`
pub fn build_model(spec: &ModelSpec) -> Sequential {
    let mut rng = StdRng::seed_from_u64(spec.seed);
    let mut model = Sequential::new();
    for layer in &spec.layers {
        match *layer {
            LayerSpec::Linear { inputs, outputs } => model.push(Linear::new(inputs, outputs, &mut rng)),
            LayerSpec::LayerNorm { features, eps } => model.push(LayerNorm::new(features, eps)),
            LayerSpec::Relu => model.push(Relu::new()),
        }
    }
    model
}

/// Synthetic regression split into batches
#[derive(Debug, Clone)]
pub struct Dataset {
    /// Training batches
    pub train: Vec<Batch>,
    /// Held-out batches (empty when `val_fraction` is 0)
    pub val: Vec<Batch>,
}

/// Generate `y = w·x + b + noise` with `x`, `w`, `b` drawn from U(-1, 1)
///
/// The last batch of each split may be smaller than `batch_size`.
pub fn build_data(config: &DataConfig) -> Result<Dataset> {
    let mut rng = StdRng::seed_from_u64(config.seed);
    let features = config.features;
    let weights: Vec<f32> = (0..features).map(|_| rng.random_range(-1.0..1.0)).collect();
    let bias: f32 = rng.random_range(-1.0..1.0);

    let mut xs = Vec::with_capacity(config.samples * features);
    let mut ys = Vec::with_capacity(config.samples);
    for _ in 0..config.samples {
        let row: Vec<f32> = (0..features).map(|_| rng.random_range(-1.0..1.0)).collect();
        let clean: f32 = row.iter().zip(&weights).map(|(x, w)| x * w).sum::<f32>() + bias;
        let noise = if config.noise > 0.0 { rng.random_range(-config.noise..config.noise) } else { 0.0 };
        xs.extend(row);
        ys.push(clean + noise);
    }

    let (n_train, _) = split_sizes(config.samples, config.val_fraction);
    let train = batches(&xs[..n_train * features], &ys[..n_train], features, config.batch_size)?;
    let val = batches(&xs[n_train * features..], &ys[n_train..], features, config.batch_size)?;
    Ok(Dataset { train, val })
}

/// Train and validation sample counts for a split
pub(crate) fn split_sizes(samples: usize, val_fraction: f32) -> (usize, usize) {
    let n_val = (((samples as f32) * val_fraction).round() as usize).min(samples);
    (samples - n_val, n_val)
}

fn batches(xs: &[f32], ys: &[f32], features: usize, batch_size: usize) -> Result<Vec<Batch>> {
    if batch_size == 0 || features == 0 {
        return Err(Error::Config("batch size and feature count must be positive".into()));
    }
    xs.chunks(batch_size * features)
        .zip(ys.chunks(batch_size))
        .map(|(x, y)| {
            let rows = y.len();
            Ok(Batch::new(
                Tensor::from_shape_vec(vec![rows, features], x.to_vec(), false)?,
                Tensor::from_shape_vec(vec![rows, 1], y.to_vec(), false)?,
            ))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::nn::Module;
    use std::collections::HashMap;

    fn optim(name: &str, params: &[(&str, f64)]) -> OptimSpec {
        let params: HashMap<String, serde_json::Value> =
            params.iter().map(|(k, v)| ((*k).to_string(), serde_json::json!(v))).collect();
        OptimSpec { name: name.to_string(), lr: 0.01, params }
    }

    #[test]
    fn test_build_optimizer_sgd() {
        let optimizer = build_optimizer(&optim("sgd", &[("momentum", 0.9)])).unwrap();
        assert_eq!(optimizer.lr(), 0.01);
        assert_eq!(optimizer.name(), "SGD");
    }

    #[test]
    fn test_build_optimizer_adamw_case_insensitive() {
        let optimizer = build_optimizer(&optim("AdamW", &[("weight_decay", 0.0)])).unwrap();
        assert_eq!(optimizer.name(), "AdamW");
    }

    #[test]
    fn test_build_optimizer_unknown() {
        let err = build_optimizer(&optim("lamb", &[])).err().unwrap();
        assert!(matches!(err, Error::Config(_)));
    }

    #[test]
    fn test_build_model_is_deterministic() {
        let spec = ModelSpec {
            layers: vec![
                LayerSpec::Linear { inputs: 3, outputs: 4 },
                LayerSpec::LayerNorm { features: 4, eps: 1e-5 },
                LayerSpec::Relu,
                LayerSpec::Linear { inputs: 4, outputs: 1 },
            ],
            seed: 11,
        };
        let a = build_model(&spec);
        let b = build_model(&spec);
        assert_eq!(a.len(), 4);
        assert_eq!(a.num_params(), 3 * 4 + 4 + 4 + 4 + 4 + 1);
        assert_eq!(a.params()[0].tensor.data(), b.params()[0].tensor.data());
        assert_eq!(a.out_features(), Some(1));
    }

    #[test]
    fn test_build_data_split_and_batches() {
        let config = DataConfig {
            samples: 100,
            features: 3,
            batch_size: 16,
            val_fraction: 0.2,
            noise: 0.0,
            seed: 1,
        };
        let data = build_data(&config).unwrap();

        let train_rows: usize = data.train.iter().map(Batch::size).sum();
        let val_rows: usize = data.val.iter().map(Batch::size).sum();
        assert_eq!(train_rows, 80);
        assert_eq!(val_rows, 20);
        assert_eq!(data.train.len(), 5);
        assert_eq!(data.train[4].size(), 16);
        assert_eq!(data.val[1].size(), 4);
        assert_eq!(data.train[0].inputs.shape(), &[16, 3]);
        assert_eq!(data.train[0].targets.shape(), &[16, 1]);
    }

    #[test]
    fn test_build_data_is_seeded() {
        let config = DataConfig { samples: 10, ..Default::default() };
        let a = build_data(&config).unwrap();
        let b = build_data(&config).unwrap();
        assert_eq!(a.train[0].targets.data(), b.train[0].targets.data());
    }

    #[test]
    fn test_no_validation_split() {
        let config = DataConfig { samples: 10, val_fraction: 0.0, ..Default::default() };
        let data = build_data(&config).unwrap();
        assert!(data.val.is_empty());
    }

    #[test]
    fn test_split_sizes_round_the_validation_share() {
        assert_eq!(split_sizes(100, 0.2), (80, 20));
        assert_eq!(split_sizes(1, 0.5), (0, 1));
        assert_eq!(split_sizes(1, 0.4), (1, 0));
        assert_eq!(split_sizes(7, 0.0), (7, 0));
    }
}
