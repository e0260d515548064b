//! Fully connected layer: y = x Wᵀ + b

use ndarray::{Array1, Array2, Axis};
use rand::Rng;

use super::{as_matrix, from_matrix, Module, Param, ParamKind};
use crate::error::{Error, Result};
use crate::{Precision, Tensor};

/// Fully connected layer
///
/// The weight is stored `[out_features, in_features]`. The output is produced
/// in the weight's precision, so a half-precision layer emits half-precision
/// activations.
pub struct Linear {
    in_features: usize,
    out_features: usize,
    params: [Param; 2],
    cache: Option<(Array2<f32>, Precision)>,
}

impl Linear {
    /// Create a layer with uniform Kaiming-style initialization
    pub fn new<R: Rng>(in_features: usize, out_features: usize, rng: &mut R) -> Self {
        let bound = 1.0 / (in_features.max(1) as f32).sqrt();
        let weight: Vec<f32> =
            (0..in_features * out_features).map(|_| rng.random_range(-bound..=bound)).collect();
        let bias: Vec<f32> = (0..out_features).map(|_| rng.random_range(-bound..=bound)).collect();
        Self::build(in_features, out_features, weight, bias)
    }

    /// Create a layer from explicit row-major weights and bias
    pub fn from_weights(
        in_features: usize,
        out_features: usize,
        weight: Vec<f32>,
        bias: Vec<f32>,
    ) -> Result<Self> {
        if weight.len() != in_features * out_features {
            return Err(Error::shape("linear.weight", &[out_features, in_features], &[weight.len()]));
        }
        if bias.len() != out_features {
            return Err(Error::shape("linear.bias", &[out_features], &[bias.len()]));
        }
        Ok(Self::build(in_features, out_features, weight, bias))
    }

    fn build(in_features: usize, out_features: usize, weight: Vec<f32>, bias: Vec<f32>) -> Self {
        let weight = Tensor::from_vec(weight, true);
        let bias = Tensor::from_vec(bias, true);
        Self {
            in_features,
            out_features,
            params: [
                Param::new("weight", ParamKind::Weight, weight),
                Param::new("bias", ParamKind::Bias, bias),
            ],
            cache: None,
        }
    }

    /// Input width
    pub fn in_features(&self) -> usize {
        self.in_features
    }

    fn weight_matrix(&self) -> Result<Array2<f32>> {
        Array2::from_shape_vec(
            (self.out_features, self.in_features),
            self.params[0].tensor.data().to_vec(),
        )
        .map_err(|_| {
            Error::shape(
                "linear.weight",
                &[self.out_features, self.in_features],
                &[self.params[0].tensor.len()],
            )
        })
    }
}

impl Module for Linear {
    fn forward(&mut self, input: &Tensor) -> Result<Tensor> {
        let precision = self.params[0].tensor.precision();
        let x = as_matrix(&input.cast(precision), self.in_features, "linear.forward")?;
        let w = self.weight_matrix()?;
        let b = self.params[1].tensor.data();

        let y = x.dot(&w.t()) + &b;
        self.cache = Some((x, input.precision()));
        from_matrix(&y, precision, false)
    }

    fn backward(&mut self, grad_output: &Tensor) -> Result<Tensor> {
        let (x, input_precision) = self.cache.take().ok_or_else(|| Error::MissingState {
            what: "linear input cache".into(),
            hint: "call forward before backward".into(),
        })?;
        let g = as_matrix(grad_output, self.out_features, "linear.backward")?;
        if g.nrows() != x.nrows() {
            return Err(Error::shape(
                "linear.backward",
                &[x.nrows(), self.out_features],
                grad_output.shape(),
            ));
        }

        let w = self.weight_matrix()?;
        let grad_x = g.dot(&w);

        if self.params[0].is_trainable() {
            let grad_w = g.t().dot(&x);
            let flat = Array1::from_iter(grad_w.iter().copied());
            self.params[0].tensor.accumulate_grad(&flat)?;
        }
        if self.params[1].is_trainable() {
            let grad_b = g.sum_axis(Axis(0));
            self.params[1].tensor.accumulate_grad(&grad_b)?;
        }

        from_matrix(&grad_x, input_precision, false)
    }

    fn params(&self) -> Vec<&Param> {
        self.params.iter().collect()
    }

    fn params_mut(&mut self) -> Vec<&mut Param> {
        self.params.iter_mut().collect()
    }

    fn name(&self) -> &str {
        "Linear"
    }

    fn out_features(&self) -> Option<usize> {
        Some(self.out_features)
    }
}
