//! Layer normalization over the feature axis

use ndarray::{Array1, Array2, Axis};

use super::{as_matrix, from_matrix, Module, Param, ParamKind};
use crate::error::{Error, Result};
use crate::{Precision, Tensor};

/// Layer normalization
///
/// LayerNorm(x) = gamma * (x - mean) / sqrt(var + epsilon) + beta, per row.
/// Statistics are always computed in f32; the output keeps the input's
/// precision so it slots between half-precision layers.
pub struct LayerNorm {
    features: usize,
    epsilon: f32,
    params: [Param; 2],
    cache: Option<NormCache>,
}

struct NormCache {
    normalized: Array2<f32>,
    inv_std: Array1<f32>,
    input_precision: Precision,
}

impl LayerNorm {
    /// Create a layer norm with gamma = 1 and beta = 0
    pub fn new(features: usize, epsilon: f32) -> Self {
        Self {
            features,
            epsilon,
            params: [
                Param::new("gamma", ParamKind::Norm, Tensor::from_vec(vec![1.0; features], true)),
                Param::new("beta", ParamKind::Norm, Tensor::from_vec(vec![0.0; features], true)),
            ],
            cache: None,
        }
    }
}

impl Module for LayerNorm {
    fn forward(&mut self, input: &Tensor) -> Result<Tensor> {
        let x = as_matrix(input, self.features, "layer_norm.forward")?;
        let gamma = self.params[0].tensor.data();
        let beta = self.params[1].tensor.data();
        let n = self.features as f32;

        let mut normalized: Array2<f32> = Array2::zeros(x.raw_dim());
        let mut inv_std: Array1<f32> = Array1::zeros(x.nrows());
        for (r, row) in x.axis_iter(Axis(0)).enumerate() {
            let mean = row.sum() / n;
            let variance = row.mapv(|v| (v - mean).powi(2)).sum() / n;
            let inv = 1.0 / (variance + self.epsilon).sqrt();
            inv_std[r] = inv;
            normalized.row_mut(r).assign(&row.mapv(|v| (v - mean) * inv));
        }

        let y = &normalized * &gamma + &beta;
        let precision = input.precision();
        self.cache = Some(NormCache { normalized, inv_std, input_precision: precision });
        from_matrix(&y, precision, false)
    }

    fn backward(&mut self, grad_output: &Tensor) -> Result<Tensor> {
        let cache = self.cache.take().ok_or_else(|| Error::MissingState {
            what: "layer norm cache".into(),
            hint: "call forward before backward".into(),
        })?;
        let g = as_matrix(grad_output, self.features, "layer_norm.backward")?;
        if g.nrows() != cache.normalized.nrows() {
            return Err(Error::shape(
                "layer_norm.backward",
                &[cache.normalized.nrows(), self.features],
                grad_output.shape(),
            ));
        }
        let gamma = self.params[0].tensor.data();
        let n = self.features as f32;

        if self.params[0].is_trainable() {
            let grad_gamma = (&g * &cache.normalized).sum_axis(Axis(0));
            self.params[0].tensor.accumulate_grad(&grad_gamma)?;
        }
        if self.params[1].is_trainable() {
            let grad_beta = g.sum_axis(Axis(0));
            self.params[1].tensor.accumulate_grad(&grad_beta)?;
        }

        let grad_normalized = &g * &gamma;
        let mut grad_x: Array2<f32> = Array2::zeros(g.raw_dim());
        for r in 0..g.nrows() {
            let gn = grad_normalized.row(r);
            let xn = cache.normalized.row(r);
            let sum_grad = gn.sum();
            let sum_grad_normalized = (&gn * &xn).sum();
            let inv = cache.inv_std[r];
            let row = ndarray::Zip::from(&gn)
                .and(&xn)
                .map_collect(|&gi, &xi| (gi - sum_grad / n - xi * sum_grad_normalized / n) * inv);
            grad_x.row_mut(r).assign(&row);
        }

        from_matrix(&grad_x, cache.input_precision, false)
    }

    fn params(&self) -> Vec<&Param> {
        self.params.iter().collect()
    }

    fn params_mut(&mut self) -> Vec<&mut Param> {
        self.params.iter_mut().collect()
    }

    fn name(&self) -> &str {
        "LayerNorm"
    }

    fn out_features(&self) -> Option<usize> {
        Some(self.features)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    fn input() -> Tensor {
        Tensor::from_shape_vec(vec![2, 4], vec![1.0, -2.0, 3.0, 0.5, 10.0, 10.5, 9.0, 11.0], false)
            .unwrap()
    }

    #[test]
    fn test_layer_norm_rows_are_centered() {
        let mut ln = LayerNorm::new(4, 1e-5);
        let y = ln.forward(&input()).unwrap().data();
        for row in y.to_vec().chunks(4) {
            let mean: f32 = row.iter().sum::<f32>() / 4.0;
            let var: f32 = row.iter().map(|v| (v - mean).powi(2)).sum::<f32>() / 4.0;
            assert_abs_diff_eq!(mean, 0.0, epsilon = 1e-5);
            assert_abs_diff_eq!(var, 1.0, epsilon = 1e-3);
        }
    }

    #[test]
    fn test_layer_norm_params_are_norm_kind() {
        let ln = LayerNorm::new(3, 1e-5);
        assert!(ln.params().iter().all(|p| p.is_norm()));
    }

    #[test]
    fn test_layer_norm_input_grad_sums_to_zero() {
        // Shifting a row by a constant does not change the output, so the
        // input gradient of each row sums to zero.
        let mut ln = LayerNorm::new(4, 1e-5);
        ln.forward(&input()).unwrap();
        let g = Tensor::from_shape_vec(vec![2, 4], vec![0.3, -1.0, 2.0, 0.7, 1.0, 0.0, -0.5, 0.25], false)
            .unwrap();
        let gx = ln.backward(&g).unwrap().data();
        for row in gx.to_vec().chunks(4) {
            assert_abs_diff_eq!(row.iter().sum::<f32>(), 0.0, epsilon = 1e-4);
        }
        assert_eq!(ln.params()[1].tensor.grad().unwrap().len(), 4);
    }

    #[test]
    fn test_layer_norm_gradient_matches_finite_difference() {
        let mut ln = LayerNorm::new(4, 1e-5);
        let x = input();
        let weights = [0.5_f32, -1.0, 2.0, 1.5, -0.25, 1.0, 0.75, -2.0];
        let objective = |ln: &mut LayerNorm, x: &Tensor| -> f32 {
            let y = ln.forward(x).unwrap().data();
            y.iter().zip(weights.iter()).map(|(a, b)| a * b).sum()
        };

        ln.forward(&x).unwrap();
        let g = Tensor::from_shape_vec(vec![2, 4], weights.to_vec(), false).unwrap();
        let analytic = ln.backward(&g).unwrap().data();

        let h = 1e-2;
        let base = x.data();
        for i in 0..base.len() {
            let mut plus = base.clone();
            plus[i] += h;
            let mut minus = base.clone();
            minus[i] -= h;
            let xp = Tensor::from_shape_vec(vec![2, 4], plus.to_vec(), false).unwrap();
            let xm = Tensor::from_shape_vec(vec![2, 4], minus.to_vec(), false).unwrap();
            let numeric = (objective(&mut ln, &xp) - objective(&mut ln, &xm)) / (2.0 * h);
            assert_abs_diff_eq!(analytic[i], numeric, epsilon = 5e-2);
        }
    }
}
