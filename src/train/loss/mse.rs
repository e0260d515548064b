//! Mean Squared Error loss

use crate::error::{Error, Result};
use crate::Tensor;

use super::{Loss, LossFn};

/// Mean Squared Error Loss
///
/// L = mean((predictions - targets)^2)
///
/// # Example
///
/// ```
/// use mixtrain::train::{LossFn, MSELoss};
/// use mixtrain::Tensor;
///
/// let pred = Tensor::from_vec(vec![1.0, 2.0, 3.0], true);
/// let target = Tensor::from_vec(vec![1.5, 2.5, 3.5], false);
///
/// let loss = MSELoss.forward(&pred, &target).unwrap();
/// assert!((loss.value - 0.25).abs() < 1e-6);
/// ```
#[derive(Debug, Clone, Copy, Default)]
pub struct MSELoss;

impl LossFn for MSELoss {
    fn forward(&self, predictions: &Tensor, targets: &Tensor) -> Result<Loss> {
        if predictions.len() != targets.len() {
            return Err(Error::shape("mse.forward", predictions.shape(), targets.shape()));
        }
        if predictions.is_empty() {
            return Ok(Loss::new(0.0, predictions.data()));
        }

        let diff = predictions.data() - targets.data();
        let value = diff.mapv(|d| d * d).mean().unwrap_or(0.0);

        // d(MSE)/d(pred) = 2 * (pred - target) / n
        let n = predictions.len() as f32;
        let grad = diff * (2.0 / n);

        Ok(Loss::new(value, grad))
    }

    fn name(&self) -> &str {
        "MSE"
    }
}
