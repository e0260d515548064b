//! Cross Entropy Loss for classification

use ndarray::{Array1, Axis};

use crate::error::{Error, Result};
use crate::Tensor;

use super::{Loss, LossFn};

/// Cross Entropy Loss (for classification)
///
/// Predictions are `[batch, classes]` logits and targets are the matching
/// one-hot (or probability) rows. The loss is the batch mean of
/// `-sum(targets * log(softmax(logits)))`.
#[derive(Debug, Clone, Copy, Default)]
pub struct CrossEntropyLoss;

impl CrossEntropyLoss {
    /// Compute softmax: exp(x_i) / sum(exp(x_j))
    pub(crate) fn softmax(x: &Array1<f32>) -> Array1<f32> {
        let max = x.iter().fold(f32::NEG_INFINITY, |a, &b| a.max(b));
        let exp_x: Array1<f32> = x.mapv(|v| (v - max).exp());
        let sum: f32 = exp_x.sum();
        exp_x / sum
    }
}

impl LossFn for CrossEntropyLoss {
    fn forward(&self, predictions: &Tensor, targets: &Tensor) -> Result<Loss> {
        if predictions.len() != targets.len() {
            return Err(Error::shape("cross_entropy.forward", predictions.shape(), targets.shape()));
        }
        let classes = match predictions.shape() {
            [_, classes] => *classes,
            [classes] => *classes,
            other => return Err(Error::shape("cross_entropy.forward", &[0, 0], other)),
        };
        let rows = if classes == 0 { 0 } else { predictions.len() / classes };
        if rows == 0 {
            return Ok(Loss::new(0.0, predictions.data()));
        }

        let logits = predictions
            .data()
            .into_shape_with_order((rows, classes))
            .map_err(|_| Error::shape("cross_entropy.forward", &[rows, classes], predictions.shape()))?;
        let target = targets
            .data()
            .into_shape_with_order((rows, classes))
            .map_err(|_| Error::shape("cross_entropy.forward", &[rows, classes], targets.shape()))?;

        let mut total = 0.0;
        let mut grad = Vec::with_capacity(predictions.len());
        for (row, target_row) in logits.axis_iter(Axis(0)).zip(target.axis_iter(Axis(0))) {
            let probs = Self::softmax(&row.to_owned());
            total += target_row
                .iter()
                .zip(probs.iter())
                .map(|(&t, &p)| -t * (p + 1e-10).max(f32::MIN_POSITIVE).ln())
                .sum::<f32>();
            // d(CE)/d(logits) = probs - targets, averaged over the batch
            grad.extend(probs.iter().zip(target_row.iter()).map(|(&p, &t)| (p - t) / rows as f32));
        }

        Ok(Loss::new(total / rows as f32, Array1::from(grad)))
    }

    fn name(&self) -> &str {
        "CrossEntropy"
    }
}
