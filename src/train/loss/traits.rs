//! Loss function trait and the loss value it produces

use ndarray::Array1;

use crate::error::Result;
use crate::Tensor;

/// Scalar loss together with its gradient w.r.t. the predictions
#[derive(Debug, Clone, PartialEq)]
pub struct Loss {
    /// Reduced loss value
    pub value: f32,
    /// dL/d(predictions), flattened row-major
    pub grad: Array1<f32>,
}

impl Loss {
    /// Create a loss from its value and gradient
    pub fn new(value: f32, grad: Array1<f32>) -> Self {
        Self { value, grad }
    }

    /// Multiply value and gradient by `factor`
    ///
    /// The scaled gradient is exactly the gradient of the scaled loss.
    pub fn scale(&mut self, factor: f32) {
        self.value *= factor;
        self.grad.mapv_inplace(|g| g * factor);
    }

    /// Whether the loss value is finite
    pub fn is_finite(&self) -> bool {
        self.value.is_finite()
    }
}

/// Trait for loss functions
pub trait LossFn: Send {
    /// Compute loss given predictions and targets
    ///
    /// Arithmetic runs in f32 whatever the storage precision of the inputs.
    fn forward(&self, predictions: &Tensor, targets: &Tensor) -> Result<Loss>;

    /// Name of the loss function
    fn name(&self) -> &str;
}
