//! Batch data structure

use crate::Tensor;

/// A training batch containing inputs and targets
#[derive(Clone, Debug)]
pub struct Batch {
    /// Input features, `[rows, features]`
    pub inputs: Tensor,
    /// Target values, `[rows, outputs]`
    pub targets: Tensor,
}

impl Batch {
    /// Create a new batch
    pub fn new(inputs: Tensor, targets: Tensor) -> Self {
        Self { inputs, targets }
    }

    /// Number of samples (rows of the input)
    pub fn size(&self) -> usize {
        self.inputs.shape().first().copied().unwrap_or(0)
    }
}
