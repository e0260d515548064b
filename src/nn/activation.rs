//! Element-wise activations

use ndarray::Array1;

use super::{Module, Param};
use crate::autograd::Buffer;
use crate::error::{Error, Result};
use crate::Tensor;

/// Rectified linear unit
///
/// Output keeps the precision of the input.
#[derive(Default)]
pub struct Relu {
    mask: Option<(Array1<f32>, Vec<usize>)>,
}

impl Relu {
    /// Create a ReLU layer
    pub fn new() -> Self {
        Self::default()
    }
}

impl Module for Relu {
    fn forward(&mut self, input: &Tensor) -> Result<Tensor> {
        let x = input.data();
        let mask = x.mapv(|v| if v > 0.0 { 1.0 } else { 0.0 });
        let y = &x * &mask;
        self.mask = Some((mask, input.shape().to_vec()));
        Tensor::from_buffer(Buffer::from_f32(y, input.precision()), input.shape().to_vec(), false)
    }

    fn backward(&mut self, grad_output: &Tensor) -> Result<Tensor> {
        let (mask, shape) = self.mask.take().ok_or_else(|| Error::MissingState {
            what: "relu mask".into(),
            hint: "call forward before backward".into(),
        })?;
        if grad_output.len() != mask.len() {
            return Err(Error::shape("relu.backward", &shape, grad_output.shape()));
        }
        let g = grad_output.data() * &mask;
        Tensor::from_buffer(Buffer::from_f32(g, grad_output.precision()), shape, false)
    }

    fn params(&self) -> Vec<&Param> {
        Vec::new()
    }

    fn params_mut(&mut self) -> Vec<&mut Param> {
        Vec::new()
    }

    fn name(&self) -> &str {
        "ReLU"
    }
}
