//! Layers with hand-written backward passes
//!
//! Just enough of a model zoo to drive a training loop: every layer caches
//! what its backward pass needs during `forward` and accumulates parameter
//! gradients during `backward`. Arithmetic runs in f32 on values that were
//! rounded to each layer's parameter precision.

mod activation;
mod linear;
mod norm;
mod sequential;

pub use activation::Relu;
pub use linear::Linear;
pub use norm::LayerNorm;
pub use sequential::Sequential;

use crate::error::{Error, Result};
use crate::Tensor;
use ndarray::Array2;

/// What a parameter is used for
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParamKind {
    /// Dense weight matrix
    Weight,
    /// Additive bias
    Bias,
    /// Normalization scale or shift
    Norm,
}

/// Named trainable tensor owned by a layer
#[derive(Debug, Clone)]
pub struct Param {
    /// Dotted path, e.g. `0.weight`
    pub name: String,
    /// Role of the parameter
    pub kind: ParamKind,
    /// Values and gradient
    pub tensor: Tensor,
}

impl Param {
    /// Create a parameter
    pub fn new(name: impl Into<String>, kind: ParamKind, tensor: Tensor) -> Self {
        Self { name: name.into(), kind, tensor }
    }

    /// Whether the parameter belongs to a normalization layer
    pub fn is_norm(&self) -> bool {
        self.kind == ParamKind::Norm
    }

    /// Whether the optimizer should update this parameter
    pub fn is_trainable(&self) -> bool {
        self.tensor.requires_grad()
    }
}

/// A differentiable layer
pub trait Module: Send {
    /// Compute the output and cache what `backward` needs
    fn forward(&mut self, input: &Tensor) -> Result<Tensor>;

    /// Accumulate parameter gradients and return the gradient w.r.t. the input
    fn backward(&mut self, grad_output: &Tensor) -> Result<Tensor>;

    /// Parameters in a stable order
    fn params(&self) -> Vec<&Param>;

    /// Mutable parameters in the same order as [`Module::params`]
    fn params_mut(&mut self) -> Vec<&mut Param>;

    /// Layer name for summaries
    fn name(&self) -> &str;

    /// Total parameter elements
    fn num_params(&self) -> usize {
        self.params().iter().map(|p| p.tensor.len()).sum()
    }

    /// Width of the output rows, if the layer fixes it
    fn out_features(&self) -> Option<usize> {
        None
    }

    /// Drop all parameter gradients
    fn zero_grad(&mut self) {
        for p in self.params_mut() {
            p.tensor.zero_grad();
        }
    }
}

/// View a `[rows, cols]` tensor as a matrix, checking the column count
pub(crate) fn as_matrix(tensor: &Tensor, cols: usize, op: &str) -> Result<Array2<f32>> {
    let shape = tensor.shape();
    if shape.len() != 2 || shape[1] != cols {
        let rows = shape.first().copied().unwrap_or(0);
        return Err(Error::shape(op, &[rows, cols], shape));
    }
    Array2::from_shape_vec((shape[0], cols), tensor.data().to_vec())
        .map_err(|_| Error::shape(op, &[shape[0], cols], &[tensor.len()]))
}

/// Flatten a matrix row-major into a tensor of the given precision
pub(crate) fn from_matrix(
    matrix: &Array2<f32>,
    precision: crate::Precision,
    requires_grad: bool,
) -> Result<Tensor> {
    let shape = vec![matrix.nrows(), matrix.ncols()];
    let values = ndarray::Array1::from_iter(matrix.iter().copied());
    Tensor::from_buffer(crate::autograd::Buffer::from_f32(values, precision), shape, requires_grad)
}
