//! Tensor with precision-tagged storage and an attached gradient

use ndarray::Array1;

use super::buffer::Buffer;
use super::precision::Precision;
use crate::error::{Error, Result};

/// Row-major tensor with optional gradient
///
/// The gradient always lives in the same precision as the data, which is
/// what makes reduced-precision gradients overflow.
#[derive(Clone, Debug)]
pub struct Tensor {
    data: Buffer,
    shape: Vec<usize>,
    grad: Option<Buffer>,
    requires_grad: bool,
}

impl Tensor {
    /// Create a 1-D fp32 tensor
    pub fn from_vec(values: Vec<f32>, requires_grad: bool) -> Self {
        let shape = vec![values.len()];
        Self { data: Buffer::F32(Array1::from(values)), shape, grad: None, requires_grad }
    }

    /// Create an fp32 tensor with an explicit shape
    pub fn from_shape_vec(shape: Vec<usize>, values: Vec<f32>, requires_grad: bool) -> Result<Self> {
        let numel: usize = shape.iter().product();
        if numel != values.len() {
            return Err(Error::shape("tensor.from_shape_vec", &shape, &[values.len()]));
        }
        Ok(Self { data: Buffer::F32(Array1::from(values)), shape, grad: None, requires_grad })
    }

    /// Create a tensor from existing storage
    pub fn from_buffer(data: Buffer, shape: Vec<usize>, requires_grad: bool) -> Result<Self> {
        let numel: usize = shape.iter().product();
        if numel != data.len() {
            return Err(Error::shape("tensor.from_buffer", &shape, &[data.len()]));
        }
        Ok(Self { data, shape, grad: None, requires_grad })
    }

    /// Zero-filled 1-D fp32 tensor
    pub fn zeros(len: usize, requires_grad: bool) -> Self {
        Self { data: Buffer::zeros(len, Precision::Fp32), shape: vec![len], grad: None, requires_grad }
    }

    /// Shape of the tensor
    pub fn shape(&self) -> &[usize] {
        &self.shape
    }

    /// Number of elements
    pub fn len(&self) -> usize {
        self.data.len()
    }

    /// Whether the tensor holds no elements
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Whether gradients are tracked for this tensor
    pub fn requires_grad(&self) -> bool {
        self.requires_grad
    }

    /// Storage precision
    pub fn precision(&self) -> Precision {
        self.data.precision()
    }

    /// Raw storage
    pub fn buffer(&self) -> &Buffer {
        &self.data
    }

    /// Values widened to f32
    pub fn data(&self) -> Array1<f32> {
        self.data.to_f32()
    }

    /// Overwrite the values, rounding to this tensor's precision
    pub fn set_data(&mut self, values: Array1<f32>) -> Result<()> {
        if values.len() != self.len() {
            return Err(Error::shape("tensor.set_data", &[self.len()], &[values.len()]));
        }
        self.data = Buffer::from_f32(values, self.precision());
        Ok(())
    }

    /// Apply an in-place f32 update to the values
    pub fn update_data<F>(&mut self, f: F)
    where
        F: FnOnce(&mut Array1<f32>),
    {
        self.data.update_f32(f);
    }

    /// Copy in a different precision; the gradient is cast along
    pub fn cast(&self, precision: Precision) -> Tensor {
        Tensor {
            data: self.data.cast(precision),
            shape: self.shape.clone(),
            grad: self.grad.as_ref().map(|g| g.cast(precision)),
            requires_grad: self.requires_grad,
        }
    }

    /// Convert storage and gradient in place
    pub fn cast_(&mut self, precision: Precision) {
        if self.precision() == precision {
            return;
        }
        self.data = self.data.cast(precision);
        if let Some(grad) = self.grad.take() {
            self.grad = Some(grad.cast(precision));
        }
    }

    /// Gradient widened to f32
    pub fn grad(&self) -> Option<Array1<f32>> {
        self.grad.as_ref().map(Buffer::to_f32)
    }

    /// Gradient storage
    pub fn grad_buffer(&self) -> Option<&Buffer> {
        self.grad.as_ref()
    }

    /// Replace the gradient, storing it in this tensor's precision
    pub fn set_grad(&mut self, grad: Array1<f32>) {
        self.grad = Some(Buffer::from_f32(grad, self.precision()));
    }

    /// Add to the gradient in this tensor's precision
    pub fn accumulate_grad(&mut self, grad: &Array1<f32>) -> Result<()> {
        if grad.len() != self.len() {
            return Err(Error::shape("tensor.accumulate_grad", &[self.len()], &[grad.len()]));
        }
        match self.grad.as_mut() {
            Some(existing) => existing.update_f32(|g| *g += grad),
            None => self.set_grad(grad.clone()),
        }
        Ok(())
    }

    /// Drop the gradient
    pub fn zero_grad(&mut self) {
        self.grad = None;
    }

    /// True if the gradient contains inf or NaN
    pub fn grad_has_non_finite(&self) -> bool {
        self.grad.as_ref().is_some_and(Buffer::has_non_finite)
    }

    /// Bytes held by values and gradient
    pub fn size_bytes(&self) -> usize {
        self.data.size_bytes() + self.grad.as_ref().map_or(0, Buffer::size_bytes)
    }
}
