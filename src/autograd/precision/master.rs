//! Full-precision master copy of the trainable parameters.

use ndarray::{s, Array1};

use super::Precision;
use crate::error::{Error, Result};
use crate::nn::Module;
use crate::Tensor;

/// fp32 copies of a model's trainable parameters
///
/// The optimizer steps these instead of the reduced-precision model
/// weights. In the flat layout every parameter is packed, in model order,
/// into a single tensor; `sizes` records how to split it again.
#[derive(Debug, Clone)]
pub struct MasterParams {
    tensors: Vec<Tensor>,
    sizes: Vec<usize>,
    flat: bool,
}

impl MasterParams {
    /// Copy every trainable parameter of `model` into fp32
    pub fn from_model(model: &dyn Module, flat: bool) -> Self {
        let trainable: Vec<Array1<f32>> = model
            .params()
            .into_iter()
            .filter(|p| p.is_trainable())
            .map(|p| p.tensor.data())
            .collect();
        let sizes: Vec<usize> = trainable.iter().map(Array1::len).collect();

        let tensors = if flat {
            let packed: Vec<f32> = trainable.iter().flat_map(|a| a.iter().copied()).collect();
            vec![Tensor::from_vec(packed, true)]
        } else {
            trainable.into_iter().map(|a| Tensor::from_vec(a.to_vec(), true)).collect()
        };

        Self { tensors, sizes, flat }
    }

    /// Whether parameters are packed into one tensor
    pub fn is_flat(&self) -> bool {
        self.flat
    }

    /// Master tensors the optimizer steps
    pub fn tensors(&self) -> &[Tensor] {
        &self.tensors
    }

    /// Mutable master tensors
    pub fn tensors_mut(&mut self) -> &mut [Tensor] {
        &mut self.tensors
    }

    /// Number of model parameters mirrored
    pub fn num_mirrored(&self) -> usize {
        self.sizes.len()
    }

    /// Total mirrored elements
    pub fn num_elements(&self) -> usize {
        self.sizes.iter().sum()
    }

    /// Bytes held by master values and gradients
    pub fn size_bytes(&self) -> usize {
        self.tensors.iter().map(Tensor::size_bytes).sum()
    }

    /// Copy model gradients into the master gradients as fp32
    ///
    /// A parameter with no gradient contributes zeros.
    pub fn copy_grads_from(&mut self, model: &dyn Module) -> Result<()> {
        let grads: Vec<Array1<f32>> = model
            .params()
            .into_iter()
            .filter(|p| p.is_trainable())
            .map(|p| p.tensor.grad().unwrap_or_else(|| Array1::zeros(p.tensor.len())))
            .collect();
        self.check_layout(grads.iter().map(Array1::len))?;

        if self.flat {
            let packed: Array1<f32> = grads.iter().flat_map(|g| g.iter().copied()).collect();
            self.tensors[0].set_grad(packed);
        } else {
            for (master, grad) in self.tensors.iter_mut().zip(grads) {
                master.set_grad(grad);
            }
        }
        Ok(())
    }

    /// Divide every master gradient by the loss scale
    pub fn unscale_grads(&mut self, scale: f32) {
        let inv_scale = 1.0 / scale;
        for master in &mut self.tensors {
            if let Some(grad) = master.grad() {
                master.set_grad(grad * inv_scale);
            }
        }
    }

    /// Write master values into the model, rounding to each parameter's precision
    pub fn copy_into(&self, model: &mut dyn Module) -> Result<()> {
        let mut params: Vec<_> = model.params_mut().into_iter().filter(|p| p.is_trainable()).collect();
        self.check_layout(params.iter().map(|p| p.tensor.len()))?;

        if self.flat {
            let packed = self.tensors[0].data();
            let mut offset = 0;
            for (p, &len) in params.iter_mut().zip(&self.sizes) {
                p.tensor.set_data(packed.slice(s![offset..offset + len]).to_owned())?;
                offset += len;
            }
        } else {
            for (p, master) in params.iter_mut().zip(&self.tensors) {
                p.tensor.set_data(master.data())?;
            }
        }
        Ok(())
    }

    /// Drop master gradients
    pub fn zero_grad(&mut self) {
        for master in &mut self.tensors {
            master.zero_grad();
        }
    }

    /// Master values of the `index`-th mirrored parameter
    pub fn values(&self, index: usize) -> Option<Array1<f32>> {
        if index >= self.sizes.len() {
            return None;
        }
        if self.flat {
            let offset: usize = self.sizes[..index].iter().sum();
            let len = self.sizes[index];
            Some(self.tensors[0].data().slice(s![offset..offset + len]).to_owned())
        } else {
            Some(self.tensors[index].data())
        }
    }

    /// Precision of the master storage
    pub fn precision(&self) -> Precision {
        self.tensors.first().map_or(Precision::Fp32, Tensor::precision)
    }

    fn check_layout(&self, lens: impl Iterator<Item = usize>) -> Result<()> {
        let lens: Vec<usize> = lens.collect();
        if lens != self.sizes {
            return Err(Error::LayoutMismatch {
                message: format!("master sizes {:?}, model sizes {:?}", self.sizes, lens),
            });
        }
        Ok(())
    }
}
