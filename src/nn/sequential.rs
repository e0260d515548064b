//! Ordered container of layers

use super::{Module, Param};
use crate::error::Result;
use crate::Tensor;

/// Runs layers in order; backward runs them in reverse
///
/// Parameter names are prefixed with the layer index, e.g. `2.weight`.
#[derive(Default)]
pub struct Sequential {
    layers: Vec<Box<dyn Module>>,
}

impl Sequential {
    /// Create an empty container
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a layer
    pub fn push<M: Module + 'static>(&mut self, layer: M) {
        self.push_boxed(Box::new(layer));
    }

    /// Append a boxed layer
    pub fn push_boxed(&mut self, mut layer: Box<dyn Module>) {
        let index = self.layers.len();
        for p in layer.params_mut() {
            p.name = format!("{index}.{}", p.name);
        }
        self.layers.push(layer);
    }

    /// Builder form of [`Sequential::push`]
    pub fn with<M: Module + 'static>(mut self, layer: M) -> Self {
        self.push(layer);
        self
    }

    /// Number of layers
    pub fn len(&self) -> usize {
        self.layers.len()
    }

    /// Whether the container has no layers
    pub fn is_empty(&self) -> bool {
        self.layers.is_empty()
    }

    /// Layers in order
    pub fn layers(&self) -> &[Box<dyn Module>] {
        &self.layers
    }
}

impl Module for Sequential {
    fn forward(&mut self, input: &Tensor) -> Result<Tensor> {
        let mut x = input.clone();
        for layer in &mut self.layers {
            x = layer.forward(&x)?;
        }
        Ok(x)
    }

    fn backward(&mut self, grad_output: &Tensor) -> Result<Tensor> {
        let mut g = grad_output.clone();
        for layer in self.layers.iter_mut().rev() {
            g = layer.backward(&g)?;
        }
        Ok(g)
    }

    fn params(&self) -> Vec<&Param> {
        self.layers.iter().flat_map(|l| l.params()).collect()
    }

    fn params_mut(&mut self) -> Vec<&mut Param> {
        self.layers.iter_mut().flat_map(|l| l.params_mut()).collect()
    }

    fn name(&self) -> &str {
        "Sequential"
    }

    fn out_features(&self) -> Option<usize> {
        self.layers.iter().rev().find_map(|l| l.out_features())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::nn::{LayerNorm, Linear, Relu};
    use rand::SeedableRng;

    fn model() -> Sequential {
        let mut rng = rand::rngs::StdRng::seed_from_u64(1);
        Sequential::new()
            .with(Linear::new(3, 4, &mut rng))
            .with(LayerNorm::new(4, 1e-5))
            .with(Relu::new())
            .with(Linear::new(4, 1, &mut rng))
    }

    #[test]
    fn test_sequential_param_names_are_prefixed() {
        let m = model();
        let names: Vec<&str> = m.params().iter().map(|p| p.name.as_str()).collect();
        assert_eq!(names, ["0.weight", "0.bias", "1.gamma", "1.beta", "3.weight", "3.bias"]);
        assert_eq!(m.num_params(), 3 * 4 + 4 + 4 + 4 + 4 + 1);
        assert_eq!(m.out_features(), Some(1));
    }

    #[test]
    fn test_sequential_forward_backward_shapes() {
        let mut m = model();
        let x = Tensor::from_shape_vec(vec![5, 3], (0..15).map(|v| v as f32 * 0.1).collect(), false)
            .unwrap();
        let y = m.forward(&x).unwrap();
        assert_eq!(y.shape(), &[5, 1]);

        let g = Tensor::from_shape_vec(vec![5, 1], vec![1.0; 5], false).unwrap();
        let gx = m.backward(&g).unwrap();
        assert_eq!(gx.shape(), &[5, 3]);
        assert!(m.params().iter().all(|p| p.tensor.grad().is_some()));

        m.zero_grad();
        assert!(m.params().iter().all(|p| p.tensor.grad().is_none()));
    }
}
