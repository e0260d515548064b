//! Optimizer trait

use crate::Tensor;

/// Trait for optimization algorithms
///
/// Per-parameter state is indexed by position, so callers must pass
/// parameters in the same order on every step until [`Optimizer::reset_state`].
pub trait Optimizer: Send {
    /// Perform a single optimization step on parameters that have gradients
    fn step(&mut self, params: &mut [&mut Tensor]);

    /// Zero out all gradients
    fn zero_grad(&mut self, params: &mut [&mut Tensor]) {
        for param in params.iter_mut() {
            param.zero_grad();
        }
    }

    /// Forget per-parameter state (moments, velocities, step count)
    ///
    /// Called when the set of stepped parameters changes, e.g. when a master
    /// copy is installed.
    fn reset_state(&mut self) {}

    /// Get learning rate
    fn lr(&self) -> f32;

    /// Set learning rate
    fn set_lr(&mut self, lr: f32);

    /// Optimizer name for logging
    fn name(&self) -> &'static str;
}
