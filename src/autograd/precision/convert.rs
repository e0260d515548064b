//! Switching model parameters between compute and accumulation precision.

use super::{MasterParams, Precision};
use crate::error::Result;
use crate::nn::Module;

/// Convert parameters to `precision`
///
/// With `keep_norm_fp32` set, normalization-layer parameters stay in fp32:
/// their statistics are too sensitive for half precision. Returns the number
/// of parameters whose storage changed.
pub fn convert_model(model: &mut dyn Module, precision: Precision, keep_norm_fp32: bool) -> usize {
    let mut converted = 0;
    for p in model.params_mut() {
        let target = if keep_norm_fp32 && p.is_norm() { Precision::Fp32 } else { precision };
        if p.tensor.precision() != target {
            p.tensor.cast_(target);
            converted += 1;
        }
    }
    converted
}

/// True if any model gradient holds inf or NaN
pub fn grads_overflow(model: &dyn Module) -> bool {
    model.params().iter().any(|p| p.tensor.grad_has_non_finite())
}

/// Return every parameter to fp32, loading the exact master values
///
/// Going through the master copy instead of widening the reduced values
/// keeps the low-order bits the optimizer accumulated.
pub fn restore_model(model: &mut dyn Module, master: &MasterParams) -> Result<()> {
    convert_model(model, Precision::Fp32, false);
    master.copy_into(model)
}

/// Parameter counts per precision, for summaries
pub fn precision_census(model: &dyn Module) -> Vec<(Precision, usize)> {
    let mut census: Vec<(Precision, usize)> = Vec::new();
    for p in model.params() {
        let precision = p.tensor.precision();
        match census.iter_mut().find(|(q, _)| *q == precision) {
            Some((_, n)) => *n += p.tensor.len(),
            None => census.push((precision, p.tensor.len())),
        }
    }
    census
}
