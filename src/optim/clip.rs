//! Gradient clipping utilities

use crate::Tensor;

/// Global L2 norm of all gradients
pub fn global_grad_norm(params: &[&mut Tensor]) -> f32 {
    params
        .iter()
        .filter_map(|p| p.grad())
        .map(|g| g.iter().map(|&v| v * v).sum::<f32>())
        .sum::<f32>()
        .sqrt()
}

/// Clip gradients by global norm
///
/// Computes the global norm of all gradients and scales them down if the norm
/// exceeds max_norm. This prevents exploding gradients while preserving the
/// relative magnitudes of gradients across parameters.
///
/// Algorithm:
/// 1. global_norm = sqrt(sum of all gradient squared norms)
/// 2. If global_norm > max_norm:
///    - clip_coef = max_norm / global_norm
///    - For each gradient: grad *= clip_coef
///
/// # Returns
/// The actual global norm before clipping
pub fn clip_grad_norm(params: &mut [&mut Tensor], max_norm: f32) -> f32 {
    let global_norm = global_grad_norm(params);

    if global_norm > max_norm {
        let clip_coef = max_norm / global_norm;
        for param in params.iter_mut() {
            if let Some(grad) = param.grad() {
                param.set_grad(grad * clip_coef);
            }
        }
    }

    global_norm
}
