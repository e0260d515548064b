//! Precision conversion functions and memory estimation utilities.

use super::Precision;

/// Convert f32 to bf16 bits (round to nearest even)
///
/// BF16 uses the same exponent as f32 but only 7 mantissa bits.
pub fn f32_to_bf16(value: f32) -> u16 {
    half::bf16::from_f32(value).to_bits()
}

/// Convert bf16 bits to f32
pub fn bf16_to_f32(value: u16) -> f32 {
    half::bf16::from_bits(value).to_f32()
}

/// Convert f32 to fp16 bits (IEEE half precision)
///
/// Values beyond ±65504 become ±inf.
pub fn f32_to_fp16(value: f32) -> u16 {
    half::f16::from_f32(value).to_bits()
}

/// Convert fp16 bits to f32
pub fn fp16_to_f32(value: u16) -> f32 {
    half::f16::from_bits(value).to_f32()
}

/// Estimate memory savings from mixed precision
///
/// # Arguments
///
/// * `num_params` - Number of model parameters
/// * `num_activations` - Activation elements held per step (batch × widths)
/// * `precision` - Target compute precision
///
/// # Returns
///
/// Tuple of (fp32_bytes, mixed_bytes, savings_ratio)
pub fn estimate_memory_savings(
    num_params: usize,
    num_activations: usize,
    precision: Precision,
) -> (usize, usize, f32) {
    // FP32 memory: params + activations + gradients
    let param_bytes_fp32 = num_params * 4;
    let activation_bytes_fp32 = num_activations * 4;
    let grad_bytes_fp32 = num_params * 4;
    let total_fp32 = param_bytes_fp32 + activation_bytes_fp32 + grad_bytes_fp32;

    if !precision.is_reduced() {
        return (total_fp32, total_fp32, 0.0);
    }

    // Mixed: reduced model copy + fp32 master + reduced activations + reduced grads
    // + fp32 master grads
    let param_bytes_mixed = num_params * precision.size_bytes() + num_params * 4;
    let activation_bytes_mixed = num_activations * precision.size_bytes();
    let grad_bytes_mixed = num_params * precision.size_bytes() + num_params * 4;
    let total_mixed = param_bytes_mixed + activation_bytes_mixed + grad_bytes_mixed;

    let savings = 1.0 - (total_mixed as f32 / total_fp32 as f32);
    (total_fp32, total_mixed, savings)
}
