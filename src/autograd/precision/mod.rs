//! Mixed-precision training utilities
//!
//! Provides support for training with reduced precision (fp16/bf16) while
//! maintaining numerical stability through loss scaling and master weights.
//!
//! ## Overview
//!
//! Mixed-precision training uses lower precision (fp16/bf16) for:
//! - Forward pass activations (memory savings)
//! - Gradient computation (compute speedup)
//!
//! While maintaining full precision (fp32) for:
//! - Master weights (numerical stability)
//! - Normalization-layer parameters
//!
//! ## Example
//!
//! ```no_run
//! use mixtrain::autograd::precision::{convert_model, GradScaler, MasterParams, MixedPrecisionConfig};
//! use mixtrain::nn::{Linear, Module};
//! # fn main() -> mixtrain::Result<()> {
//! # let mut rng = rand::rng();
//! let mut model = Linear::new(4, 1, &mut rng);
//! let config = MixedPrecisionConfig::fp16();
//! let mut scaler = GradScaler::from_config(&config);
//!
//! convert_model(&mut model, config.compute_precision, config.keep_norm_fp32);
//! let mut master = MasterParams::from_model(&model, config.flat_master);
//!
//! // ... forward, scale the loss by scaler.scale(), backward ...
//! master.copy_grads_from(&model)?;
//! master.unscale_grads(scaler.scale());
//! // ... optimizer step on master.tensors_mut() ...
//! master.copy_into(&mut model)?;
//! scaler.update(true);
//! # Ok(())
//! # }
//! ```

mod config;
mod conversions;
mod convert;
mod master;
mod precision_types;
mod scaler;

#[cfg(test)]
mod tests;

pub use config::MixedPrecisionConfig;
pub use conversions::{
    bf16_to_f32, estimate_memory_savings, f32_to_bf16, f32_to_fp16, fp16_to_f32,
};
pub use convert::{convert_model, grads_overflow, precision_census, restore_model};
pub use master::MasterParams;
pub use precision_types::Precision;
pub use scaler::{GradScaler, ScaleUpdate};
