//! Tensor storage and mixed-precision primitives
//!
//! Tensors store their values in fp32, fp16 or bf16. Layers in [`crate::nn`]
//! hand-write their backward passes on top of these tensors; this module
//! only owns storage, precision conversion, loss scaling and the fp32 master
//! copy used during mixed-precision training.

mod buffer;
pub mod precision;
mod tensor;

pub use buffer::Buffer;
pub use precision::{
    bf16_to_f32, estimate_memory_savings, f32_to_bf16, f32_to_fp16, fp16_to_f32, GradScaler,
    MasterParams, MixedPrecisionConfig, Precision, ScaleUpdate,
};
pub use tensor::Tensor;
