//! Optimizers for training neural networks
//!
//! Optimizers do not own parameters: the trainer hands them either the model
//! parameters or, during mixed-precision training, the fp32 master copy.

mod adamw;
mod clip;
mod optimizer;
mod sgd;

pub use adamw::AdamW;
pub use clip::{clip_grad_norm, global_grad_norm};
pub use optimizer::Optimizer;
pub use sgd::SGD;
