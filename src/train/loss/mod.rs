//! Loss functions for training
//!
//! - [`MSELoss`] - Mean Squared Error for regression
//! - [`CrossEntropyLoss`] - For single-label classification tasks
//!
//! A loss returns its value together with the gradient w.r.t. the
//! predictions, so the trainer can scale it before running the backward pass.

mod cross_entropy;
mod mse;
mod traits;

pub use cross_entropy::CrossEntropyLoss;
pub use mse::MSELoss;
pub use traits::{Loss, LossFn};
