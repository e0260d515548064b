//! Trainer abstraction for training loops
//!
//! This module provides a high-level `Trainer` that orchestrates the training loop:
//! - Single training steps with the full hook sequence
//! - Multi-epoch training with callbacks
//! - Validation
//! - Switching a model into and out of mixed precision
//!
//! # Example
//!
//! ```no_run
//! use mixtrain::nn::Linear;
//! use mixtrain::optim::AdamW;
//! use mixtrain::train::{EarlyStopping, MSELoss, TrainConfig, Trainer};
//!
//! let model = Linear::new(8, 1, &mut rand::rng());
//! let mut trainer = Trainer::new(Box::new(model), Box::new(AdamW::default_params(1e-3)), TrainConfig::default());
//! trainer.set_loss(Box::new(MSELoss));
//! trainer.add_callback(EarlyStopping::new(5, 0.001));
//! ```

#![allow(clippy::field_reassign_with_default)]

mod core;
mod result;
mod step;
mod train_loop;

pub use core::Trainer;
pub use result::TrainResult;
