//! High-level training loop
//!
//! This module provides the training framework the mixed-precision
//! callback plugs into:
//! - Loss functions (MSE, Cross-Entropy) that return their gradient
//! - A callback system with per-stage hooks
//! - Trainer abstraction
//! - Training configuration and metrics tracking
//!
//! # Example
//!
//! ```no_run
//! use mixtrain::autograd::MixedPrecisionConfig;
//! use mixtrain::nn::Linear;
//! use mixtrain::optim::SGD;
//! use mixtrain::train::{Batch, MSELoss, TrainConfig, Trainer};
//!
//! let model = Linear::new(4, 1, &mut rand::rng());
//! let mut trainer = Trainer::new(Box::new(model), Box::new(SGD::new(0.01, 0.0)), TrainConfig::default());
//! trainer.set_loss(Box::new(MSELoss));
//! trainer.to_fp16(MixedPrecisionConfig::fp16());
//!
//! let batches: Vec<Batch> = vec![];
//! let result = trainer.fit(10, &batches, None).unwrap();
//! println!("loss={:.4}, skipped={}", result.final_loss, result.skipped_steps);
//! ```

mod batch;
pub mod callback;
mod config;
mod loss;
mod trainer;

pub use batch::Batch;
pub use callback::{
    CallbackAction, CallbackContext, CallbackManager, EarlyStopping, MixedPrecisionCallback,
    ProgressCallback, TrainState, TrainerCallback,
};
pub use config::{MetricsTracker, TrainConfig};
pub use loss::{CrossEntropyLoss, Loss, LossFn, MSELoss};
pub use trainer::{TrainResult, Trainer};
