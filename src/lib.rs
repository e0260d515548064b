//! mixtrain: mixed-precision training with dynamic loss scaling
//!
//! Models run their forward and backward passes in fp16 or bf16 while an
//! fp32 master copy of the weights receives the optimizer updates. The
//! pieces:
//!
//! - [`autograd`]: precision-tagged tensors, the loss scaler, the master copy
//!   and model precision conversion
//! - [`nn`]: small layers with hand-written backward passes
//! - [`optim`]: SGD and AdamW over parameter tensors
//! - [`train`]: the trainer, its hook dispatcher and the mixed-precision
//!   callback
//! - [`config`]: YAML training specs and CLI arguments
//!
//! # Example
//!
//! ```no_run
//! use mixtrain::autograd::MixedPrecisionConfig;
//! use mixtrain::config::{build_data, build_model, load_config};
//! use mixtrain::optim::SGD;
//! use mixtrain::train::{MSELoss, TrainConfig, Trainer};
//!
//! let spec = load_config("train.yaml")?;
//! let data = build_data(&spec.data)?;
//! let model = build_model(&spec.model);
//!
//! let mut trainer = Trainer::new(Box::new(model), Box::new(SGD::new(0.01, 0.9)), TrainConfig::new());
//! trainer.set_loss(Box::new(MSELoss));
//! trainer.to_fp16(MixedPrecisionConfig::fp16());
//! let result = trainer.fit(10, &data.train, Some(&data.val[..]))?;
//! println!("loss {:.4}, skipped {}", result.final_loss, result.skipped_steps);
//! # Ok::<(), mixtrain::Error>(())
//! ```

pub mod autograd;
pub mod cli;
pub mod config;
pub mod error;
pub mod nn;
pub mod optim;
pub mod train;

pub use autograd::{Precision, Tensor};
pub use error::{Error, Result};
