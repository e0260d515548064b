//! Callback system for training events
//!
//! Provides extensible hooks for training loop events:
//! - `on_train_begin` / `on_train_end`
//! - `on_epoch_begin` / `on_epoch_end`
//! - `on_batch_begin` / `on_batch_end`
//! - `on_loss_begin`, `on_backward_begin`, `on_backward_end`, `on_step_end`
//! - `on_validation`
//!
//! # Example
//!
//! ```rust
//! use mixtrain::train::callback::{TrainerCallback, CallbackContext, CallbackAction};
//!
//! struct PrintCallback;
//!
//! impl TrainerCallback for PrintCallback {
//!     fn on_epoch_end(&mut self, ctx: &CallbackContext) -> CallbackAction {
//!         println!("Epoch {} finished with loss {:.4}", ctx.epoch, ctx.loss);
//!         CallbackAction::Continue
//!     }
//! }
//! ```

#![allow(clippy::field_reassign_with_default)]

mod early_stopping;
mod manager;
mod mixed_precision;
mod progress;
mod traits;

pub use early_stopping::EarlyStopping;
pub use manager::CallbackManager;
pub use mixed_precision::MixedPrecisionCallback;
pub use progress::ProgressCallback;
pub use traits::{CallbackAction, CallbackContext, TrainState, TrainerCallback};
