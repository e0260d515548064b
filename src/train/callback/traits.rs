//! Core traits and types for the callback system
//!
//! - `CallbackContext` - Metrics passed to every callback
//! - `TrainState` - Mutable view of the model, optimizer and master copy
//! - `CallbackAction` - Actions a callback can request
//! - `TrainerCallback` - The trait all callbacks implement

use crate::autograd::MasterParams;
use crate::error::Result;
use crate::nn::Module;
use crate::optim::Optimizer;
use crate::train::{Batch, Loss};
use crate::Tensor;

/// Context passed to callbacks with current training state
#[derive(Clone, Debug, Default)]
pub struct CallbackContext {
    /// Current epoch (0-indexed)
    pub epoch: usize,
    /// Total epochs planned
    pub max_epochs: usize,
    /// Current step within epoch
    pub step: usize,
    /// Total steps in epoch
    pub steps_per_epoch: usize,
    /// Global step count
    pub global_step: usize,
    /// Current (unscaled) loss value
    pub loss: f32,
    /// Current learning rate
    pub lr: f32,
    /// Best loss seen so far
    pub best_loss: Option<f32>,
    /// Validation loss (if available)
    pub val_loss: Option<f32>,
    /// Training duration in seconds
    pub elapsed_secs: f64,
    /// Set before `on_step_end` when the optimizer update was dropped
    pub step_skipped: bool,
}

/// Everything a callback may change while a step is in flight
///
/// `master` is the fp32 copy the optimizer updates when installed; with
/// `None` the optimizer updates the model parameters directly.
pub struct TrainState<'a> {
    /// Metrics for the current step
    pub ctx: CallbackContext,
    /// Model being trained
    pub model: &'a mut dyn Module,
    /// Optimizer driving the update
    pub optimizer: &'a mut dyn Optimizer,
    /// Installed master parameters
    pub master: &'a mut Option<MasterParams>,
}

/// Action to take after a callback
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CallbackAction {
    /// Continue training normally
    Continue,
    /// Stop training (early stopping)
    Stop,
    /// Skip rest of current epoch
    SkipEpoch,
    /// Drop the optimizer update for the current step
    SkipStep,
}

/// Trait for training callbacks
///
/// Implement this trait to hook into training events. All methods have
/// default no-op implementations, so you only need to implement the
/// events you care about.
///
/// Hooks that only observe metrics receive a [`CallbackContext`]. Hooks
/// that run inside a step receive the [`TrainState`] and may fail.
pub trait TrainerCallback: Send {
    /// Called before training starts
    fn on_train_begin(&mut self, _state: &mut TrainState<'_>) -> Result<CallbackAction> {
        Ok(CallbackAction::Continue)
    }

    /// Called after training ends
    fn on_train_end(&mut self, _state: &mut TrainState<'_>) -> Result<()> {
        Ok(())
    }

    /// Called before each epoch
    fn on_epoch_begin(&mut self, _ctx: &CallbackContext) -> CallbackAction {
        CallbackAction::Continue
    }

    /// Called after each epoch
    fn on_epoch_end(&mut self, _ctx: &CallbackContext) -> CallbackAction {
        CallbackAction::Continue
    }

    /// Called with the batch before the forward pass
    fn on_batch_begin(
        &mut self,
        _state: &mut TrainState<'_>,
        _batch: &mut Batch,
    ) -> Result<CallbackAction> {
        Ok(CallbackAction::Continue)
    }

    /// Called with the model output before the loss is computed
    fn on_loss_begin(&mut self, _state: &mut TrainState<'_>, _output: &mut Tensor) -> Result<()> {
        Ok(())
    }

    /// Called with the loss before the backward pass
    fn on_backward_begin(&mut self, _state: &mut TrainState<'_>, _loss: &mut Loss) -> Result<()> {
        Ok(())
    }

    /// Called after gradients are computed, before the optimizer step
    ///
    /// Returning [`CallbackAction::SkipStep`] drops the update.
    fn on_backward_end(&mut self, _state: &mut TrainState<'_>) -> Result<CallbackAction> {
        Ok(CallbackAction::Continue)
    }

    /// Called after the optimizer step (also for skipped steps)
    fn on_step_end(&mut self, _state: &mut TrainState<'_>) -> Result<CallbackAction> {
        Ok(CallbackAction::Continue)
    }

    /// Called after each batch with its unscaled loss
    fn on_batch_end(&mut self, _ctx: &CallbackContext) -> CallbackAction {
        CallbackAction::Continue
    }

    /// Called when validation is performed
    fn on_validation(&mut self, _ctx: &CallbackContext) -> CallbackAction {
        CallbackAction::Continue
    }

    /// Dispatch order; lower runs first
    fn order(&self) -> i32 {
        0
    }

    /// Get callback name for logging
    fn name(&self) -> &'static str {
        "TrainerCallback"
    }
}
