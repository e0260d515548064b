//! Callback manager for dispatching events to multiple callbacks

use super::traits::{CallbackAction, CallbackContext, TrainState, TrainerCallback};
use crate::error::Result;
use crate::train::{Batch, Loss};
use crate::Tensor;

/// Manages multiple callbacks and dispatches events
///
/// Callbacks run in ascending [`TrainerCallback::order`]; callbacks with the
/// same order run in registration order.
pub struct CallbackManager {
    callbacks: Vec<Box<dyn TrainerCallback>>,
}

impl CallbackManager {
    /// Create new callback manager
    pub fn new() -> Self {
        Self { callbacks: Vec::new() }
    }

    /// Add a callback
    pub fn add<C: TrainerCallback + 'static>(&mut self, callback: C) {
        self.add_boxed(Box::new(callback));
    }

    /// Add an already boxed callback
    pub fn add_boxed(&mut self, callback: Box<dyn TrainerCallback>) {
        let order = callback.order();
        let at = self.callbacks.partition_point(|cb| cb.order() <= order);
        self.callbacks.insert(at, callback);
    }

    /// Remove every callback with the given name; returns how many were removed
    pub fn remove(&mut self, name: &str) -> usize {
        let before = self.callbacks.len();
        self.callbacks.retain(|cb| cb.name() != name);
        before - self.callbacks.len()
    }

    /// Whether a callback with this name is registered
    pub fn contains(&self, name: &str) -> bool {
        self.callbacks.iter().any(|cb| cb.name() == name)
    }

    /// Registered callback names in dispatch order
    pub fn names(&self) -> Vec<&'static str> {
        self.callbacks.iter().map(|cb| cb.name()).collect()
    }

    /// Check if no callbacks are registered
    pub fn is_empty(&self) -> bool {
        self.callbacks.is_empty()
    }

    /// Get number of callbacks
    pub fn len(&self) -> usize {
        self.callbacks.len()
    }

    /// Fire train begin event
    pub fn on_train_begin(&mut self, state: &mut TrainState<'_>) -> Result<CallbackAction> {
        for cb in &mut self.callbacks {
            if cb.on_train_begin(state)? == CallbackAction::Stop {
                return Ok(CallbackAction::Stop);
            }
        }
        Ok(CallbackAction::Continue)
    }

    /// Fire train end event
    ///
    /// Every callback runs even if an earlier one fails; the first error is
    /// returned.
    pub fn on_train_end(&mut self, state: &mut TrainState<'_>) -> Result<()> {
        let mut first_err = None;
        for cb in &mut self.callbacks {
            if let Err(e) = cb.on_train_end(state) {
                first_err.get_or_insert(e);
            }
        }
        first_err.map_or(Ok(()), Err)
    }

    /// Fire epoch begin event
    pub fn on_epoch_begin(&mut self, ctx: &CallbackContext) -> CallbackAction {
        for cb in &mut self.callbacks {
            match cb.on_epoch_begin(ctx) {
                CallbackAction::Stop => return CallbackAction::Stop,
                CallbackAction::SkipEpoch => return CallbackAction::SkipEpoch,
                CallbackAction::Continue | CallbackAction::SkipStep => {}
            }
        }
        CallbackAction::Continue
    }

    /// Fire epoch end event
    pub fn on_epoch_end(&mut self, ctx: &CallbackContext) -> CallbackAction {
        for cb in &mut self.callbacks {
            if cb.on_epoch_end(ctx) == CallbackAction::Stop {
                return CallbackAction::Stop;
            }
        }
        CallbackAction::Continue
    }

    /// Fire batch begin event
    pub fn on_batch_begin(
        &mut self,
        state: &mut TrainState<'_>,
        batch: &mut Batch,
    ) -> Result<CallbackAction> {
        for cb in &mut self.callbacks {
            match cb.on_batch_begin(state, batch)? {
                CallbackAction::Stop => return Ok(CallbackAction::Stop),
                CallbackAction::SkipEpoch => return Ok(CallbackAction::SkipEpoch),
                CallbackAction::Continue | CallbackAction::SkipStep => {}
            }
        }
        Ok(CallbackAction::Continue)
    }

    /// Fire loss begin event
    pub fn on_loss_begin(&mut self, state: &mut TrainState<'_>, output: &mut Tensor) -> Result<()> {
        for cb in &mut self.callbacks {
            cb.on_loss_begin(state, output)?;
        }
        Ok(())
    }

    /// Fire backward begin event
    pub fn on_backward_begin(&mut self, state: &mut TrainState<'_>, loss: &mut Loss) -> Result<()> {
        for cb in &mut self.callbacks {
            cb.on_backward_begin(state, loss)?;
        }
        Ok(())
    }

    /// Fire backward end event
    ///
    /// All callbacks see the event; the step is skipped if any of them asks.
    pub fn on_backward_end(&mut self, state: &mut TrainState<'_>) -> Result<CallbackAction> {
        let mut action = CallbackAction::Continue;
        for cb in &mut self.callbacks {
            match cb.on_backward_end(state)? {
                CallbackAction::Stop => return Ok(CallbackAction::Stop),
                CallbackAction::SkipStep => action = CallbackAction::SkipStep,
                CallbackAction::Continue | CallbackAction::SkipEpoch => {}
            }
        }
        Ok(action)
    }

    /// Fire step end event
    pub fn on_step_end(&mut self, state: &mut TrainState<'_>) -> Result<CallbackAction> {
        for cb in &mut self.callbacks {
            if cb.on_step_end(state)? == CallbackAction::Stop {
                return Ok(CallbackAction::Stop);
            }
        }
        Ok(CallbackAction::Continue)
    }

    /// Fire batch end event
    pub fn on_batch_end(&mut self, ctx: &CallbackContext) -> CallbackAction {
        for cb in &mut self.callbacks {
            if cb.on_batch_end(ctx) == CallbackAction::Stop {
                return CallbackAction::Stop;
            }
        }
        CallbackAction::Continue
    }

    /// Fire validation event
    pub fn on_validation(&mut self, ctx: &CallbackContext) -> CallbackAction {
        for cb in &mut self.callbacks {
            if cb.on_validation(ctx) == CallbackAction::Stop {
                return CallbackAction::Stop;
            }
        }
        CallbackAction::Continue
    }
}

impl Default for CallbackManager {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for CallbackManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CallbackManager").field("callbacks", &self.names()).finish()
    }
}
