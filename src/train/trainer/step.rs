//! Training step operations

use super::core::Trainer;
use crate::autograd::Buffer;
use crate::error::{Error, Result};
use crate::optim::clip_grad_norm;
use crate::train::callback::{CallbackAction, CallbackContext, TrainState};
use crate::train::Batch;
use crate::Tensor;

/// What happened during one step
#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) struct StepOutcome {
    /// Unscaled loss, `None` if a callback vetoed the batch
    pub loss: Option<f32>,
    /// Whether the optimizer update was dropped
    pub skipped: bool,
    /// `Stop` or `SkipEpoch` if a callback asked for it
    pub action: CallbackAction,
}

impl Trainer {
    /// Perform a single training step outside of `fit`
    ///
    /// Returns the unscaled loss of the batch, or `None` when an
    /// `on_batch_begin` hook vetoed it and nothing ran. Mixed-precision
    /// callbacks need `on_train_begin` to have run, so use `fit` when one
    /// is registered.
    pub fn train_step(&mut self, batch: &Batch) -> Result<Option<f32>> {
        let ctx = self.build_context(0, 1, 0, 1, 0.0, None);
        let outcome = self.run_step(batch.clone(), ctx)?;
        Ok(outcome.loss)
    }

    /// Run every stage of one step, firing the hooks in order
    ///
    /// batch begin, forward, loss begin, loss, backward begin, backward,
    /// backward end, optimizer step, step end, zero grad, batch end.
    pub(crate) fn run_step(&mut self, mut batch: Batch, ctx: CallbackContext) -> Result<StepOutcome> {
        let Trainer { model, optimizer, loss_fn, config, metrics, callbacks, master, .. } = self;
        let loss_fn = loss_fn.as_deref().ok_or_else(|| Error::MissingState {
            what: "loss function".into(),
            hint: "call Trainer::set_loss before training".into(),
        })?;
        let mut state =
            TrainState { ctx, model: model.as_mut(), optimizer: optimizer.as_mut(), master };

        match callbacks.on_batch_begin(&mut state, &mut batch)? {
            action @ (CallbackAction::Stop | CallbackAction::SkipEpoch) => {
                return Ok(StepOutcome { loss: None, skipped: false, action });
            }
            CallbackAction::Continue | CallbackAction::SkipStep => {}
        }

        let mut output = state.model.forward(&batch.inputs)?;
        let output_precision = output.precision();
        let output_shape = output.shape().to_vec();

        callbacks.on_loss_begin(&mut state, &mut output)?;
        let mut loss = loss_fn.forward(&output, &batch.targets)?;
        let value = loss.value;
        state.ctx.loss = value;

        callbacks.on_backward_begin(&mut state, &mut loss)?;
        let grad_output =
            Tensor::from_buffer(Buffer::from_f32(loss.grad, output_precision), output_shape, false)?;
        state.model.backward(&grad_output)?;

        let mut action = callbacks.on_backward_end(&mut state)?;
        let skipped = action == CallbackAction::SkipStep;
        if action == CallbackAction::Stop {
            state.model.zero_grad();
            return Ok(StepOutcome { loss: Some(value), skipped: true, action });
        }

        if !skipped {
            match state.master.as_mut() {
                Some(master) => {
                    let mut tensors: Vec<&mut Tensor> = master.tensors_mut().iter_mut().collect();
                    state.optimizer.step(&mut tensors);
                }
                None => {
                    let mut tensors: Vec<&mut Tensor> = state
                        .model
                        .params_mut()
                        .into_iter()
                        .filter(|p| p.is_trainable())
                        .map(|p| &mut p.tensor)
                        .collect();
                    if let Some(max_norm) = config.max_grad_norm {
                        clip_grad_norm(&mut tensors, max_norm);
                    }
                    state.optimizer.step(&mut tensors);
                }
            }
        }

        state.ctx.step_skipped = skipped;
        if callbacks.on_step_end(&mut state)? == CallbackAction::Stop {
            action = CallbackAction::Stop;
        }

        state.model.zero_grad();
        if let Some(master) = state.master.as_mut() {
            master.zero_grad();
        }
        metrics.increment_step();

        if callbacks.on_batch_end(&state.ctx) == CallbackAction::Stop {
            action = CallbackAction::Stop;
        }

        let action = if action == CallbackAction::Stop {
            CallbackAction::Stop
        } else {
            CallbackAction::Continue
        };
        Ok(StepOutcome { loss: Some(value), skipped, action })
    }
}
