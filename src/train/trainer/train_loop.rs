//! Multi-epoch training loop and validation

use super::core::Trainer;
use super::result::TrainResult;
use crate::autograd::Precision;
use crate::error::{Error, Result};
use crate::train::callback::{CallbackAction, CallbackContext, TrainState};
use crate::train::Batch;
use std::time::Instant;

/// Per-epoch bookkeeping carried across the loop
#[derive(Debug, Default)]
struct LoopState {
    final_loss: f32,
    stopped_early: bool,
    skipped_steps: usize,
}

impl Trainer {
    /// Train for multiple epochs with full callback support
    ///
    /// After every epoch the mean unscaled loss is recorded; with validation
    /// data the validation loss is computed and `on_validation` fires.
    /// `on_train_end` always runs, even when a step fails, so a
    /// mixed-precision model is returned to fp32 before the error surfaces.
    ///
    /// # Example
    ///
    /// ```no_run
    /// # use mixtrain::train::{Trainer, Batch, EarlyStopping};
    /// # let mut trainer: Trainer = todo!();
    /// # let batches: Vec<Batch> = vec![];
    /// trainer.add_callback(EarlyStopping::new(5, 0.001));
    ///
    /// let result = trainer.fit(100, &batches, None).unwrap();
    /// println!("Trained {} epochs, final loss: {:.4}", result.final_epoch, result.final_loss);
    /// ```
    pub fn fit(
        &mut self,
        max_epochs: usize,
        train: &[Batch],
        val: Option<&[Batch]>,
    ) -> Result<TrainResult> {
        self.start_time = Some(Instant::now());
        self.best_loss = None;
        let mut loop_state = LoopState::default();

        let ctx = self.build_context(0, max_epochs, 0, 0, 0.0, None);
        let outcome = match self.fire_train_begin(ctx) {
            Ok(CallbackAction::Stop) => {
                loop_state.stopped_early = true;
                Ok(())
            }
            Ok(_) => self.run_epochs(max_epochs, train, val, &mut loop_state),
            Err(e) => Err(e),
        };

        let ctx = self.build_context(self.metrics.epoch, max_epochs, 0, 0, loop_state.final_loss, None);
        let ended = self.fire_train_end(ctx);
        outcome?;
        ended?;

        Ok(TrainResult {
            final_epoch: self.metrics.epoch,
            final_loss: loop_state.final_loss,
            best_loss: self.best_loss.unwrap_or(loop_state.final_loss),
            stopped_early: loop_state.stopped_early,
            skipped_steps: loop_state.skipped_steps,
            elapsed_secs: self.elapsed_secs(),
        })
    }

    /// Mean unscaled loss over `batches` without updating parameters
    ///
    /// The forward pass runs in the model's current precision; the loss is
    /// computed on the fp32-widened output.
    pub fn evaluate(&mut self, batches: &[Batch]) -> Result<f32> {
        let loss_fn = self.loss_fn.as_deref().ok_or_else(|| Error::MissingState {
            what: "loss function".into(),
            hint: "call Trainer::set_loss before evaluating".into(),
        })?;

        let mut total = 0.0;
        for batch in batches {
            let output = self.model.forward(&batch.inputs)?.cast(Precision::Fp32);
            total += loss_fn.forward(&output, &batch.targets)?.value;
        }
        Ok(safe_avg(total, batches.len()))
    }

    fn run_epochs(
        &mut self,
        max_epochs: usize,
        train: &[Batch],
        val: Option<&[Batch]>,
        loop_state: &mut LoopState,
    ) -> Result<()> {
        let steps_per_epoch = train.len();

        for epoch in 0..max_epochs {
            let ctx = self.build_context(epoch, max_epochs, 0, steps_per_epoch, loop_state.final_loss, None);
            match self.callbacks.on_epoch_begin(&ctx) {
                CallbackAction::Stop => {
                    loop_state.stopped_early = true;
                    break;
                }
                CallbackAction::SkipEpoch => continue,
                CallbackAction::Continue | CallbackAction::SkipStep => {}
            }

            let mut total_loss = 0.0;
            let mut num_batches = 0;
            let mut stop = false;
            for (step, batch) in train.iter().enumerate() {
                let ctx = self.build_context(epoch, max_epochs, step, steps_per_epoch, loop_state.final_loss, None);
                let outcome = self.run_step(batch.clone(), ctx)?;
                if let Some(loss) = outcome.loss {
                    total_loss += loss;
                    num_batches += 1;
                }
                if outcome.skipped {
                    loop_state.skipped_steps += 1;
                }
                match outcome.action {
                    CallbackAction::Stop => {
                        stop = true;
                        break;
                    }
                    CallbackAction::SkipEpoch => break,
                    CallbackAction::Continue | CallbackAction::SkipStep => {}
                }
            }

            let avg_loss = safe_avg(total_loss, num_batches);
            loop_state.final_loss = avg_loss;
            self.metrics.record_epoch(avg_loss, self.lr());

            if stop {
                self.update_best_loss(avg_loss);
                loop_state.stopped_early = true;
                break;
            }

            let val_loss = match val {
                Some(batches) if !batches.is_empty() => Some(self.evaluate(batches)?),
                _ => None,
            };
            self.update_best_loss(val_loss.unwrap_or(avg_loss));

            let ctx = self.build_context(epoch, max_epochs, steps_per_epoch, steps_per_epoch, avg_loss, val_loss);
            if val_loss.is_some() && self.callbacks.on_validation(&ctx) == CallbackAction::Stop {
                loop_state.stopped_early = true;
                break;
            }
            if self.callbacks.on_epoch_end(&ctx) == CallbackAction::Stop {
                loop_state.stopped_early = true;
                break;
            }
        }
        Ok(())
    }

    fn fire_train_begin(&mut self, ctx: CallbackContext) -> Result<CallbackAction> {
        let Trainer { model, optimizer, callbacks, master, .. } = self;
        let mut state = TrainState { ctx, model: model.as_mut(), optimizer: optimizer.as_mut(), master };
        callbacks.on_train_begin(&mut state)
    }

    fn fire_train_end(&mut self, ctx: CallbackContext) -> Result<()> {
        let Trainer { model, optimizer, callbacks, master, .. } = self;
        let mut state = TrainState { ctx, model: model.as_mut(), optimizer: optimizer.as_mut(), master };
        callbacks.on_train_end(&mut state)
    }

    /// Update best_loss if the new loss is lower
    fn update_best_loss(&mut self, loss: f32) {
        if loss.is_finite() && self.best_loss.is_none_or(|bl| loss < bl) {
            self.best_loss = Some(loss);
        }
    }
}

/// Safely compute average, returning 0.0 for empty sets
fn safe_avg(total: f32, count: usize) -> f32 {
    if count > 0 {
        total / count as f32
    } else {
        0.0
    }
}
