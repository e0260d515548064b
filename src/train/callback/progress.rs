//! Training progress as structured `tracing` events

use super::traits::{CallbackAction, CallbackContext, TrainerCallback};

/// Logs one `info` event per epoch and a `debug` event every
/// `log_interval` batches
#[derive(Clone, Debug)]
pub struct ProgressCallback {
    log_interval: usize,
}

impl ProgressCallback {
    /// An interval of 0 is treated as 1
    pub fn new(log_interval: usize) -> Self {
        Self { log_interval: log_interval.max(1) }
    }

    /// Steps between batch log lines
    pub fn log_interval(&self) -> usize {
        self.log_interval
    }
}

impl Default for ProgressCallback {
    fn default() -> Self {
        Self { log_interval: 10 }
    }
}

impl TrainerCallback for ProgressCallback {
    fn on_epoch_begin(&mut self, ctx: &CallbackContext) -> CallbackAction {
        tracing::debug!(epoch = ctx.epoch + 1, max_epochs = ctx.max_epochs, lr = ctx.lr, "epoch starting");
        CallbackAction::Continue
    }

    fn on_epoch_end(&mut self, ctx: &CallbackContext) -> CallbackAction {
        tracing::info!(
            epoch = ctx.epoch + 1,
            max_epochs = ctx.max_epochs,
            loss = ctx.loss,
            val_loss = ctx.val_loss,
            elapsed_secs = ctx.elapsed_secs,
            "epoch finished"
        );
        CallbackAction::Continue
    }

    fn on_batch_end(&mut self, ctx: &CallbackContext) -> CallbackAction {
        let step = ctx.step + 1;
        if step.is_multiple_of(self.log_interval) || step == ctx.steps_per_epoch {
            tracing::debug!(step, steps_per_epoch = ctx.steps_per_epoch, loss = ctx.loss, "batch");
        }
        CallbackAction::Continue
    }

    fn name(&self) -> &'static str {
        "ProgressCallback"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_progress_callback() {
        let mut progress = ProgressCallback::new(5);
        let ctx = CallbackContext {
            epoch: 0,
            max_epochs: 10,
            step: 4,
            steps_per_epoch: 100,
            loss: 0.5,
            lr: 0.001,
            ..Default::default()
        };

        assert_eq!(progress.on_epoch_begin(&ctx), CallbackAction::Continue);
        assert_eq!(progress.on_batch_end(&ctx), CallbackAction::Continue);
        assert_eq!(progress.on_epoch_end(&ctx), CallbackAction::Continue);
    }

    #[test]
    fn test_zero_interval_clamped() {
        assert_eq!(ProgressCallback::new(0).log_interval(), 1);
        assert_eq!(ProgressCallback::default().log_interval(), 10);
    }
}
