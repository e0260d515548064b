//! Stop training once the monitored loss stops improving

use super::traits::{CallbackAction, CallbackContext, TrainerCallback};

/// Which loss the callback watches
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Monitor {
    /// Mean training loss of the epoch
    #[default]
    Train,
    /// Validation loss, falling back to training loss when none was computed
    Validation,
}

/// Halts `fit` after `patience` epochs without an improvement of more than
/// `min_delta`
///
/// A non-finite epoch loss never counts as an improvement, so a run whose
/// reduced-precision loss diverges stops after `patience` epochs instead of
/// training on garbage.
///
/// ```rust
/// use mixtrain::train::callback::EarlyStopping;
///
/// let stop = EarlyStopping::new(5, 1e-3).monitor_validation();
/// assert_eq!(stop.best_loss(), None);
/// ```
#[derive(Clone, Debug)]
pub struct EarlyStopping {
    patience: usize,
    min_delta: f32,
    monitor: Monitor,
    best: Option<(usize, f32)>,
    stale_epochs: usize,
}

impl EarlyStopping {
    pub fn new(patience: usize, min_delta: f32) -> Self {
        Self { patience, min_delta, monitor: Monitor::Train, best: None, stale_epochs: 0 }
    }

    /// Watch the validation loss instead of the training loss
    pub fn monitor_validation(mut self) -> Self {
        self.monitor = Monitor::Validation;
        self
    }

    /// Monitored loss
    pub fn monitor(&self) -> Monitor {
        self.monitor
    }

    /// Lowest finite loss seen
    pub fn best_loss(&self) -> Option<f32> {
        self.best.map(|(_, loss)| loss)
    }

    /// Epoch that produced [`EarlyStopping::best_loss`]
    pub fn best_epoch(&self) -> Option<usize> {
        self.best.map(|(epoch, _)| epoch)
    }

    /// Epochs since the last improvement
    pub fn stale_epochs(&self) -> usize {
        self.stale_epochs
    }

    /// Forget the best loss, e.g. before a second `fit`
    pub fn reset(&mut self) {
        self.best = None;
        self.stale_epochs = 0;
    }

    fn observe(&mut self, epoch: usize, loss: f32) {
        let improved = loss.is_finite()
            && self.best.is_none_or(|(_, best)| loss < best - self.min_delta);
        if improved {
            self.best = Some((epoch, loss));
            self.stale_epochs = 0;
        } else {
            self.stale_epochs += 1;
        }
    }
}

impl TrainerCallback for EarlyStopping {
    fn on_epoch_end(&mut self, ctx: &CallbackContext) -> CallbackAction {
        let loss = match self.monitor {
            Monitor::Train => ctx.loss,
            Monitor::Validation => ctx.val_loss.unwrap_or(ctx.loss),
        };
        self.observe(ctx.epoch, loss);

        if self.stale_epochs < self.patience {
            return CallbackAction::Continue;
        }
        tracing::info!(
            epoch = ctx.epoch,
            best_epoch = self.best_epoch(),
            best_loss = self.best_loss(),
            patience = self.patience,
            "stopping early, loss stopped improving"
        );
        CallbackAction::Stop
    }

    fn name(&self) -> &'static str {
        "EarlyStopping"
    }
}
