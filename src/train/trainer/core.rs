//! Core Trainer struct and basic methods

use crate::autograd::precision::{convert_model, restore_model};
use crate::autograd::{MasterParams, MixedPrecisionConfig, Precision};
use crate::error::Result;
use crate::nn::Module;
use crate::optim::Optimizer;
use crate::train::callback::{
    CallbackContext, CallbackManager, MixedPrecisionCallback, TrainerCallback,
};
use crate::train::{LossFn, MetricsTracker, TrainConfig};
use std::time::Instant;

/// High-level trainer that orchestrates the training loop
///
/// The trainer owns the model, the optimizer and, while mixed precision is
/// active, the fp32 master copy of the parameters. Callbacks see all three
/// through a [`TrainState`](crate::train::callback::TrainState).
///
/// # Example
///
/// ```no_run
/// use mixtrain::autograd::MixedPrecisionConfig;
/// use mixtrain::nn::{Linear, Sequential};
/// use mixtrain::optim::SGD;
/// use mixtrain::train::{Batch, EarlyStopping, MSELoss, TrainConfig, Trainer};
///
/// let mut rng = rand::rng();
/// let model = Sequential::new().with(Linear::new(4, 1, &mut rng));
///
/// let mut trainer = Trainer::new(Box::new(model), Box::new(SGD::new(0.01, 0.9)), TrainConfig::default());
/// trainer.set_loss(Box::new(MSELoss));
/// trainer.add_callback(EarlyStopping::new(5, 0.001));
/// trainer.to_fp16(MixedPrecisionConfig::fp16());
///
/// # let batches: Vec<Batch> = vec![];
/// let result = trainer.fit(10, &batches, None).unwrap();
/// println!("final loss {:.4}", result.final_loss);
/// ```
pub struct Trainer {
    /// Model being trained
    pub(crate) model: Box<dyn Module>,

    /// Optimizer
    pub(crate) optimizer: Box<dyn Optimizer>,

    /// Loss function
    pub(crate) loss_fn: Option<Box<dyn LossFn>>,

    /// Training configuration
    pub(crate) config: TrainConfig,

    /// Metrics tracker
    pub metrics: MetricsTracker,

    /// Callback manager
    pub(crate) callbacks: CallbackManager,

    /// fp32 master copy, installed by the mixed-precision callback
    pub(crate) master: Option<MasterParams>,

    /// Best loss achieved during training
    pub(crate) best_loss: Option<f32>,

    /// Training start time
    pub(crate) start_time: Option<Instant>,
}

impl Trainer {
    /// Create a new trainer
    pub fn new(model: Box<dyn Module>, optimizer: Box<dyn Optimizer>, config: TrainConfig) -> Self {
        Self {
            model,
            optimizer,
            loss_fn: None,
            config,
            metrics: MetricsTracker::new(),
            callbacks: CallbackManager::new(),
            master: None,
            best_loss: None,
            start_time: None,
        }
    }

    /// Set the loss function
    pub fn set_loss(&mut self, loss_fn: Box<dyn LossFn>) {
        self.loss_fn = Some(loss_fn);
    }

    /// Add a callback to the trainer
    pub fn add_callback<C: TrainerCallback + 'static>(&mut self, callback: C) {
        self.callbacks.add(callback);
    }

    /// Train in reduced precision from the next `fit` on
    ///
    /// Replaces any mixed-precision callback already registered.
    pub fn to_fp16(&mut self, config: MixedPrecisionConfig) {
        self.callbacks.remove(MixedPrecisionCallback::NAME);
        self.callbacks.add(MixedPrecisionCallback::new(config));
    }

    /// Stop mixed precision and return every parameter to fp32
    ///
    /// If a master copy is still installed its exact values are loaded.
    pub fn to_fp32(&mut self) -> Result<()> {
        self.callbacks.remove(MixedPrecisionCallback::NAME);
        match self.master.take() {
            Some(master) => {
                restore_model(self.model.as_mut(), &master)?;
                self.optimizer.reset_state();
            }
            None => {
                convert_model(self.model.as_mut(), Precision::Fp32, false);
            }
        }
        Ok(())
    }

    /// Whether a mixed-precision callback is registered
    pub fn is_mixed_precision(&self) -> bool {
        self.callbacks.contains(MixedPrecisionCallback::NAME)
    }

    /// Get current learning rate
    pub fn lr(&self) -> f32 {
        self.optimizer.lr()
    }

    /// Set learning rate
    pub fn set_lr(&mut self, lr: f32) {
        self.optimizer.set_lr(lr);
    }

    /// Model being trained
    pub fn model(&self) -> &dyn Module {
        self.model.as_ref()
    }

    /// Mutable access to the model
    pub fn model_mut(&mut self) -> &mut dyn Module {
        self.model.as_mut()
    }

    /// Installed master copy, if training is in mixed precision
    pub fn master(&self) -> Option<&MasterParams> {
        self.master.as_ref()
    }

    /// Training configuration
    pub fn config(&self) -> &TrainConfig {
        &self.config
    }

    /// Get reference to callback manager
    pub fn callbacks(&self) -> &CallbackManager {
        &self.callbacks
    }

    /// Get mutable reference to callback manager
    pub fn callbacks_mut(&mut self) -> &mut CallbackManager {
        &mut self.callbacks
    }

    /// Build callback context from current state
    pub(crate) fn build_context(
        &self,
        epoch: usize,
        max_epochs: usize,
        step: usize,
        steps_per_epoch: usize,
        loss: f32,
        val_loss: Option<f32>,
    ) -> CallbackContext {
        CallbackContext {
            epoch,
            max_epochs,
            step,
            steps_per_epoch,
            global_step: self.metrics.steps,
            loss,
            lr: self.lr(),
            best_loss: self.best_loss,
            val_loss,
            elapsed_secs: self.elapsed_secs(),
            step_skipped: false,
        }
    }

    /// Compute elapsed seconds from start_time
    pub(crate) fn elapsed_secs(&self) -> f64 {
        self.start_time.map_or(0.0, |t| t.elapsed().as_secs_f64())
    }
}

impl std::fmt::Debug for Trainer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Trainer")
            .field("model", &self.model.name())
            .field("optimizer", &self.optimizer.name())
            .field("callbacks", &self.callbacks)
            .field("mixed_precision", &self.master.is_some())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::nn::{LayerNorm, Linear, Sequential};
    use crate::optim::AdamW;
    use crate::train::ProgressCallback;

    fn trainer() -> Trainer {
        let model = Sequential::new()
            .with(Linear::from_weights(2, 2, vec![1.0, 0.0, 0.0, 1.0], vec![0.0, 0.0]).unwrap())
            .with(LayerNorm::new(2, 1e-5));
        Trainer::new(Box::new(model), Box::new(AdamW::default_params(0.001)), TrainConfig::default())
    }

    #[test]
    fn test_trainer_creation() {
        let trainer = trainer();
        assert_eq!(trainer.model().num_params(), 10);
        assert_eq!(trainer.lr(), 0.001);
        assert!(trainer.master().is_none());
        assert!(!trainer.is_mixed_precision());
    }

    #[test]
    fn test_set_lr() {
        let mut trainer = trainer();
        trainer.set_lr(0.01);
        assert_eq!(trainer.lr(), 0.01);
    }

    #[test]
    fn test_add_callback() {
        let mut trainer = trainer();
        trainer.add_callback(ProgressCallback::new(5));
        assert!(!trainer.callbacks().is_empty());
        trainer.callbacks_mut().remove("ProgressCallback");
        assert!(trainer.callbacks().is_empty());
    }

    #[test]
    fn test_to_fp16_registers_once() {
        let mut trainer = trainer();
        trainer.to_fp16(MixedPrecisionConfig::fp16());
        trainer.to_fp16(MixedPrecisionConfig::bf16());
        assert!(trainer.is_mixed_precision());
        assert_eq!(trainer.callbacks().len(), 1);
    }

    #[test]
    fn test_to_fp32_converts_model() {
        let mut trainer = trainer();
        convert_model(trainer.model_mut(), Precision::Fp16, false);
        trainer.to_fp16(MixedPrecisionConfig::fp16());

        trainer.to_fp32().unwrap();

        assert!(!trainer.is_mixed_precision());
        assert!(trainer.model().params().iter().all(|p| p.tensor.precision() == Precision::Fp32));
    }

    #[test]
    fn test_to_fp32_loads_installed_master() {
        let mut trainer = trainer();
        trainer.master = Some(MasterParams::from_model(trainer.model(), false));
        if let Some(master) = trainer.master.as_mut() {
            master.tensors_mut()[0].update_data(|v| v[0] = 0.333_333_34);
        }
        convert_model(trainer.model_mut(), Precision::Fp16, true);

        trainer.to_fp32().unwrap();

        assert!(trainer.master().is_none());
        assert_eq!(trainer.model().params()[0].tensor.data()[0], 0.333_333_34);
    }
}
