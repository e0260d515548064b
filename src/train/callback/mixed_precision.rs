//! Mixed-precision training callback
//!
//! Drives reduced-precision training from the outside of the step:
//!
//! | hook | effect |
//! |---|---|
//! | `on_train_begin` | convert parameters, install fp32 master copy |
//! | `on_batch_begin` | cast inputs to the compute precision |
//! | `on_loss_begin` | widen the model output to fp32 |
//! | `on_backward_begin` | multiply the loss by the current scale |
//! | `on_backward_end` | overflow check, fp32 grads into the master copy, unscale |
//! | `on_step_end` | write master values back into the model, count the clean step |
//! | `on_train_end` | restore the model to fp32 from the master copy |

use super::traits::{CallbackAction, TrainState, TrainerCallback};
use crate::autograd::precision::{convert_model, grads_overflow, restore_model};
use crate::autograd::{GradScaler, MasterParams, MixedPrecisionConfig, Precision};
use crate::error::{Error, Result};
use crate::optim::clip_grad_norm;
use crate::train::{Batch, Loss};
use crate::Tensor;

/// Mixed-precision training with loss scaling and fp32 master weights
///
/// # Example
///
/// ```rust
/// use mixtrain::autograd::MixedPrecisionConfig;
/// use mixtrain::train::callback::MixedPrecisionCallback;
///
/// let cb = MixedPrecisionCallback::new(MixedPrecisionConfig::fp16());
/// assert_eq!(cb.loss_scale(), 65536.0);
/// ```
#[derive(Debug, Clone)]
pub struct MixedPrecisionCallback {
    config: MixedPrecisionConfig,
    scaler: GradScaler,
    skipped_steps: usize,
}

impl MixedPrecisionCallback {
    /// Name the callback registers under
    pub const NAME: &'static str = "MixedPrecision";

    /// Runs after callbacks that may change the loss
    pub const ORDER: i32 = 999;

    /// Create from a configuration
    pub fn new(config: MixedPrecisionConfig) -> Self {
        let scaler = GradScaler::from_config(&config);
        Self { config, scaler, skipped_steps: 0 }
    }

    /// fp16 compute with dynamic loss scaling
    pub fn fp16() -> Self {
        Self::new(MixedPrecisionConfig::fp16())
    }

    /// bf16 compute without loss scaling
    pub fn bf16() -> Self {
        Self::new(MixedPrecisionConfig::bf16())
    }

    /// Active configuration
    pub fn config(&self) -> &MixedPrecisionConfig {
        &self.config
    }

    /// Loss scaler state
    pub fn scaler(&self) -> &GradScaler {
        &self.scaler
    }

    /// Current loss scale
    pub fn loss_scale(&self) -> f32 {
        self.scaler.scale()
    }

    /// Steps dropped because of gradient overflow
    pub fn skipped_steps(&self) -> usize {
        self.skipped_steps
    }

    /// Compute precision used for the model
    pub fn compute_precision(&self) -> Precision {
        self.config.compute_precision
    }
}

fn missing_master(hook: &str) -> Error {
    Error::MissingState {
        what: format!("master parameters in {hook}"),
        hint: "on_train_begin installs them; run the callback through a Trainer".into(),
    }
}

impl TrainerCallback for MixedPrecisionCallback {
    fn on_train_begin(&mut self, state: &mut TrainState<'_>) -> Result<CallbackAction> {
        let precision = self.config.compute_precision;
        let converted = convert_model(state.model, precision, self.config.keep_norm_fp32);
        let master = MasterParams::from_model(&*state.model, self.config.flat_master);

        tracing::info!(
            precision = %precision,
            converted,
            mirrored = master.num_mirrored(),
            flat = master.is_flat(),
            scale = self.scaler.scale(),
            dynamic = self.scaler.is_dynamic(),
            "mixed precision enabled"
        );

        *state.master = Some(master);
        state.optimizer.reset_state();
        self.scaler.reset_growth_tracker();
        self.skipped_steps = 0;
        Ok(CallbackAction::Continue)
    }

    fn on_batch_begin(
        &mut self,
        _state: &mut TrainState<'_>,
        batch: &mut Batch,
    ) -> Result<CallbackAction> {
        batch.inputs.cast_(self.config.compute_precision);
        Ok(CallbackAction::Continue)
    }

    fn on_loss_begin(&mut self, _state: &mut TrainState<'_>, output: &mut Tensor) -> Result<()> {
        output.cast_(Precision::Fp32);
        Ok(())
    }

    fn on_backward_begin(&mut self, state: &mut TrainState<'_>, loss: &mut Loss) -> Result<()> {
        if !loss.is_finite() {
            tracing::warn!(step = state.ctx.global_step, loss = loss.value, "non-finite loss");
        }
        loss.scale(self.scaler.scale());
        Ok(())
    }

    fn on_backward_end(&mut self, state: &mut TrainState<'_>) -> Result<CallbackAction> {
        if self.scaler.is_dynamic() && grads_overflow(&*state.model) {
            let update = self.scaler.update(false);
            state.model.zero_grad();
            self.skipped_steps += 1;
            tracing::debug!(step = state.ctx.global_step, ?update, "skipping step after gradient overflow");
            return Ok(CallbackAction::SkipStep);
        }

        let master = state.master.as_mut().ok_or_else(|| missing_master("on_backward_end"))?;
        master.copy_grads_from(&*state.model)?;
        master.unscale_grads(self.scaler.scale());
        if let Some(max_norm) = self.config.clip {
            let mut tensors: Vec<&mut Tensor> = master.tensors_mut().iter_mut().collect();
            clip_grad_norm(&mut tensors, max_norm);
        }
        Ok(CallbackAction::Continue)
    }

    fn on_step_end(&mut self, state: &mut TrainState<'_>) -> Result<CallbackAction> {
        // only updates that reached the optimizer count towards growth
        if !state.ctx.step_skipped {
            self.scaler.update(true);
        }
        let master = state.master.as_mut().ok_or_else(|| missing_master("on_step_end"))?;
        master.copy_into(state.model)?;
        master.zero_grad();
        state.model.zero_grad();
        Ok(CallbackAction::Continue)
    }

    fn on_train_end(&mut self, state: &mut TrainState<'_>) -> Result<()> {
        if let Some(master) = state.master.take() {
            restore_model(state.model, &master)?;
        }
        state.optimizer.reset_state();
        tracing::info!(
            skipped_steps = self.skipped_steps,
            overflows = self.scaler.overflow_count(),
            final_scale = self.scaler.scale(),
            "mixed precision disabled, model restored to fp32"
        );
        Ok(())
    }

    fn order(&self) -> i32 {
        Self::ORDER
    }

    fn name(&self) -> &'static str {
        Self::NAME
    }
}
