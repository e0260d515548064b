//! Training configuration and metrics tracking

/// Training configuration
#[derive(Debug, Clone, PartialEq)]
pub struct TrainConfig {
    /// Global-norm gradient clipping threshold (fp32 training only;
    /// mixed precision clips the master gradients instead)
    pub max_grad_norm: Option<f32>,
    /// Log every N steps
    pub log_interval: usize,
}

impl TrainConfig {
    /// Create a default configuration
    pub fn new() -> Self {
        Self::default()
    }

    /// Enable gradient clipping
    pub fn with_grad_clip(mut self, max_norm: f32) -> Self {
        self.max_grad_norm = Some(max_norm);
        self
    }

    /// Set the logging interval
    pub fn with_log_interval(mut self, interval: usize) -> Self {
        self.log_interval = interval;
        self
    }
}

impl Default for TrainConfig {
    fn default() -> Self {
        Self { max_grad_norm: None, log_interval: 10 }
    }
}

/// Tracks step counts and per-epoch losses
#[derive(Debug, Clone, Default)]
pub struct MetricsTracker {
    /// Completed epochs
    pub epoch: usize,
    /// Optimizer steps attempted, including skipped ones
    pub steps: usize,
    /// Mean unscaled training loss per epoch
    pub losses: Vec<f32>,
    /// Learning rate per epoch
    pub learning_rates: Vec<f32>,
}

impl MetricsTracker {
    /// Create an empty tracker
    pub fn new() -> Self {
        Self::default()
    }

    /// Count one training step
    pub fn increment_step(&mut self) {
        self.steps += 1;
    }

    /// Record the result of a finished epoch
    pub fn record_epoch(&mut self, loss: f32, lr: f32) {
        self.losses.push(loss);
        self.learning_rates.push(lr);
        self.epoch += 1;
    }

    /// Lowest epoch loss so far
    pub fn best_loss(&self) -> Option<f32> {
        self.losses.iter().copied().filter(|l| l.is_finite()).reduce(f32::min)
    }

    /// Forget everything recorded
    pub fn reset(&mut self) {
        *self = Self::default();
    }
}
