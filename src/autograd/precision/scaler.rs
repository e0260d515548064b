//! Dynamic loss scaler

use super::config::{DEFAULT_MAX_SCALE, DEFAULT_SCALE_GROWTH_INTERVAL};
use super::MixedPrecisionConfig;

/// How the scale moves in dynamic mode
#[derive(Debug, Clone, Copy, PartialEq)]
struct ScalePolicy {
    growth_factor: f32,
    backoff_factor: f32,
    growth_interval: usize,
    min_scale: f32,
    max_scale: f32,
}

impl Default for ScalePolicy {
    fn default() -> Self {
        Self {
            growth_factor: 2.0,
            backoff_factor: 0.5,
            growth_interval: DEFAULT_SCALE_GROWTH_INTERVAL,
            min_scale: 1.0,
            max_scale: DEFAULT_MAX_SCALE,
        }
    }
}

/// What [`GradScaler::update`] did to the scale
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ScaleUpdate {
    /// Static mode, or a clean step inside the growth window
    Unchanged,
    /// The growth window completed
    Grew { from: f32, to: f32 },
    /// Overflow reduced the scale
    BackedOff { from: f32, to: f32 },
    /// Overflow with the scale already at `min_scale`
    AtFloor { scale: f32 },
}

/// Loss scaler keeping small fp16 gradients above the subnormal range
///
/// The loss is multiplied by `scale` before backward and the gradients are
/// divided by it afterwards. In dynamic mode an overflowing step multiplies
/// the scale by the backoff factor, and `growth_interval` clean steps in a
/// row multiply it by the growth factor, always within
/// `[min_scale, max_scale]`.
#[derive(Debug, Clone)]
pub struct GradScaler {
    scale: f32,
    policy: ScalePolicy,
    dynamic: bool,
    clean_streak: usize,
    overflows: usize,
    clean_steps: usize,
}

impl GradScaler {
    /// Dynamic scaler with the default policy
    pub fn new(initial_scale: f32) -> Self {
        Self {
            scale: initial_scale,
            policy: ScalePolicy::default(),
            dynamic: true,
            clean_streak: 0,
            overflows: 0,
            clean_steps: 0,
        }
    }

    pub fn from_config(config: &MixedPrecisionConfig) -> Self {
        let policy = ScalePolicy {
            growth_factor: config.scale_growth_factor,
            backoff_factor: config.scale_backoff_factor,
            growth_interval: config.scale_growth_interval,
            min_scale: config.min_scale,
            max_scale: config.max_scale,
        };
        Self { policy, dynamic: config.dynamic_scaling, ..Self::new(config.initial_scale) }
    }

    /// Current scale
    pub fn scale(&self) -> f32 {
        self.scale
    }

    pub fn scale_loss(&self, loss: f32) -> f32 {
        loss * self.scale
    }

    pub fn unscale_grad(&self, grad: f32) -> f32 {
        grad / self.scale
    }

    /// Divide `grads` by the scale; false if any result is inf or NaN
    pub fn unscale_and_check(&self, grads: &mut [f32]) -> bool {
        let inv = self.scale.recip();
        grads.iter_mut().fold(true, |finite, g| {
            *g *= inv;
            finite && g.is_finite()
        })
    }

    /// Record the outcome of one step
    pub fn update(&mut self, grads_valid: bool) -> ScaleUpdate {
        if !self.dynamic {
            return ScaleUpdate::Unchanged;
        }

        if !grads_valid {
            self.overflows += 1;
            self.clean_streak = 0;
            let from = self.scale;
            self.scale = (from * self.policy.backoff_factor).max(self.policy.min_scale);
            if self.scale == from {
                tracing::warn!(scale = from, "gradients overflow at the minimum loss scale");
                return ScaleUpdate::AtFloor { scale: from };
            }
            tracing::debug!(from, to = self.scale, "loss scale backed off");
            return ScaleUpdate::BackedOff { from, to: self.scale };
        }

        self.clean_steps += 1;
        self.clean_streak += 1;
        if self.clean_streak < self.policy.growth_interval {
            return ScaleUpdate::Unchanged;
        }
        self.clean_streak = 0;
        let from = self.scale;
        self.scale = (from * self.policy.growth_factor).min(self.policy.max_scale);
        if self.scale == from {
            return ScaleUpdate::Unchanged;
        }
        tracing::debug!(from, to = self.scale, "loss scale grew");
        ScaleUpdate::Grew { from, to: self.scale }
    }

    /// Start a fresh growth window, keeping the scale
    pub fn reset_growth_tracker(&mut self) {
        self.clean_streak = 0;
    }

    /// Overflowing steps seen in dynamic mode
    pub fn overflow_count(&self) -> usize {
        self.overflows
    }

    /// Clean steps seen in dynamic mode
    pub fn successful_steps(&self) -> usize {
        self.clean_steps
    }

    /// Clean steps since the scale last changed or overflowed
    pub fn steps_since_growth(&self) -> usize {
        self.clean_streak
    }

    pub fn is_dynamic(&self) -> bool {
        self.dynamic
    }

    pub fn set_dynamic(&mut self, enabled: bool) {
        self.dynamic = enabled;
    }

    /// Clean steps needed before the scale grows
    pub fn growth_interval(&self) -> usize {
        self.policy.growth_interval
    }

    pub fn set_growth_interval(&mut self, steps: usize) {
        self.policy.growth_interval = steps;
    }
}

impl Default for GradScaler {
    fn default() -> Self {
        Self::new(65536.0)
    }
}
