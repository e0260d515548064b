//! Training result types

/// Result of a training run
#[derive(Debug, Clone, PartialEq)]
pub struct TrainResult {
    /// Final epoch reached
    pub final_epoch: usize,
    /// Final (unscaled) training loss
    pub final_loss: f32,
    /// Best loss achieved; validation loss when validation data was given
    pub best_loss: f32,
    /// Whether training was stopped early
    pub stopped_early: bool,
    /// Optimizer updates dropped after gradient overflow
    pub skipped_steps: usize,
    /// Total training time in seconds
    pub elapsed_secs: f64,
}

impl TrainResult {
    /// Serialize as a JSON object for machine-readable output
    pub fn to_json(&self) -> serde_json::Value {
        serde_json::json!({
            "final_epoch": self.final_epoch,
            "final_loss": self.final_loss,
            "best_loss": self.best_loss,
            "stopped_early": self.stopped_early,
            "skipped_steps": self.skipped_steps,
            "elapsed_secs": self.elapsed_secs,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_train_result_clone() {
        let result = TrainResult {
            final_epoch: 5,
            final_loss: 0.1,
            best_loss: 0.05,
            stopped_early: false,
            skipped_steps: 2,
            elapsed_secs: 10.0,
        };
        let cloned = result.clone();
        assert_eq!(result, cloned);
    }

    #[test]
    fn test_train_result_json() {
        let result = TrainResult {
            final_epoch: 3,
            final_loss: 0.5,
            best_loss: 0.25,
            stopped_early: true,
            skipped_steps: 1,
            elapsed_secs: 1.0,
        };
        let json = result.to_json();
        assert_eq!(json["final_epoch"], 3);
        assert_eq!(json["stopped_early"], true);
        assert_eq!(json["skipped_steps"], 1);
        assert_eq!(json["best_loss"], 0.25);
    }
}
