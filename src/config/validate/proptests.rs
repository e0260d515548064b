//! Property-based tests for configuration validation

use super::error::ValidationError;
use super::tests::create_valid_spec;
use super::validator::validate_config;
use crate::config::schema::*;
use proptest::prelude::*;

fn arb_valid_spec() -> impl Strategy<Value = TrainSpec> {
    (
        1usize..256,                        // batch_size
        1e-6f32..1.0,                       // lr
        1usize..100,                        // epochs
        proptest::option::of(0.1f32..10.0), // max_grad_norm
        1usize..16,                         // hidden width
    )
        .prop_map(|(batch_size, lr, epochs, max_grad_norm, hidden)| {
            let mut spec = create_valid_spec();
            spec.data.batch_size = batch_size;
            spec.optimizer.lr = lr;
            spec.training.epochs = epochs;
            spec.training.max_grad_norm = max_grad_norm;
            spec.model.layers = vec![
                LayerSpec::Linear { inputs: spec.data.features, outputs: hidden },
                LayerSpec::Relu,
                LayerSpec::Linear { inputs: hidden, outputs: 1 },
            ];
            spec
        })
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(200))]

    #[test]
    fn prop_valid_spec_passes(spec in arb_valid_spec()) {
        prop_assert!(validate_config(&spec).is_ok());
    }

    #[test]
    fn prop_zero_batch_size_fails(spec in arb_valid_spec()) {
        let mut spec = spec;
        spec.data.batch_size = 0;
        prop_assert!(matches!(
            validate_config(&spec),
            Err(ValidationError::InvalidBatchSize(0))
        ));
    }

    #[test]
    fn prop_lr_above_one_fails(spec in arb_valid_spec(), lr in 1.0001f32..100.0) {
        let mut spec = spec;
        spec.optimizer.lr = lr;
        prop_assert!(matches!(
            validate_config(&spec),
            Err(ValidationError::InvalidLearningRate(_))
        ));
    }

    #[test]
    fn prop_backoff_outside_unit_interval_fails(spec in arb_valid_spec(), factor in 1.0f32..8.0) {
        let mut spec = spec;
        if let Some(mp) = spec.mixed_precision.as_mut() {
            mp.backoff_factor = Some(factor);
        }
        prop_assert!(matches!(
            validate_config(&spec),
            Err(ValidationError::InvalidBackoffFactor(_))
        ));
    }
}
