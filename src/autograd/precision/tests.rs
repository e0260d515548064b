//! Tests for mixed-precision training utilities.

#[cfg(test)]
mod tests {
    use crate::autograd::precision::{
        bf16_to_f32, convert_model, estimate_memory_savings, f32_to_bf16, f32_to_fp16,
        fp16_to_f32, grads_overflow, precision_census, restore_model, GradScaler, MasterParams,
        MixedPrecisionConfig, Precision, ScaleUpdate,
    };
    use crate::error::Error;
    use crate::nn::{LayerNorm, Linear, Module, Sequential};
    use ndarray::arr1;
    use proptest::prelude::*;

    fn small_model() -> Sequential {
        Sequential::new()
            .with(Linear::from_weights(2, 3, vec![0.1, 0.2, 0.3, 0.4, 0.5, 0.6], vec![0.0; 3]).unwrap())
            .with(LayerNorm::new(3, 1e-5))
            .with(Linear::from_weights(3, 1, vec![1.0, -1.0, 0.5], vec![0.25]).unwrap())
    }

    #[test]
    fn test_precision_size_bytes() {
        assert_eq!(Precision::Fp32.size_bytes(), 4);
        assert_eq!(Precision::Fp16.size_bytes(), 2);
        assert_eq!(Precision::Bf16.size_bytes(), 2);
    }

    #[test]
    fn test_precision_name_and_parse() {
        assert_eq!(Precision::Fp16.name(), "fp16");
        assert_eq!(format!("{}", Precision::Bf16), "bf16");
        assert_eq!("FP16".parse::<Precision>(), Ok(Precision::Fp16));
        assert_eq!("bfloat16".parse::<Precision>(), Ok(Precision::Bf16));
        assert!("int8".parse::<Precision>().is_err());
    }

    #[test]
    fn test_precision_is_reduced() {
        assert!(!Precision::Fp32.is_reduced());
        assert!(Precision::Fp16.is_reduced());
        assert!(Precision::Bf16.is_reduced());
        assert_eq!(Precision::default(), Precision::Fp32);
    }

    #[test]
    fn test_precision_max_finite() {
        assert_eq!(Precision::Fp16.max_finite(), 65504.0);
        assert!(Precision::Bf16.max_finite() > 1.0e38);
        assert!(Precision::Fp16.round(70000.0).is_infinite());
    }

    #[test]
    fn test_mixed_precision_config_presets() {
        let fp16 = MixedPrecisionConfig::fp16();
        assert!(fp16.is_mixed());
        assert!(fp16.dynamic_scaling);
        assert_eq!(fp16.initial_scale, 65536.0);
        assert!(fp16.keep_norm_fp32);
        assert!(!fp16.flat_master);

        let bf16 = MixedPrecisionConfig::bf16();
        assert!(bf16.is_mixed());
        assert!(!bf16.dynamic_scaling);

        assert!(!MixedPrecisionConfig::default().is_mixed());
        assert_eq!(MixedPrecisionConfig::for_precision(Precision::Fp16), fp16);
    }

    #[test]
    fn test_mixed_precision_config_builders() {
        let config = MixedPrecisionConfig::fp16()
            .with_initial_scale(1024.0)
            .with_dynamic_scaling(false)
            .with_flat_master(true)
            .with_clip(1.0);
        assert_eq!(config.initial_scale, 1024.0);
        assert!(!config.dynamic_scaling);
        assert!(config.flat_master);
        assert_eq!(config.clip, Some(1.0));
    }

    #[test]
    fn test_mixed_precision_config_yaml_roundtrip() {
        let config = MixedPrecisionConfig::fp16().with_clip(0.5);
        let yaml = serde_yaml::to_string(&config).unwrap();
        assert!(yaml.contains("compute_precision: fp16"));
        let back: MixedPrecisionConfig = serde_yaml::from_str(&yaml).unwrap();
        assert_eq!(back, config);
    }

    #[test]
    fn test_grad_scaler_from_config() {
        let config = MixedPrecisionConfig::fp16();
        let scaler = GradScaler::from_config(&config);
        assert_eq!(scaler.scale(), config.initial_scale);
        assert!(scaler.is_dynamic());
    }

    #[test]
    fn test_grad_scaler_scale_and_unscale() {
        let scaler = GradScaler::new(1000.0);
        assert_eq!(scaler.scale_loss(0.001), 1.0);
        assert_eq!(scaler.unscale_grad(1000.0), 1.0);
    }

    #[test]
    fn test_grad_scaler_unscale_and_check() {
        let scaler = GradScaler::new(100.0);
        let mut grads = vec![100.0, 200.0, 300.0];
        assert!(scaler.unscale_and_check(&mut grads));
        assert_eq!(grads, vec![1.0, 2.0, 3.0]);

        let mut bad = vec![100.0, f32::INFINITY, 300.0];
        assert!(!scaler.unscale_and_check(&mut bad));
    }

    #[test]
    fn test_grad_scaler_grows_after_interval() {
        let mut scaler = GradScaler::new(1000.0);
        scaler.set_growth_interval(2);

        assert_eq!(scaler.update(true), ScaleUpdate::Unchanged);
        assert_eq!(scaler.scale(), 1000.0);
        assert_eq!(scaler.update(true), ScaleUpdate::Grew { from: 1000.0, to: 2000.0 });
        assert_eq!(scaler.scale(), 2000.0);
        assert_eq!(scaler.successful_steps(), 2);
        assert_eq!(scaler.steps_since_growth(), 0);
    }

    #[test]
    fn test_grad_scaler_growth_capped_at_max() {
        let config = MixedPrecisionConfig::fp16().with_initial_scale(16_777_216.0).with_growth_interval(1);
        let mut scaler = GradScaler::from_config(&config);
        scaler.update(true);
        assert_eq!(scaler.scale(), 16_777_216.0);
    }

    #[test]
    fn test_grad_scaler_overflow_backs_off_and_resets_window() {
        let mut scaler = GradScaler::new(1000.0);
        scaler.update(true);
        scaler.update(false);

        assert_eq!(scaler.scale(), 500.0);
        assert_eq!(scaler.overflow_count(), 1);
        assert_eq!(scaler.steps_since_growth(), 0);
    }

    #[test]
    fn test_grad_scaler_scale_floor() {
        let mut scaler = GradScaler::new(2.0);
        assert_eq!(scaler.update(false), ScaleUpdate::BackedOff { from: 2.0, to: 1.0 });
        assert_eq!(scaler.update(false), ScaleUpdate::AtFloor { scale: 1.0 });
        assert_eq!(scaler.scale(), 1.0);
        assert_eq!(scaler.overflow_count(), 2);
    }

    #[test]
    fn test_grad_scaler_dynamic_disabled() {
        let mut scaler = GradScaler::new(1000.0);
        scaler.set_dynamic(false);
        assert_eq!(scaler.update(false), ScaleUpdate::Unchanged);
        assert_eq!(scaler.scale(), 1000.0);
        assert_eq!(scaler.overflow_count(), 0);
    }

    #[test]
    fn test_grad_scaler_default() {
        assert_eq!(GradScaler::default().scale(), 65536.0);
    }

    #[test]
    fn test_f32_to_bf16_roundtrip() {
        for &val in &[0.0, 1.0, -1.0, 0.5, 100.0, -0.001] {
            let back = bf16_to_f32(f32_to_bf16(val));
            if val.abs() > 1e-6 {
                let rel_err = (back - val).abs() / val.abs();
                assert!(rel_err < 0.01, "BF16 roundtrip error too large for {val}");
            }
        }
        assert_eq!(bf16_to_f32(f32_to_bf16(-0.0)), -0.0);
    }

    #[test]
    fn test_f32_to_fp16_roundtrip() {
        for &val in &[0.0, 1.0, -1.0, 0.5, 100.0] {
            let back = fp16_to_f32(f32_to_fp16(val));
            if val.abs() > 1e-4 {
                let rel_err = (back - val).abs() / val.abs();
                assert!(rel_err < 0.01, "FP16 roundtrip error too large for {val}");
            }
        }
    }

    #[test]
    fn test_fp16_infinity() {
        assert!(fp16_to_f32(f32_to_fp16(f32::INFINITY)).is_infinite());
        let neg = fp16_to_f32(f32_to_fp16(f32::NEG_INFINITY));
        assert!(neg.is_infinite() && neg < 0.0);
        assert!(fp16_to_f32(f32_to_fp16(1.0e6)).is_infinite());
    }

    #[test]
    fn test_estimate_memory_savings() {
        let (fp32, mixed, savings) = estimate_memory_savings(1_000, 8 * 512 * 4096, Precision::Fp16);
        assert!(mixed < fp32);
        assert!(savings > 0.0 && savings < 1.0);

        let (fp32, mixed, savings) = estimate_memory_savings(1_000, 1_000, Precision::Fp32);
        assert_eq!(fp32, mixed);
        assert_eq!(savings, 0.0);
    }

    #[test]
    fn test_convert_model_keeps_norm_in_fp32() {
        let mut model = small_model();
        let converted = convert_model(&mut model, Precision::Fp16, true);
        assert_eq!(converted, 4);

        for p in model.params() {
            let expected = if p.is_norm() { Precision::Fp32 } else { Precision::Fp16 };
            assert_eq!(p.tensor.precision(), expected, "{}", p.name);
        }
    }

    #[test]
    fn test_convert_model_all_params() {
        let mut model = small_model();
        assert_eq!(convert_model(&mut model, Precision::Bf16, false), 6);
        assert!(model.params().iter().all(|p| p.tensor.precision() == Precision::Bf16));
        // Converting again is a no-op
        assert_eq!(convert_model(&mut model, Precision::Bf16, false), 0);
    }

    #[test]
    fn test_precision_census() {
        let mut model = small_model();
        convert_model(&mut model, Precision::Fp16, true);
        let census = precision_census(&model);
        assert!(census.contains(&(Precision::Fp16, 6 + 3 + 3 + 1)));
        assert!(census.contains(&(Precision::Fp32, 6)));
    }

    #[test]
    fn test_grads_overflow_detects_inf() {
        let mut model = small_model();
        convert_model(&mut model, Precision::Fp16, true);
        assert!(!grads_overflow(&model));

        model.params_mut()[1].tensor.set_grad(arr1(&[1.0, 1.0e6, 1.0]));
        assert!(grads_overflow(&model));
        model.zero_grad();
        assert!(!grads_overflow(&model));
    }

    #[test]
    fn test_master_params_are_fp32_copies() {
        let mut model = small_model();
        convert_model(&mut model, Precision::Fp16, true);
        let master = MasterParams::from_model(&model, false);

        assert_eq!(master.tensors().len(), 6);
        assert_eq!(master.num_mirrored(), 6);
        assert_eq!(master.precision(), Precision::Fp32);
        assert_eq!(master.num_elements(), model.num_params());
        assert_eq!(master.values(0), Some(model.params()[0].tensor.data()));
        assert!(master.values(6).is_none());
    }

    #[test]
    fn test_flat_master_packs_in_model_order() {
        let model = small_model();
        let master = MasterParams::from_model(&model, true);
        assert!(master.is_flat());
        assert_eq!(master.tensors().len(), 1);
        assert_eq!(master.tensors()[0].len(), model.num_params());
        assert_eq!(master.values(4), Some(arr1(&[1.0, -1.0, 0.5])));
        assert_eq!(master.values(5), Some(arr1(&[0.25])));
    }

    #[test]
    fn test_copy_grads_then_unscale() {
        for flat in [false, true] {
            let mut model = small_model();
            convert_model(&mut model, Precision::Fp16, true);
            let mut master = MasterParams::from_model(&model, flat);

            model.params_mut()[5].tensor.set_grad(arr1(&[512.0]));
            master.copy_grads_from(&model).unwrap();
            master.unscale_grads(256.0);

            let grads: Vec<f32> =
                master.tensors().iter().flat_map(|t| t.grad().unwrap().to_vec()).collect();
            assert_eq!(grads.len(), model.num_params());
            assert_eq!(*grads.last().unwrap(), 2.0);
            // Parameters without gradients contribute zeros
            assert!(grads[..grads.len() - 1].iter().all(|&g| g == 0.0));

            master.zero_grad();
            assert!(master.tensors().iter().all(|t| t.grad().is_none()));
        }
    }

    #[test]
    fn test_copy_into_rounds_to_model_precision() {
        for flat in [false, true] {
            let mut model = small_model();
            convert_model(&mut model, Precision::Fp16, true);
            let mut master = MasterParams::from_model(&model, flat);

            for t in master.tensors_mut() {
                t.update_data(|d| d.mapv_inplace(|v| v + 1.0e-4));
            }
            master.copy_into(&mut model).unwrap();

            let bias = model.params()[5].tensor.data()[0];
            assert_eq!(bias, Precision::Fp16.round(0.25 + 1.0e-4));
            // Norm params stay fp32 and see the exact update
            let gamma = model.params()[2].tensor.data()[0];
            assert_eq!(gamma, 1.0 + 1.0e-4);
        }
    }

    #[test]
    fn test_restore_model_loads_exact_master_values() {
        let mut model = small_model();
        convert_model(&mut model, Precision::Fp16, true);
        let mut master = MasterParams::from_model(&model, false);
        master.tensors_mut()[0].update_data(|d| d[0] = 0.123_456_7);

        restore_model(&mut model, &master).unwrap();
        assert!(model.params().iter().all(|p| p.tensor.precision() == Precision::Fp32));
        assert_eq!(model.params()[0].tensor.data()[0], 0.123_456_7);
    }

    #[test]
    fn test_layout_mismatch_is_reported() {
        let model = small_model();
        let mut master = MasterParams::from_model(&model, false);
        let other = Sequential::new().with(LayerNorm::new(2, 1e-5));
        let err = master.copy_grads_from(&other).unwrap_err();
        assert!(matches!(err, Error::LayoutMismatch { .. }));
    }

    proptest! {
        #[test]
        fn prop_power_of_two_scaling_is_exact(g in -1.0e3f32..1.0e3, exp in 0i32..16) {
            let scaler = GradScaler::new(2f32.powi(exp));
            prop_assert_eq!(scaler.unscale_grad(scaler.scale_loss(g)), g);
        }

        #[test]
        fn prop_scale_stays_within_bounds(updates in proptest::collection::vec(any::<bool>(), 0..200)) {
            let config = MixedPrecisionConfig::fp16().with_growth_interval(3);
            let mut scaler = GradScaler::from_config(&config);
            for valid in updates {
                scaler.update(valid);
                prop_assert!(scaler.scale() >= config.min_scale);
                prop_assert!(scaler.scale() <= config.max_scale);
            }
        }

        #[test]
        fn prop_fp16_roundtrip_relative_error(v in 1.0e-3f32..6.0e4) {
            let back = Precision::Fp16.round(v);
            prop_assert!((back - v).abs() / v <= 1.0e-3);
        }
    }
}
