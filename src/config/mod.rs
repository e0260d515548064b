//! Declarative YAML configuration
//!
//! A training run is described by a [`TrainSpec`]: the layer stack, the
//! synthetic dataset, the optimizer, loop settings and an optional
//! mixed-precision section.
//!
//! ```yaml
//! model:
//!   layers:
//!     - { type: linear, inputs: 4, outputs: 16 }
//!     - { type: layer_norm, features: 16 }
//!     - { type: relu }
//!     - { type: linear, inputs: 16, outputs: 1 }
//! data:
//!   features: 4
//! optimizer:
//!   name: adamw
//!   lr: 0.001
//! mixed_precision:
//!   precision: fp16
//! ```

mod builder;
mod cli;
mod loader;
mod schema;
mod validate;

pub use builder::{build_data, build_model, build_optimizer, Dataset};
pub use cli::{parse_args, Cli, Command, InfoArgs, OutputFormat, TrainArgs, ValidateArgs};
pub use loader::{
    apply_overrides, build_trainer, load_config, mixed_precision_config, parse_config,
    spec_precision, summarize, train_from_spec, ModelSummary, TrainOverrides, TrainRun,
};
pub use schema::{
    DataConfig, LayerSpec, MixedPrecisionSpec, ModelSpec, OptimSpec, TrainSpec, TrainingParams,
};
pub use validate::{
    validate_config, validate_layers, validate_mixed_precision, ValidationError, VALID_OPTIMIZERS,
};
