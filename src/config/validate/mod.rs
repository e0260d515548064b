//! Configuration validation
//!
//! Validates training specifications for correctness before execution.

mod error;
mod validator;

#[cfg(test)]
mod proptests;

pub use error::ValidationError;
pub use validator::{validate_config, validate_layers, validate_mixed_precision, VALID_OPTIMIZERS};
