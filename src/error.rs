//! Error types with actionable diagnostics.
//!
//! Every error carries enough context to act on it without reading the
//! source: what was expected, what was found, and where to look.

use std::path::PathBuf;
use thiserror::Error;

use crate::config::ValidationError;

/// Result type alias for mixtrain operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while building models or running training.
#[derive(Error, Debug)]
pub enum Error {
    /// Tensor shape or length does not match what an operation needs.
    #[error("Tensor shape mismatch in {op}: expected {expected:?}, got {actual:?}\n  → Check layer widths and batch layout")]
    ShapeMismatch { op: String, expected: Vec<usize>, actual: Vec<usize> },

    /// The fp32 master copy no longer lines up with the model parameters.
    #[error("Master parameters do not match the model: {message}\n  → Parameters were added or resized after training began")]
    LayoutMismatch { message: String },

    /// A hook ran before the state it depends on was installed.
    #[error("Missing training state: {what}\n  → {hint}")]
    MissingState { what: String, hint: String },

    /// Configuration could not be read or parsed.
    #[error("Configuration error: {0}")]
    Config(String),

    /// Configuration parsed but holds invalid values.
    #[error("Invalid configuration: {0}")]
    Validation(#[from] ValidationError),

    /// IO error with context.
    #[error("IO error: {context} ({path})\n  Cause: {source}")]
    Io {
        context: String,
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Serialization/deserialization error.
    #[error("Serialization error: {message}")]
    Serialization { message: String },
}

impl Error {
    /// Create an IO error with context.
    pub fn io(context: impl Into<String>, path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io { context: context.into(), path: path.into(), source }
    }

    /// Create a shape mismatch error for `op`.
    pub fn shape(op: impl Into<String>, expected: &[usize], actual: &[usize]) -> Self {
        Self::ShapeMismatch { op: op.into(), expected: expected.to_vec(), actual: actual.to_vec() }
    }

    /// Check if this error is caused by user input rather than library state.
    pub fn is_user_error(&self) -> bool {
        matches!(self, Self::Config(_) | Self::Validation(_) | Self::Io { .. })
    }

    /// Get the error code for structured output.
    pub fn code(&self) -> &'static str {
        match self {
            Self::Config(_) => "E001",
            Self::Validation(_) => "E003",
            Self::ShapeMismatch { .. } => "E040",
            Self::LayoutMismatch { .. } => "E041",
            Self::MissingState { .. } => "E042",
            Self::Io { .. } => "E050",
            Self::Serialization { .. } => "E051",
        }
    }
}

impl From<serde_yaml::Error> for Error {
    fn from(e: serde_yaml::Error) -> Self {
        Self::Config(format!("Failed to parse YAML config: {e}"))
    }
}

impl From<serde_json::Error> for Error {
    fn from(e: serde_json::Error) -> Self {
        Self::Serialization { message: e.to_string() }
    }
}
