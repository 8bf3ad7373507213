//! Error types for the salary estimator

use thiserror::Error;

/// Result type alias for salary estimator operations
pub type Result<T> = std::result::Result<T, SalaryError>;

/// Main error type.
///
/// Only training-time problems are errors. Inference-time problems are
/// reported as [`Diagnostic`](crate::inference::Diagnostic)s next to a
/// (possibly degraded) estimate.
#[derive(Error, Debug)]
pub enum SalaryError {
    /// Label or declared feature column missing, or a column with an unusable type
    #[error("Schema error: {0}")]
    SchemaError(String),

    /// A requested model failed to fit
    #[error("Training error in {model}: {reason}")]
    TrainingError { model: String, reason: String },

    #[error("Data error: {0}")]
    DataError(String),

    #[error("Invalid shape: expected {expected}, got {actual}")]
    ShapeError { expected: String, actual: String },

    #[error("Model not fitted")]
    ModelNotFitted,

    #[error("Model not found: {0}")]
    ModelNotFound(String),

    #[error("Invalid parameter: {name} = {value}, {reason}")]
    InvalidParameter {
        name: String,
        value: String,
        reason: String,
    },

    #[error("Validation error: {0}")]
    ValidationError(String),

    #[error("Computation error: {0}")]
    ComputationError(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    SerializationError(String),
}

impl SalaryError {
    /// Wrap any error raised while fitting `model`
    pub fn training(model: impl Into<String>, reason: impl ToString) -> Self {
        SalaryError::TrainingError {
            model: model.into(),
            reason: reason.to_string(),
        }
    }
}

impl From<polars::error::PolarsError> for SalaryError {
    fn from(err: polars::error::PolarsError) -> Self {
        SalaryError::DataError(err.to_string())
    }
}

impl From<serde_json::Error> for SalaryError {
    fn from(err: serde_json::Error) -> Self {
        SalaryError::SerializationError(err.to_string())
    }
}

impl From<ndarray::ShapeError> for SalaryError {
    fn from(err: ndarray::ShapeError) -> Self {
        SalaryError::ShapeError {
            expected: "valid shape".to_string(),
            actual: err.to_string(),
        }
    }
}
