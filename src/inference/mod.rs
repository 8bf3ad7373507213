//! Inference module
//!
//! Serves salary estimates from a frozen model bundle with:
//! - A documented default-model priority
//! - Graceful degradation (diagnostics instead of errors)
//! - Approximate confidence bands from ensemble members
//! - Request validation and feature-impact explanation

mod config;
mod engine;
mod validation;

pub use config::{PredictorConfig, ValidationRules};
pub use engine::{
    ConfidenceInterval, ModelInfo, PredictionResult, Predictor, SENTINEL_ESTIMATE,
};
pub use validation::ValidationIssue;
pub use crate::diagnostics::Diagnostic;
