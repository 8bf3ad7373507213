//! Salary Estimator - salary estimation from job and candidate attributes
//!
//! This crate provides the training and serving pipeline:
//! - Deterministic feature encoding with a frozen feature contract
//! - A model bank of linear regression, random forest and gradient boosting
//! - A predictor with a documented model priority, confidence bands and validation
//!
//! # Modules
//!
//! ## Core
//! - [`preprocessing`] - Records, categorical encoding, scaling, data quality
//! - [`training`] - Regressors, cross-validation, metrics, model bundles
//! - [`inference`] - Predictor, validation rules, diagnostics
//!
//! ## Context
//! - [`explainability`] - Feature impact of tree ensembles
//! - [`market`] - Percentile rank and benchmarks against historical salaries
//!
//! ## Utilities
//! - [`utils`] - Dataset loading and descriptive statistics
//! - [`cli`] - Command-line interface

// Core error handling
pub mod error;
pub mod diagnostics;

// Core pipeline
pub mod preprocessing;
pub mod training;
pub mod inference;

// Context around an estimate
pub mod explainability;
pub mod market;

// Utilities
pub mod utils;

// Services
pub mod cli;

pub use error::{SalaryError, Result};

/// Re-export commonly used types
pub mod prelude {
    // Error handling
    pub use crate::error::{SalaryError, Result};
    pub use crate::diagnostics::Diagnostic;

    // Preprocessing
    pub use crate::preprocessing::{
        EncoderConfig, FeatureEncoder, FieldValue, FittedEncoding, Record, records_from_frame,
    };

    // Training
    pub use crate::training::{Metric, ModelBank, ModelBundle, ModelKind, TrainingConfig, TrainingOutcome};

    // Inference
    pub use crate::inference::{ConfidenceInterval, PredictionResult, Predictor, PredictorConfig, ValidationIssue};

    // Context
    pub use crate::explainability::FeatureImpact;
    pub use crate::market::{BenchmarkStats, MarketComparison, MarketReference};

    // Data loading
    pub use crate::utils::DataLoader;
}
