//! Training configuration

use crate::error::{SalaryError, Result};
use crate::preprocessing::EncoderConfig;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;
use std::str::FromStr;

/// Regression algorithms the model bank knows how to train
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum ModelKind {
    LinearRegression,
    RandomForest,
    GradientBoosting,
}

impl ModelKind {
    pub const ALL: [ModelKind; 3] = [
        ModelKind::LinearRegression,
        ModelKind::RandomForest,
        ModelKind::GradientBoosting,
    ];

    /// Display name, also the key of the model in a bundle
    pub fn name(self) -> &'static str {
        match self {
            ModelKind::LinearRegression => "Linear Regression",
            ModelKind::RandomForest => "Random Forest",
            ModelKind::GradientBoosting => "Gradient Boosting",
        }
    }

    /// Tree ensembles consume the unscaled encoded matrix
    pub fn uses_scaled_features(self) -> bool {
        matches!(self, ModelKind::LinearRegression)
    }

    pub fn is_ensemble(self) -> bool {
        !self.uses_scaled_features()
    }
}

impl fmt::Display for ModelKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for ModelKind {
    type Err = SalaryError;

    fn from_str(s: &str) -> Result<Self> {
        let normalized: String = s
            .chars()
            .filter(|c| c.is_alphanumeric())
            .collect::<String>()
            .to_ascii_lowercase();
        match normalized.as_str() {
            "linearregression" | "linear" | "lr" => Ok(ModelKind::LinearRegression),
            "randomforest" | "rf" => Ok(ModelKind::RandomForest),
            "gradientboosting" | "gb" | "gbm" => Ok(ModelKind::GradientBoosting),
            _ => Err(SalaryError::ModelNotFound(s.to_string())),
        }
    }
}

/// Configuration for one training run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TrainingConfig {
    /// Requested model names; unknown names are skipped and reported
    pub models: Vec<String>,
    /// Fraction of rows held out for testing, in (0, 1)
    pub test_fraction: f64,
    /// Seed for the split and every ensemble
    pub random_seed: u64,
    /// Folds for cross-validation on the training partition
    pub cv_folds: usize,
    /// Trees per ensemble
    pub n_estimators: usize,
    pub forest_max_depth: usize,
    /// Features examined per forest split; `None` examines all of them
    pub forest_max_features: Option<usize>,
    pub boosting_max_depth: usize,
    pub min_samples_split: usize,
    pub min_samples_leaf: usize,
    /// Shrinkage of the boosted ensemble
    pub learning_rate: f64,
    /// Row subsample ratio of the boosted ensemble
    pub subsample: f64,
    pub encoder: EncoderConfig,
}

impl Default for TrainingConfig {
    fn default() -> Self {
        Self {
            models: ModelKind::ALL.iter().map(|k| k.name().to_string()).collect(),
            test_fraction: 0.2,
            random_seed: 42,
            cv_folds: 5,
            n_estimators: 100,
            forest_max_depth: 15,
            forest_max_features: None,
            boosting_max_depth: 6,
            min_samples_split: 5,
            min_samples_leaf: 2,
            learning_rate: 0.1,
            subsample: 1.0,
            encoder: EncoderConfig::default(),
        }
    }
}

impl TrainingConfig {
    /// Create a new training configuration
    pub fn new() -> Self {
        Self::default()
    }

    /// Load a configuration from a JSON file; absent keys keep their defaults
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self> {
        let json = std::fs::read_to_string(path)?;
        let config: Self = serde_json::from_str(&json)?;
        config.validate()?;
        Ok(config)
    }

    /// Builder method to set the requested models
    pub fn with_models<I, S>(mut self, models: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.models = models.into_iter().map(Into::into).collect();
        self
    }

    /// Builder method to set the held-out fraction
    pub fn with_test_fraction(mut self, fraction: f64) -> Self {
        self.test_fraction = fraction;
        self
    }

    /// Builder method to set the random seed
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.random_seed = seed;
        self
    }

    pub fn with_cv_folds(mut self, folds: usize) -> Self {
        self.cv_folds = folds;
        self
    }

    /// Builder method to set the number of trees per ensemble
    pub fn with_n_estimators(mut self, n: usize) -> Self {
        self.n_estimators = n;
        self
    }

    pub fn with_forest_max_features(mut self, n: usize) -> Self {
        self.forest_max_features = Some(n);
        self
    }

    pub fn with_learning_rate(mut self, rate: f64) -> Self {
        self.learning_rate = rate;
        self
    }

    pub fn with_subsample(mut self, ratio: f64) -> Self {
        self.subsample = ratio;
        self
    }

    pub fn with_encoder(mut self, encoder: EncoderConfig) -> Self {
        self.encoder = encoder;
        self
    }

    /// Check the numeric parameters
    pub fn validate(&self) -> Result<()> {
        let invalid = |name: &str, value: String, reason: &str| SalaryError::InvalidParameter {
            name: name.to_string(),
            value,
            reason: reason.to_string(),
        };

        if !(self.test_fraction > 0.0 && self.test_fraction < 1.0) {
            return Err(invalid("test_fraction", self.test_fraction.to_string(), "must be in (0, 1)"));
        }
        if self.cv_folds < 2 {
            return Err(invalid("cv_folds", self.cv_folds.to_string(), "must be at least 2"));
        }
        if self.n_estimators == 0 {
            return Err(invalid("n_estimators", "0".to_string(), "must be positive"));
        }
        if self.forest_max_features == Some(0) {
            return Err(invalid("forest_max_features", "0".to_string(), "must be positive"));
        }
        if !(self.learning_rate > 0.0 && self.learning_rate.is_finite()) {
            return Err(invalid("learning_rate", self.learning_rate.to_string(), "must be positive"));
        }
        if !(self.subsample > 0.0 && self.subsample <= 1.0) {
            return Err(invalid("subsample", self.subsample.to_string(), "must be in (0, 1]"));
        }
        Ok(())
    }
}
