//! Model bank: trains the requested regressors on one encoded split

use crate::error::{SalaryError, Result};
use crate::preprocessing::{EncodedRecord, FeatureEncoder};
use super::bundle::ModelBundle;
use super::config::{ModelKind, TrainingConfig};
use super::cross_validation::{train_test_split, CVStrategy, CrossValidator};
use super::gradient_boosting::{GradientBoostingConfig, GradientBoostingRegressor};
use super::linear_models::LinearRegression;
use super::models::{ModelMetrics, RegressionScores};
use super::random_forest::RandomForest;
use ndarray::{Array1, Array2, ArrayView1, Axis};
use polars::prelude::*;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, info, warn};

/// Enum to hold fitted regressor variants
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum Estimator {
    LinearRegression(LinearRegression),
    RandomForest(RandomForest),
    GradientBoosting(GradientBoostingRegressor),
}

impl Estimator {
    /// Fit a fresh estimator of `kind` on `(x, y)`
    pub fn fit(kind: ModelKind, config: &TrainingConfig, x: &Array2<f64>, y: &Array1<f64>) -> Result<Self> {
        match kind {
            ModelKind::LinearRegression => {
                let mut model = LinearRegression::new();
                model.fit(x, y)?;
                Ok(Estimator::LinearRegression(model))
            }
            ModelKind::RandomForest => {
                let mut model = RandomForest::new(config.n_estimators)
                    .with_max_depth(config.forest_max_depth)
                    .with_min_samples_split(config.min_samples_split)
                    .with_min_samples_leaf(config.min_samples_leaf)
                    .with_random_state(config.random_seed);
                if let Some(n) = config.forest_max_features {
                    model = model.with_max_features(n);
                }
                model.fit(x, y)?;
                Ok(Estimator::RandomForest(model))
            }
            ModelKind::GradientBoosting => {
                let gb_config = GradientBoostingConfig {
                    n_estimators: config.n_estimators,
                    learning_rate: config.learning_rate,
                    max_depth: config.boosting_max_depth,
                    min_samples_split: config.min_samples_split,
                    min_samples_leaf: config.min_samples_leaf,
                    subsample: config.subsample,
                    random_state: Some(config.random_seed),
                };
                let mut model = GradientBoostingRegressor::new(gb_config);
                model.fit(x, y)?;
                Ok(Estimator::GradientBoosting(model))
            }
        }
    }

    pub fn kind(&self) -> ModelKind {
        match self {
            Estimator::LinearRegression(_) => ModelKind::LinearRegression,
            Estimator::RandomForest(_) => ModelKind::RandomForest,
            Estimator::GradientBoosting(_) => ModelKind::GradientBoosting,
        }
    }

    pub fn predict(&self, x: &Array2<f64>) -> Result<Array1<f64>> {
        match self {
            Estimator::LinearRegression(m) => m.predict(x),
            Estimator::RandomForest(m) => m.predict(x),
            Estimator::GradientBoosting(m) => m.predict(x),
        }
    }

    pub fn predict_row(&self, row: ArrayView1<f64>) -> Result<f64> {
        match self {
            Estimator::LinearRegression(m) => m.predict_row(row),
            _ => {
                let x = row.to_owned().insert_axis(Axis(0));
                Ok(self.predict(&x)?[0])
            }
        }
    }

    /// Per-tree outputs of the random forest.
    ///
    /// `None` for the linear model and for boosting: boosting stages fit
    /// residuals, so no single stage is a salary estimate on its own.
    pub fn member_predictions(&self, row: ArrayView1<f64>) -> Option<Result<Vec<f64>>> {
        match self {
            Estimator::RandomForest(m) => Some(m.member_predictions(row)),
            Estimator::LinearRegression(_) | Estimator::GradientBoosting(_) => None,
        }
    }

    /// Normalized importances for tree ensembles; `None` for the linear model
    pub fn feature_importances(&self) -> Option<Array1<f64>> {
        match self {
            Estimator::LinearRegression(_) => None,
            Estimator::RandomForest(m) => m.feature_importances().cloned(),
            Estimator::GradientBoosting(m) => Some(Array1::from_vec(m.feature_importances().to_vec())),
        }
    }
}

/// One fitted regressor bound to its name and evaluation metrics
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrainedModel {
    kind: ModelKind,
    estimator: Estimator,
    metrics: ModelMetrics,
}

impl TrainedModel {
    pub fn name(&self) -> &'static str {
        self.kind.name()
    }

    pub fn kind(&self) -> ModelKind {
        self.kind
    }

    pub fn estimator(&self) -> &Estimator {
        &self.estimator
    }

    pub fn metrics(&self) -> &ModelMetrics {
        &self.metrics
    }

    /// Pick the representation this model was trained on
    fn input<'a>(&self, record: &'a EncodedRecord) -> ArrayView1<'a, f64> {
        if self.kind.uses_scaled_features() {
            record.scaled.view()
        } else {
            record.encoded.view()
        }
    }

    /// Raw (unclamped) prediction for one encoded record
    pub fn predict_record(&self, record: &EncodedRecord) -> Result<f64> {
        self.estimator.predict_row(self.input(record))
    }

    /// Raw predictions for a matrix pair produced by the same encoding
    pub fn predict_matrix(&self, encoded: &Array2<f64>, scaled: &Array2<f64>) -> Result<Array1<f64>> {
        if self.kind.uses_scaled_features() {
            self.estimator.predict(scaled)
        } else {
            self.estimator.predict(encoded)
        }
    }

    pub fn member_predictions(&self, record: &EncodedRecord) -> Option<Result<Vec<f64>>> {
        self.estimator.member_predictions(self.input(record))
    }

    pub fn feature_importances(&self) -> Option<Array1<f64>> {
        self.estimator.feature_importances()
    }
}

/// A requested model that could not be trained
#[derive(Debug)]
pub struct ModelFailure {
    pub model: String,
    /// Always a [`SalaryError::TrainingError`]
    pub error: SalaryError,
}

/// Everything one training run produced
#[derive(Debug)]
pub struct TrainingOutcome {
    /// Immutable bundle holding every model that trained successfully
    pub bundle: Arc<ModelBundle>,
    /// Requested names that do not match any known model
    pub skipped: Vec<String>,
    pub failures: Vec<ModelFailure>,
}

impl TrainingOutcome {
    /// True when every requested model was trained
    pub fn is_complete(&self) -> bool {
        self.skipped.is_empty() && self.failures.is_empty()
    }

    /// Fixed-key metrics per trained model
    pub fn metrics(&self) -> BTreeMap<String, BTreeMap<&'static str, f64>> {
        self.bundle
            .models()
            .map(|m| (m.name().to_string(), m.metrics().as_map()))
            .collect()
    }
}

/// Trains a roster of regressors against one encoded dataset split
#[derive(Debug, Clone, Default)]
pub struct ModelBank {
    config: TrainingConfig,
}

impl ModelBank {
    pub fn new(config: TrainingConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &TrainingConfig {
        &self.config
    }

    /// Encode `df`, split it, then fit, score and cross-validate every requested model.
    ///
    /// Schema problems and invalid parameters fail the whole run. A model
    /// that fails to fit is reported in [`TrainingOutcome::failures`] and does
    /// not stop the others.
    pub fn train(&self, df: &DataFrame) -> Result<TrainingOutcome> {
        self.config.validate()?;
        let start = Instant::now();

        let (kinds, skipped) = self.resolve_models();
        for name in &skipped {
            warn!(model = %name, "Skipping unknown model");
        }

        let (data, encoding) = FeatureEncoder::new(self.config.encoder.clone()).fit_transform(df)?;
        let (train_idx, test_idx) =
            train_test_split(data.target.len(), self.config.test_fraction, self.config.random_seed)?;
        debug!(train = train_idx.len(), test = test_idx.len(), seed = self.config.random_seed, "Split dataset");

        let split = Split {
            encoded_train: data.encoded.select(Axis(0), &train_idx),
            encoded_test: data.encoded.select(Axis(0), &test_idx),
            scaled_train: data.scaled.select(Axis(0), &train_idx),
            scaled_test: data.scaled.select(Axis(0), &test_idx),
            y_train: data.target.select(Axis(0), &train_idx),
            y_test: data.target.select(Axis(0), &test_idx),
        };

        let mut models = BTreeMap::new();
        let mut failures = Vec::new();
        for kind in kinds {
            match self.train_one(kind, &split) {
                Ok(model) => {
                    info!(
                        model = %kind,
                        r2 = model.metrics.r2,
                        rmse = model.metrics.rmse,
                        cv_r2 = model.metrics.cv_r2_mean,
                        secs = model.metrics.training_time_secs,
                        "Trained model"
                    );
                    models.insert(kind.name().to_string(), model);
                }
                Err(e) => {
                    let error = match e {
                        err @ SalaryError::TrainingError { .. } => err,
                        other => SalaryError::training(kind.name(), other),
                    };
                    warn!(model = %kind, error = %error, "Model failed to train");
                    failures.push(ModelFailure {
                        model: kind.name().to_string(),
                        error,
                    });
                }
            }
        }

        info!(
            trained = models.len(),
            failed = failures.len(),
            skipped = skipped.len(),
            secs = start.elapsed().as_secs_f64(),
            "Training run finished"
        );

        Ok(TrainingOutcome {
            bundle: Arc::new(ModelBundle::new(encoding, models, self.config.clone())),
            skipped,
            failures,
        })
    }

    /// Known kinds in request order (duplicates dropped) and unknown names
    fn resolve_models(&self) -> (Vec<ModelKind>, Vec<String>) {
        let mut kinds = Vec::new();
        let mut skipped = Vec::new();
        for name in &self.config.models {
            match name.parse::<ModelKind>() {
                Ok(kind) if !kinds.contains(&kind) => kinds.push(kind),
                Ok(_) => {}
                Err(_) => skipped.push(name.clone()),
            }
        }
        (kinds, skipped)
    }

    fn train_one(&self, kind: ModelKind, split: &Split) -> Result<TrainedModel> {
        let (x_train, x_test) = if kind.uses_scaled_features() {
            (&split.scaled_train, &split.scaled_test)
        } else {
            (&split.encoded_train, &split.encoded_test)
        };
        let y_train = &split.y_train;

        let spread = y_train.fold(f64::NEG_INFINITY, |a, &b| a.max(b))
            - y_train.fold(f64::INFINITY, |a, &b| a.min(b));
        if !(spread > 0.0) {
            return Err(SalaryError::training(kind.name(), "training target has no variance"));
        }

        let fit_start = Instant::now();
        let estimator = Estimator::fit(kind, &self.config, x_train, y_train)?;
        let training_time_secs = fit_start.elapsed().as_secs_f64();

        let test_scores = RegressionScores::compute(&split.y_test, &estimator.predict(x_test)?);
        let train_scores = RegressionScores::compute(y_train, &estimator.predict(x_train)?);

        let cv = CrossValidator::new(CVStrategy::KFold {
            n_splits: self.config.cv_folds,
        })
        .score(x_train, y_train, |xf, yf, xv| {
            Estimator::fit(kind, &self.config, xf, yf)?.predict(xv)
        })
        .map_err(|e| SalaryError::training(kind.name(), format!("cross-validation failed: {}", e)))?;

        let metrics = ModelMetrics::from_scores(
            test_scores,
            train_scores,
            cv.mean_score,
            cv.std_score,
            training_time_secs,
        )
        .with_sizes(x_train.nrows(), x_test.nrows(), x_train.ncols());

        Ok(TrainedModel { kind, estimator, metrics })
    }
}

/// Train/test partitions in both feature spaces
struct Split {
    encoded_train: Array2<f64>,
    encoded_test: Array2<f64>,
    scaled_train: Array2<f64>,
    scaled_test: Array2<f64>,
    y_train: Array1<f64>,
    y_test: Array1<f64>,
}
