//! Regression metrics

use crate::error::{SalaryError, Result};
use ndarray::Array1;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

/// Error metrics of one prediction set
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RegressionScores {
    /// Mean Absolute Error
    pub mae: f64,
    /// Mean Squared Error
    pub mse: f64,
    /// Root Mean Squared Error
    pub rmse: f64,
    /// R-squared
    pub r2: f64,
}

impl RegressionScores {
    /// Compute regression metrics
    pub fn compute(y_true: &Array1<f64>, y_pred: &Array1<f64>) -> Self {
        let n = y_true.len().max(1) as f64;
        let errors: Vec<f64> = y_true
            .iter()
            .zip(y_pred.iter())
            .map(|(t, p)| t - p)
            .collect();

        let mse: f64 = errors.iter().map(|e| e * e).sum::<f64>() / n;
        let mae: f64 = errors.iter().map(|e| e.abs()).sum::<f64>() / n;

        Self {
            mae,
            mse,
            rmse: mse.sqrt(),
            r2: r2_score(y_true, y_pred),
        }
    }
}

/// Coefficient of determination.
///
/// With constant targets: 1 for an exact fit, otherwise 0.
pub fn r2_score(y_true: &Array1<f64>, y_pred: &Array1<f64>) -> f64 {
    let n = y_true.len();
    if n == 0 {
        return 0.0;
    }
    let y_mean: f64 = y_true.iter().sum::<f64>() / n as f64;
    let ss_tot: f64 = y_true.iter().map(|y| (y - y_mean).powi(2)).sum();
    let ss_res: f64 = y_true
        .iter()
        .zip(y_pred.iter())
        .map(|(t, p)| (t - p).powi(2))
        .sum();

    if ss_tot > 0.0 {
        1.0 - ss_res / ss_tot
    } else if ss_res == 0.0 {
        1.0
    } else {
        0.0
    }
}

/// Metrics for model evaluation.
///
/// Test-partition scores are the headline values; train-partition scores
/// feed the overfitting gap.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelMetrics {
    pub mae: f64,
    pub mse: f64,
    pub rmse: f64,
    pub r2: f64,
    pub train_mae: f64,
    pub train_mse: f64,
    pub train_rmse: f64,
    pub train_r2: f64,
    /// Mean R² over the cross-validation folds of the training partition
    pub cv_r2_mean: f64,
    /// Population standard deviation of the fold R² values
    pub cv_r2_std: f64,
    /// Wall-clock time of the final fit
    pub training_time_secs: f64,
    /// Train R² minus test R²
    pub overfitting_gap: f64,
    pub n_train: usize,
    pub n_test: usize,
    pub n_features: usize,
}

impl ModelMetrics {
    pub fn from_scores(
        test: RegressionScores,
        train: RegressionScores,
        cv_r2_mean: f64,
        cv_r2_std: f64,
        training_time_secs: f64,
    ) -> Self {
        Self {
            mae: test.mae,
            mse: test.mse,
            rmse: test.rmse,
            r2: test.r2,
            train_mae: train.mae,
            train_mse: train.mse,
            train_rmse: train.rmse,
            train_r2: train.r2,
            cv_r2_mean,
            cv_r2_std,
            training_time_secs,
            overfitting_gap: train.r2 - test.r2,
            n_train: 0,
            n_test: 0,
            n_features: 0,
        }
    }

    pub fn with_sizes(mut self, n_train: usize, n_test: usize, n_features: usize) -> Self {
        self.n_train = n_train;
        self.n_test = n_test;
        self.n_features = n_features;
        self
    }

    /// Value of one selection metric
    pub fn get(&self, metric: Metric) -> f64 {
        match metric {
            Metric::R2 => self.r2,
            Metric::Rmse => self.rmse,
            Metric::Mae => self.mae,
        }
    }

    /// Fixed-key view used by reports
    pub fn as_map(&self) -> BTreeMap<&'static str, f64> {
        BTreeMap::from([
            ("MAE", self.mae),
            ("MSE", self.mse),
            ("RMSE", self.rmse),
            ("R²", self.r2),
            ("CV R² Mean", self.cv_r2_mean),
            ("CV R² Std", self.cv_r2_std),
            ("Training Time (s)", self.training_time_secs),
            ("Overfitting", self.overfitting_gap),
        ])
    }
}

/// Metric used to rank trained models
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Metric {
    R2,
    Rmse,
    Mae,
}

impl Metric {
    pub fn higher_is_better(self) -> bool {
        matches!(self, Metric::R2)
    }

    /// True when `a` ranks strictly better than `b`
    pub fn is_better(self, a: f64, b: f64) -> bool {
        if self.higher_is_better() {
            a > b
        } else {
            a < b
        }
    }
}

impl Default for Metric {
    fn default() -> Self {
        Metric::R2
    }
}

impl fmt::Display for Metric {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Metric::R2 => "R²",
            Metric::Rmse => "RMSE",
            Metric::Mae => "MAE",
        };
        f.write_str(name)
    }
}

impl FromStr for Metric {
    type Err = SalaryError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "r2" | "r²" | "r² score" | "r2 score" => Ok(Metric::R2),
            "rmse" => Ok(Metric::Rmse),
            "mae" => Ok(Metric::Mae),
            _ => Err(SalaryError::InvalidParameter {
                name: "metric".to_string(),
                value: s.to_string(),
                reason: "expected one of R², RMSE, MAE".to_string(),
            }),
        }
    }
}
