//! Hold-out splitting and k-fold cross-validation

use crate::error::{SalaryError, Result};
use super::models::r2_score;
use ndarray::{Array1, Array2, Axis};
use rand::seq::SliceRandom;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};

/// Cross-validation strategy
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum CVStrategy {
    /// K-Fold cross-validation
    /// Contiguous folds in row order
    KFold { n_splits: usize },
}

impl Default for CVStrategy {
    fn default() -> Self {
        CVStrategy::KFold { n_splits: 5 }
    }
}

/// A single train/test split
#[derive(Debug, Clone)]
pub struct CVSplit {
    pub train_indices: Vec<usize>,
    pub test_indices: Vec<usize>,
}

/// Cross-validation splitter
pub struct CrossValidator {
    strategy: CVStrategy,
}

impl CrossValidator {
    /// Create a new cross-validator
    pub fn new(strategy: CVStrategy) -> Self {
        Self { strategy }
    }

    /// Generate train/test splits
    pub fn split(&self, n_samples: usize) -> Result<Vec<CVSplit>> {
        match &self.strategy {
            CVStrategy::KFold { n_splits } => Self::k_fold_split(n_samples, *n_splits),
        }
    }

    fn k_fold_split(n_samples: usize, n_splits: usize) -> Result<Vec<CVSplit>> {
        if n_splits < 2 {
            return Err(SalaryError::ValidationError(
                "n_splits must be at least 2".to_string(),
            ));
        }
        if n_samples < n_splits {
            return Err(SalaryError::ValidationError(format!(
                "n_samples ({}) must be >= n_splits ({})",
                n_samples, n_splits
            )));
        }

        // The hold-out split is already shuffled, so folds stay in row order
        let indices: Vec<usize> = (0..n_samples).collect();

        // The first n_samples % n_splits folds take one extra sample
        let base = n_samples / n_splits;
        let remainder = n_samples % n_splits;

        let mut splits = Vec::with_capacity(n_splits);
        let mut current = 0;
        for fold_idx in 0..n_splits {
            let fold_size = if fold_idx < remainder { base + 1 } else { base };
            let test_indices = indices[current..current + fold_size].to_vec();
            let train_indices = indices[..current]
                .iter()
                .chain(indices[current + fold_size..].iter())
                .copied()
                .collect();

            splits.push(CVSplit {
                train_indices,
                test_indices,
            });
            current += fold_size;
        }

        Ok(splits)
    }

    /// R² of `fit_predict` on every fold.
    ///
    /// `fit_predict(x_train, y_train, x_test)` fits a fresh model and returns
    /// its predictions for `x_test`.
    pub fn score<F>(&self, x: &Array2<f64>, y: &Array1<f64>, fit_predict: F) -> Result<CVResults>
    where
        F: Fn(&Array2<f64>, &Array1<f64>, &Array2<f64>) -> Result<Array1<f64>>,
    {
        let splits = self.split(x.nrows())?;
        let scores = splits
            .iter()
            .map(|split| -> Result<f64> {
                let x_train = x.select(Axis(0), &split.train_indices);
                let y_train = y.select(Axis(0), &split.train_indices);
                let x_test = x.select(Axis(0), &split.test_indices);
                let y_test = y.select(Axis(0), &split.test_indices);

                let predictions = fit_predict(&x_train, &y_train, &x_test)?;
                Ok(r2_score(&y_test, &predictions))
            })
            .collect::<Result<Vec<_>>>()?;

        Ok(CVResults::from_scores(scores))
    }
}

/// Cross-validation results
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CVResults {
    /// Scores for each fold
    pub scores: Vec<f64>,
    /// Mean score across folds
    pub mean_score: f64,
    /// Standard deviation of scores
    pub std_score: f64,
    /// Number of folds
    pub n_folds: usize,
}

impl CVResults {
    /// Create CV results from fold scores
    pub fn from_scores(scores: Vec<f64>) -> Self {
        let n_folds = scores.len();
        let mean_score = scores.iter().sum::<f64>() / n_folds.max(1) as f64;
        let variance = scores.iter().map(|s| (s - mean_score).powi(2)).sum::<f64>()
            / n_folds.max(1) as f64;

        Self {
            scores,
            mean_score,
            std_score: variance.sqrt(),
            n_folds,
        }
    }
}

/// Shuffle `0..n_samples` with `seed` and cut off a test partition of
/// `ceil(n_samples * test_fraction)` rows.
///
/// Returns `(train_indices, test_indices)`. Both partitions are non-empty.
pub fn train_test_split(
    n_samples: usize,
    test_fraction: f64,
    seed: u64,
) -> Result<(Vec<usize>, Vec<usize>)> {
    if !(test_fraction > 0.0 && test_fraction < 1.0) {
        return Err(SalaryError::InvalidParameter {
            name: "test_fraction".to_string(),
            value: test_fraction.to_string(),
            reason: "must be in (0, 1)".to_string(),
        });
    }

    let n_test = (n_samples as f64 * test_fraction).ceil() as usize;
    if n_samples < 2 || n_test >= n_samples {
        return Err(SalaryError::ValidationError(format!(
            "cannot split {} rows with test fraction {}",
            n_samples, test_fraction
        )));
    }

    let mut indices: Vec<usize> = (0..n_samples).collect();
    let mut rng = ChaCha8Rng::seed_from_u64(seed);
    indices.shuffle(&mut rng);

    let train = indices.split_off(n_test);
    Ok((train, indices))
}
