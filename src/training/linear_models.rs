//! Ordinary least squares regression

use crate::error::{SalaryError, Result};
use ndarray::{Array1, Array2, ArrayView1, Axis};
use serde::{Deserialize, Serialize};

/// Relative ridge added to the normal equations when they are not positive definite
const RIDGE_SCALE: f64 = 1e-8;
const MIN_RIDGE: f64 = 1e-12;
const PIVOT_EPS: f64 = 1e-10;

/// Lower-triangular `L` with `A = L·Lᵀ`; `None` unless `a` is positive definite
fn cholesky(a: &Array2<f64>) -> Option<Array2<f64>> {
    let n = a.nrows();
    let mut l = Array2::<f64>::zeros((n, n));
    for i in 0..n {
        for j in 0..=i {
            let dot: f64 = (0..j).map(|k| l[[i, k]] * l[[j, k]]).sum();
            let v = a[[i, j]] - dot;
            if i == j {
                if v <= 0.0 {
                    return None;
                }
                l[[i, i]] = v.sqrt();
            } else {
                l[[i, j]] = v / l[[j, j]];
            }
        }
    }
    Some(l)
}

/// Solve `L·Lᵀ·x = b`: forward then backward substitution
fn substitute(l: &Array2<f64>, b: &Array1<f64>) -> Array1<f64> {
    let n = b.len();
    let mut z = Array1::<f64>::zeros(n);
    for i in 0..n {
        let dot: f64 = (0..i).map(|k| l[[i, k]] * z[k]).sum();
        z[i] = (b[i] - dot) / l[[i, i]];
    }
    let mut x = Array1::<f64>::zeros(n);
    for i in (0..n).rev() {
        let dot: f64 = (i + 1..n).map(|k| l[[k, i]] * x[k]).sum();
        x[i] = (z[i] - dot) / l[[i, i]];
    }
    x
}

/// Gauss-Jordan elimination with partial pivoting on `[A | b]`
fn gauss_jordan(a: &Array2<f64>, b: &Array1<f64>) -> Option<Array1<f64>> {
    let n = a.nrows();
    let mut aug = ndarray::concatenate(Axis(1), &[a.view(), b.view().insert_axis(Axis(1))]).ok()?;

    for col in 0..n {
        let pivot_row = (col..n).max_by(|&r, &s| aug[[r, col]].abs().total_cmp(&aug[[s, col]].abs()))?;
        if aug[[pivot_row, col]].abs() < PIVOT_EPS {
            return None;
        }
        if pivot_row != col {
            for j in 0..=n {
                aug.swap([col, j], [pivot_row, j]);
            }
        }

        let pivot = aug[[col, col]];
        aug.row_mut(col).mapv_inplace(|v| v / pivot);
        let reduced = aug.row(col).to_owned();
        for row in (0..n).filter(|&r| r != col) {
            let factor = aug[[row, col]];
            if factor != 0.0 {
                aug.row_mut(row).scaled_add(-factor, &reduced);
            }
        }
    }

    Some(aug.column(n).to_owned())
}

/// Normal equations `(XᵀX)·w = Xᵀy`.
///
/// Cholesky first, then Cholesky on a slightly ridged system (constant
/// columns make `XᵀX` singular), then Gauss-Jordan.
fn solve_least_squares(x: &Array2<f64>, y: &Array1<f64>) -> Option<Array1<f64>> {
    let xtx = x.t().dot(x);
    let xty = x.t().dot(y);

    let factor = cholesky(&xtx).or_else(|| {
        let n = xtx.nrows().max(1) as f64;
        let ridge = (RIDGE_SCALE * xtx.diag().mapv(f64::abs).sum() / n).max(MIN_RIDGE);
        let mut ridged = xtx.clone();
        ridged.diag_mut().mapv_inplace(|d| d + ridge);
        cholesky(&ridged)
    });

    match factor {
        Some(l) => Some(substitute(&l, &xty)),
        None => gauss_jordan(&xtx, &xty),
    }
}

/// Linear regression with an intercept
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LinearRegression {
    /// Fitted coefficients (weights)
    pub coefficients: Option<Array1<f64>>,
    /// Fitted intercept (bias)
    pub intercept: Option<f64>,
    /// Whether model is fitted
    pub is_fitted: bool,
}

impl Default for LinearRegression {
    fn default() -> Self {
        Self::new()
    }
}

impl LinearRegression {
    /// Create a new linear regression model
    pub fn new() -> Self {
        Self {
            coefficients: None,
            intercept: None,
            is_fitted: false,
        }
    }

    /// Fit the model to training data
    pub fn fit(&mut self, x: &Array2<f64>, y: &Array1<f64>) -> Result<&mut Self> {
        let n_samples = x.nrows();

        if n_samples != y.len() {
            return Err(SalaryError::ShapeError {
                expected: format!("y length = {}", n_samples),
                actual: format!("y length = {}", y.len()),
            });
        }
        if n_samples == 0 {
            return Err(SalaryError::ValidationError(
                "cannot fit a linear model on zero samples".to_string(),
            ));
        }

        // Centering removes the intercept from the normal equations
        let x_mean = x
            .mean_axis(Axis(0))
            .ok_or_else(|| SalaryError::ComputationError("empty design matrix".to_string()))?;
        let y_mean = y.mean().unwrap_or(0.0);
        let x_centered = x - &x_mean.clone().insert_axis(Axis(0));
        let y_centered = y - y_mean;

        let coefficients = solve_least_squares(&x_centered, &y_centered).ok_or_else(|| {
            SalaryError::ComputationError("Matrix is singular, cannot solve least squares".to_string())
        })?;

        if coefficients.iter().any(|c| !c.is_finite()) {
            return Err(SalaryError::ComputationError(
                "least squares produced non-finite coefficients".to_string(),
            ));
        }

        let intercept = y_mean - coefficients.dot(&x_mean);

        self.coefficients = Some(coefficients);
        self.intercept = Some(intercept);
        self.is_fitted = true;

        Ok(self)
    }

    /// Make predictions
    pub fn predict(&self, x: &Array2<f64>) -> Result<Array1<f64>> {
        let coefficients = self.fitted_coefficients()?;
        if x.ncols() != coefficients.len() {
            return Err(SalaryError::ShapeError {
                expected: format!("{} features", coefficients.len()),
                actual: format!("{} features", x.ncols()),
            });
        }
        Ok(x.dot(coefficients) + self.intercept.unwrap_or(0.0))
    }

    /// Predict a single scaled row
    pub fn predict_row(&self, row: ArrayView1<f64>) -> Result<f64> {
        let coefficients = self.fitted_coefficients()?;
        if row.len() != coefficients.len() {
            return Err(SalaryError::ShapeError {
                expected: format!("{} features", coefficients.len()),
                actual: format!("{} features", row.len()),
            });
        }
        Ok(row.dot(coefficients) + self.intercept.unwrap_or(0.0))
    }

    fn fitted_coefficients(&self) -> Result<&Array1<f64>> {
        match (&self.coefficients, self.is_fitted) {
            (Some(c), true) => Ok(c),
            _ => Err(SalaryError::ModelNotFitted),
        }
    }
}
