//! Standard scaling of the encoded feature matrix

use crate::error::{SalaryError, Result};
use ndarray::{Array1, Array2, ArrayView1, Axis};
use serde::{Deserialize, Serialize};

/// Parameters for one fitted column
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
struct ScalerParams {
    /// Column mean
    center: f64,
    /// Population standard deviation as observed
    std: f64,
    /// Divisor actually applied (`std`, or 1.0 when `std` is zero)
    scale: f64,
}

/// Frozen per-column mean / std, aligned with the feature order.
///
/// Categorical codes are scaled like any other column. Once fitted the
/// parameters never change; applying them is the affine map `(x - mean) / std`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScalingParameters {
    params: Vec<ScalerParams>,
}

impl ScalingParameters {
    /// Compute mean and population std for every column of `x`
    pub fn fit(x: &Array2<f64>) -> Self {
        let params = x
            .axis_iter(Axis(1))
            .map(|col| {
                let n = col.len().max(1) as f64;
                let center = col.sum() / n;
                let std = (col.iter().map(|v| (v - center).powi(2)).sum::<f64>() / n).sqrt();
                ScalerParams {
                    center,
                    std,
                    scale: if std == 0.0 { 1.0 } else { std },
                }
            })
            .collect();

        Self { params }
    }

    pub fn n_features(&self) -> usize {
        self.params.len()
    }

    pub fn mean(&self, idx: usize) -> Option<f64> {
        self.params.get(idx).map(|p| p.center)
    }

    pub fn std(&self, idx: usize) -> Option<f64> {
        self.params.get(idx).map(|p| p.std)
    }

    /// Scale a full matrix
    pub fn transform(&self, x: &Array2<f64>) -> Result<Array2<f64>> {
        self.check_width(x.ncols())?;
        let mut out = x.clone();
        for (mut col, p) in out.axis_iter_mut(Axis(1)).zip(&self.params) {
            col.mapv_inplace(|v| (v - p.center) / p.scale);
        }
        Ok(out)
    }

    /// Scale one encoded row
    pub fn transform_row(&self, row: ArrayView1<f64>) -> Result<Array1<f64>> {
        self.check_width(row.len())?;
        Ok(row
            .iter()
            .zip(&self.params)
            .map(|(v, p)| (v - p.center) / p.scale)
            .collect())
    }

    fn check_width(&self, width: usize) -> Result<()> {
        if width != self.params.len() {
            return Err(SalaryError::ShapeError {
                expected: format!("{} features", self.params.len()),
                actual: format!("{} features", width),
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    #[test]
    fn test_standard_scaling() {
        let x = array![[1.0, 10.0], [2.0, 20.0], [3.0, 30.0], [4.0, 40.0], [5.0, 50.0]];
        let scaling = ScalingParameters::fit(&x);
        let scaled = scaling.transform(&x).unwrap();

        for col in scaled.axis_iter(Axis(1)) {
            let mean = col.sum() / col.len() as f64;
            let var = col.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / col.len() as f64;
            assert!(mean.abs() < 1e-10);
            assert!((var - 1.0).abs() < 1e-10);
        }
    }

    #[test]
    fn test_zero_std_is_not_divided() {
        let x = array![[3.0, 1.0], [3.0, 2.0], [3.0, 3.0]];
        let scaling = ScalingParameters::fit(&x);

        assert_eq!(scaling.std(0), Some(0.0));
        let row = scaling.transform_row(array![5.0, 2.0].view()).unwrap();
        assert_eq!(row[0], 2.0);
        assert!(row.iter().all(|v| v.is_finite()));
    }

    #[test]
    fn test_width_mismatch() {
        let scaling = ScalingParameters::fit(&array![[1.0, 2.0], [3.0, 4.0]]);
        let err = scaling.transform_row(array![1.0].view()).unwrap_err();
        assert!(matches!(err, SalaryError::ShapeError { .. }));
    }
}
