//! Data preprocessing module
//!
//! Provides the training-time feature contract and its inference-time replay:
//! - Raw records and field values
//! - Categorical encoding into dense integer codes
//! - Standard scaling with frozen parameters
//! - Dataset quality report and cleaning

mod config;
mod encoder;
mod record;
mod scaler;
pub mod quality;

pub use config::{EncoderConfig, DEFAULT_LABEL};
pub use encoder::{
    CategoryEncoding, ColumnCategories, EncodedDataset, EncodedRecord, FeatureEncoder,
    FeatureKind, FeatureSpec, FittedEncoding,
};
pub use quality::{clean_dataset, DataQualityReport, LabelStatistics};
pub use record::{records_from_frame, FieldValue, Record};
pub use scaler::ScalingParameters;

use crate::error::{SalaryError, Result};
use polars::prelude::*;

/// A DataFrame column read into owned values.
/// String columns are categorical; everything castable to `Float64` is numeric.
#[derive(Debug, Clone, PartialEq)]
pub(crate) enum RawColumn {
    Numeric(Vec<Option<f64>>),
    Categorical(Vec<Option<String>>),
}

impl RawColumn {
    pub(crate) fn read(df: &DataFrame, name: &str) -> Result<Self> {
        let column = df
            .column(name)
            .map_err(|_| SalaryError::SchemaError(format!("column '{}' not found", name)))?;
        let series = column.as_materialized_series();

        if series.dtype() == &DataType::String {
            let ca = series.str()?;
            return Ok(RawColumn::Categorical(
                ca.into_iter().map(|v| v.map(str::to_string)).collect(),
            ));
        }

        let series_f64 = series.cast(&DataType::Float64).map_err(|e| {
            SalaryError::SchemaError(format!("column '{}' is neither text nor numeric: {}", name, e))
        })?;
        let ca = series_f64.f64()?;
        Ok(RawColumn::Numeric(ca.into_iter().collect()))
    }

    pub(crate) fn null_count(&self) -> usize {
        match self {
            RawColumn::Numeric(v) => v.iter().filter(|x| x.is_none()).count(),
            RawColumn::Categorical(v) => v.iter().filter(|x| x.is_none()).count(),
        }
    }

    /// Hashable rendering of one cell, used for duplicate detection
    pub(crate) fn cell_key(&self, row: usize) -> String {
        match self {
            RawColumn::Numeric(v) => match v.get(row).copied().flatten() {
                Some(x) => x.to_bits().to_string(),
                None => "\0null".to_string(),
            },
            RawColumn::Categorical(v) => match v.get(row).cloned().flatten() {
                Some(s) => s,
                None => "\0null".to_string(),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_raw_column_kinds() {
        let df = df!(
            "experience" => &[1i32, 2, 3],
            "education" => &["PhD", "Bachelor's", "PhD"]
        )
        .unwrap();

        assert_eq!(
            RawColumn::read(&df, "experience").unwrap(),
            RawColumn::Numeric(vec![Some(1.0), Some(2.0), Some(3.0)])
        );
        assert!(matches!(
            RawColumn::read(&df, "education").unwrap(),
            RawColumn::Categorical(_)
        ));
    }

    #[test]
    fn test_raw_column_missing_is_schema_error() {
        let df = df!("experience" => &[1.0]).unwrap();
        assert!(matches!(
            RawColumn::read(&df, "age"),
            Err(SalaryError::SchemaError(_))
        ));
    }
}
