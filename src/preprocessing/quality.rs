//! Dataset quality report and cleaning ahead of training

use crate::error::Result;
use crate::utils::stats;
use super::RawColumn;
use polars::prelude::*;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashSet};
use tracing::info;

/// Summary statistics of the label column
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LabelStatistics {
    pub min: f64,
    pub max: f64,
    pub mean: f64,
    pub median: f64,
    /// Sample standard deviation
    pub std: f64,
    /// Rows above the 95th percentile
    pub outliers: usize,
}

/// Quality summary of a raw dataset
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DataQualityReport {
    pub total_records: usize,
    /// Null cells over all columns
    pub missing_values: usize,
    /// Rows identical to an earlier row
    pub duplicate_records: usize,
    /// Missing cells per column
    pub missing_per_column: BTreeMap<String, usize>,
    /// None when the label column is absent or not numeric
    pub label_statistics: Option<LabelStatistics>,
}

impl DataQualityReport {
    pub fn from_dataset(df: &DataFrame, label: &str) -> Result<Self> {
        let columns = read_all(df)?;

        let missing_per_column: BTreeMap<String, usize> = columns
            .iter()
            .map(|(name, col)| (name.clone(), col.null_count()))
            .collect();
        let missing_values = missing_per_column.values().sum();
        let duplicate_records = first_occurrences(&columns, df.height())
            .iter()
            .filter(|keep| !**keep)
            .count();

        let label_statistics = columns
            .iter()
            .find(|(name, _)| name == label)
            .and_then(|(_, col)| match col {
                RawColumn::Numeric(values) => {
                    let v: Vec<f64> = values.iter().flatten().copied().collect();
                    label_statistics(&v)
                }
                RawColumn::Categorical(_) => None,
            });

        Ok(Self {
            total_records: df.height(),
            missing_values,
            duplicate_records,
            missing_per_column,
            label_statistics,
        })
    }
}

fn label_statistics(values: &[f64]) -> Option<LabelStatistics> {
    let p95 = stats::quantile(values, 0.95)?;
    Some(LabelStatistics {
        min: values.iter().copied().fold(f64::INFINITY, f64::min),
        max: values.iter().copied().fold(f64::NEG_INFINITY, f64::max),
        mean: stats::mean(values)?,
        median: stats::median(values)?,
        std: stats::sample_std(values).unwrap_or(0.0),
        outliers: values.iter().filter(|v| **v > p95).count(),
    })
}

/// Drop duplicate rows, fill missing cells (mode for text, median for numbers)
/// and drop rows whose label lies outside `[Q1 - 3·IQR, Q3 + 3·IQR]`.
pub fn clean_dataset(df: &DataFrame, label: &str) -> Result<DataFrame> {
    let columns = read_all(df)?;
    let mut keep = first_occurrences(&columns, df.height());
    let n_duplicates = keep.iter().filter(|k| !**k).count();

    let mut filled: Vec<Column> = Vec::with_capacity(columns.len());
    for (name, col) in &columns {
        let series = match col {
            RawColumn::Numeric(values) => {
                let observed: Vec<f64> = values.iter().flatten().copied().collect();
                let median = stats::median(&observed).unwrap_or(0.0);
                let values: Vec<f64> = values.iter().map(|v| v.unwrap_or(median)).collect();

                if name == label {
                    let q1 = stats::quantile(&values, 0.25).unwrap_or(0.0);
                    let q3 = stats::quantile(&values, 0.75).unwrap_or(0.0);
                    let iqr = q3 - q1;
                    let (lo, hi) = (q1 - 3.0 * iqr, q3 + 3.0 * iqr);
                    for (k, v) in keep.iter_mut().zip(&values) {
                        *k = *k && *v >= lo && *v <= hi;
                    }
                }
                Series::new(name.as_str().into(), values)
            }
            RawColumn::Categorical(values) => {
                let mode = mode(values).unwrap_or_default();
                let values: Vec<String> = values
                    .iter()
                    .map(|v| v.clone().unwrap_or_else(|| mode.clone()))
                    .collect();
                Series::new(name.as_str().into(), values)
            }
        };
        filled.push(series.into());
    }

    let mask = BooleanChunked::from_slice("keep".into(), &keep);
    let cleaned = DataFrame::new(filled)?.filter(&mask)?;

    info!(
        rows_in = df.height(),
        rows_out = cleaned.height(),
        duplicates = n_duplicates,
        "Cleaned dataset"
    );
    Ok(cleaned)
}

fn read_all(df: &DataFrame) -> Result<Vec<(String, RawColumn)>> {
    df.get_column_names()
        .iter()
        .map(|name| {
            let name = name.to_string();
            let col = RawColumn::read(df, &name)?;
            Ok((name, col))
        })
        .collect()
}

/// `true` for the first occurrence of every distinct row
fn first_occurrences(columns: &[(String, RawColumn)], n_rows: usize) -> Vec<bool> {
    let mut seen = HashSet::with_capacity(n_rows);
    (0..n_rows)
        .map(|row| {
            let key: Vec<String> = columns.iter().map(|(_, col)| col.cell_key(row)).collect();
            seen.insert(key)
        })
        .collect()
}

fn mode(values: &[Option<String>]) -> Option<String> {
    let mut counts: BTreeMap<&str, usize> = BTreeMap::new();
    for v in values.iter().flatten() {
        *counts.entry(v.as_str()).or_insert(0) += 1;
    }
    counts
        .into_iter()
        .fold(None, |best: Option<(&str, usize)>, (v, c)| match best {
            Some((_, bc)) if bc >= c => best,
            _ => Some((v, c)),
        })
        .map(|(v, _)| v.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn messy_df() -> DataFrame {
        df!(
            "experience" => &[Some(1.0), Some(1.0), None, Some(4.0), Some(5.0), Some(6.0)],
            "education" => &[Some("PhD"), Some("PhD"), Some("PhD"), None, Some("Bachelor's"), Some("PhD")],
            "salary" => &[50000.0, 50000.0, 52000.0, 55000.0, 58000.0, 900000.0]
        )
        .unwrap()
    }

    #[test]
    fn test_quality_report() {
        let report = DataQualityReport::from_dataset(&messy_df(), "salary").unwrap();

        assert_eq!(report.total_records, 6);
        assert_eq!(report.missing_values, 2);
        assert_eq!(report.duplicate_records, 1);
        assert_eq!(report.missing_per_column["education"], 1);

        let label = report.label_statistics.unwrap();
        assert_eq!(label.max, 900000.0);
        assert_eq!(label.outliers, 1);
    }

    #[test]
    fn test_clean_dataset() {
        let cleaned = clean_dataset(&messy_df(), "salary").unwrap();

        // One duplicate and one extreme salary removed
        assert_eq!(cleaned.height(), 4);
        let report = DataQualityReport::from_dataset(&cleaned, "salary").unwrap();
        assert_eq!(report.missing_values, 0);
        assert_eq!(report.duplicate_records, 0);
    }

    #[test]
    fn test_report_without_label() {
        let df = df!("experience" => &[1.0, 2.0]).unwrap();
        let report = DataQualityReport::from_dataset(&df, "salary").unwrap();
        assert!(report.label_statistics.is_none());
    }
}
