//! Historical salary reference

use crate::error::{SalaryError, Result};
use crate::preprocessing::{FieldValue, RawColumn, Record};
use crate::utils::stats;
use polars::prelude::*;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use tracing::debug;

/// Categorical fields a similar profile must match exactly
pub const BENCHMARK_FIELDS: [&str; 4] = ["education", "job_title", "industry", "location"];

const EXPERIENCE_FIELD: &str = "experience";

/// Salary statistics of the historical records similar to a request
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BenchmarkStats {
    pub sample_size: usize,
    pub mean: f64,
    pub median: f64,
    /// Sample standard deviation; `None` for a single match
    pub std: Option<f64>,
    pub min: f64,
    pub max: f64,
    pub p25: f64,
    pub p75: f64,
    pub p90: f64,
}

impl BenchmarkStats {
    fn from_salaries(salaries: &[f64]) -> Option<Self> {
        if salaries.is_empty() {
            return None;
        }
        let mut sorted = salaries.to_vec();
        sorted.sort_by(f64::total_cmp);

        Some(Self {
            sample_size: sorted.len(),
            mean: stats::mean(&sorted)?,
            median: stats::quantile_sorted(&sorted, 0.5),
            std: stats::sample_std(&sorted),
            min: sorted[0],
            max: sorted[sorted.len() - 1],
            p25: stats::quantile_sorted(&sorted, 0.25),
            p75: stats::quantile_sorted(&sorted, 0.75),
            p90: stats::quantile_sorted(&sorted, 0.90),
        })
    }
}

/// An estimate placed against the historical market
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MarketComparison {
    pub market_mean: f64,
    pub market_median: f64,
    /// Percentage of historical salaries at or below the estimate
    pub percentile_rank: f64,
    /// Signed deviation of the estimate from the market mean, in percent
    pub relative_to_market_pct: f64,
    /// `None` when no historical record matches the profile
    pub benchmark: Option<BenchmarkStats>,
}

/// Historical salaries plus the profile columns used to find similar records.
///
/// Built once from the training dataset and read-only afterwards.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MarketReference {
    salaries: Vec<f64>,
    sorted: Vec<f64>,
    profile: BTreeMap<String, Vec<Option<String>>>,
    experience: Option<Vec<Option<f64>>>,
}

impl MarketReference {
    /// Read the label and profile columns of a dataset.
    ///
    /// Rows with a null label are ignored. Profile columns that are absent
    /// are simply not used for matching.
    pub fn from_dataset(df: &DataFrame, label: &str) -> Result<Self> {
        let labels = match RawColumn::read(df, label)? {
            RawColumn::Numeric(values) => values,
            RawColumn::Categorical(_) => {
                return Err(SalaryError::SchemaError(format!(
                    "label column '{}' must be numeric",
                    label
                )))
            }
        };
        let keep: Vec<usize> = labels
            .iter()
            .enumerate()
            .filter(|(_, v)| v.is_some_and(f64::is_finite))
            .map(|(i, _)| i)
            .collect();
        if keep.is_empty() {
            return Err(SalaryError::DataError(format!(
                "label column '{}' has no usable values",
                label
            )));
        }

        let salaries: Vec<f64> = keep.iter().filter_map(|&i| labels[i]).collect();
        let mut sorted = salaries.clone();
        sorted.sort_by(f64::total_cmp);

        let present: Vec<String> = df.get_column_names().iter().map(|s| s.to_string()).collect();
        let mut profile = BTreeMap::new();
        for field in BENCHMARK_FIELDS {
            if !present.iter().any(|c| c == field) {
                continue;
            }
            let column: Vec<Option<String>> = match RawColumn::read(df, field)? {
                RawColumn::Categorical(values) => keep.iter().map(|&i| values[i].clone()).collect(),
                RawColumn::Numeric(values) => keep
                    .iter()
                    .map(|&i| values[i].map(|v| FieldValue::Number(v).to_string()))
                    .collect(),
            };
            profile.insert(field.to_string(), column);
        }

        let experience = if present.iter().any(|c| c == EXPERIENCE_FIELD) {
            match RawColumn::read(df, EXPERIENCE_FIELD)? {
                RawColumn::Numeric(values) => Some(keep.iter().map(|&i| values[i]).collect()),
                RawColumn::Categorical(_) => None,
            }
        } else {
            None
        };

        debug!(
            records = salaries.len(),
            profile_fields = profile.len(),
            "Built market reference"
        );

        Ok(Self {
            salaries,
            sorted,
            profile,
            experience,
        })
    }

    pub fn len(&self) -> usize {
        self.salaries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.salaries.is_empty()
    }

    pub fn market_mean(&self) -> f64 {
        stats::mean(&self.salaries).unwrap_or(0.0)
    }

    pub fn market_median(&self) -> f64 {
        if self.sorted.is_empty() {
            return 0.0;
        }
        stats::quantile_sorted(&self.sorted, 0.5)
    }

    /// Percentage of historical salaries `<= salary`, rounded to one decimal
    pub fn percentile_rank(&self, salary: f64) -> f64 {
        if self.sorted.is_empty() {
            return 0.0;
        }
        let at_or_below = self.sorted.partition_point(|&s| s <= salary);
        let pct = at_or_below as f64 / self.sorted.len() as f64 * 100.0;
        (pct * 10.0).round() / 10.0
    }

    /// `(salary / market mean - 1) * 100`; 0 when the market mean is 0
    pub fn relative_to_market_pct(&self, salary: f64) -> f64 {
        let mean = self.market_mean();
        if mean == 0.0 {
            return 0.0;
        }
        (salary / mean - 1.0) * 100.0
    }

    /// Statistics of the records similar to `record`.
    ///
    /// A record matches when every profile field the request carries is
    /// equal and, when the request has a numeric experience, the record's
    /// experience lies within `experience_window` years of it. `None` when
    /// nothing matches.
    pub fn benchmark(&self, record: &Record, experience_window: f64) -> Option<BenchmarkStats> {
        let filters: Vec<(&Vec<Option<String>>, String)> = self
            .profile
            .iter()
            .filter_map(|(field, column)| {
                let wanted = record.get(field)?.as_text()?.into_owned();
                Some((column, wanted))
            })
            .collect();

        let experience = record
            .get(EXPERIENCE_FIELD)
            .and_then(FieldValue::as_f64)
            .and_then(|x| self.experience.as_ref().map(|col| (col, x)));

        let matched: Vec<f64> = (0..self.salaries.len())
            .filter(|&i| {
                filters
                    .iter()
                    .all(|(column, wanted)| column[i].as_deref() == Some(wanted.as_str()))
            })
            .filter(|&i| match experience {
                Some((column, x)) => column[i]
                    .is_some_and(|e| e >= x - experience_window && e <= x + experience_window),
                None => true,
            })
            .map(|i| self.salaries[i])
            .collect();

        debug!(filters = filters.len(), matches = matched.len(), "Benchmarked profile");
        BenchmarkStats::from_salaries(&matched)
    }

    /// Full comparison of an estimate for `record`
    pub fn compare(&self, estimate: f64, record: &Record, experience_window: f64) -> MarketComparison {
        MarketComparison {
            market_mean: self.market_mean(),
            market_median: self.market_median(),
            percentile_rank: self.percentile_rank(estimate),
            relative_to_market_pct: self.relative_to_market_pct(estimate),
            benchmark: self.benchmark(record, experience_window),
        }
    }
}
