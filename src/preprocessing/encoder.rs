//! Feature encoding: categorical codes plus standard scaling
//!
//! [`FeatureEncoder::fit_transform`] is strict and fails on schema problems.
//! [`FittedEncoding::transform`] is lenient: missing fields, unseen categories
//! and unusable values are replaced by frozen defaults and reported as
//! [`Diagnostic`]s.

use crate::diagnostics::Diagnostic;
use crate::error::{SalaryError, Result};
use crate::utils::stats;
use super::{EncoderConfig, FieldValue, RawColumn, Record, ScalingParameters};
use ndarray::{Array1, Array2};
use polars::prelude::*;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use tracing::{debug, info, warn};

/// How a feature column is represented
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FeatureKind {
    Numeric,
    Categorical,
}

/// One entry of the feature contract
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeatureSpec {
    pub name: String,
    pub kind: FeatureKind,
}

/// Code table for a single categorical column.
///
/// Codes are dense `[0, k)` and follow the sorted order of the distinct
/// training values, so they do not depend on row order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ColumnCategories {
    categories: Vec<String>,
    codes: BTreeMap<String, usize>,
    counts: Vec<usize>,
    fallback: usize,
}

impl ColumnCategories {
    fn fit(values: &[String]) -> Self {
        let mut freq: BTreeMap<&str, usize> = BTreeMap::new();
        for v in values {
            *freq.entry(v.as_str()).or_insert(0) += 1;
        }

        let categories: Vec<String> = freq.keys().map(|s| s.to_string()).collect();
        let counts: Vec<usize> = freq.values().copied().collect();
        let codes = categories
            .iter()
            .enumerate()
            .map(|(code, c)| (c.clone(), code))
            .collect();

        // Most frequent category; the lowest code wins ties
        let fallback = counts
            .iter()
            .enumerate()
            .fold((0usize, 0usize), |best, (code, &count)| {
                if count > best.1 { (code, count) } else { best }
            })
            .0;

        Self {
            categories,
            codes,
            counts,
            fallback,
        }
    }

    /// Code for a known category
    pub fn code(&self, value: &str) -> Option<usize> {
        self.codes.get(value).copied()
    }

    /// Category for a code
    pub fn category(&self, code: usize) -> Option<&str> {
        self.categories.get(code).map(String::as_str)
    }

    /// Code substituted for unseen or missing values
    pub fn fallback_code(&self) -> usize {
        self.fallback
    }

    pub fn fallback_category(&self) -> &str {
        &self.categories[self.fallback]
    }

    /// Distinct training values, indexed by code
    pub fn categories(&self) -> &[String] {
        &self.categories
    }

    /// Training frequency of a code
    pub fn count(&self, code: usize) -> Option<usize> {
        self.counts.get(code).copied()
    }

    pub fn len(&self) -> usize {
        self.categories.len()
    }

    pub fn is_empty(&self) -> bool {
        self.categories.is_empty()
    }
}

/// Category mappings for every categorical feature. Read-only after fitting.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CategoryEncoding {
    columns: BTreeMap<String, ColumnCategories>,
}

impl CategoryEncoding {
    pub fn column(&self, name: &str) -> Option<&ColumnCategories> {
        self.columns.get(name)
    }

    /// Names of the encoded categorical columns
    pub fn columns(&self) -> impl Iterator<Item = &str> {
        self.columns.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.columns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }
}

/// Encoded training data
#[derive(Debug, Clone)]
pub struct EncodedDataset {
    /// Categorical codes and raw numeric values
    pub encoded: Array2<f64>,
    /// `encoded` after standard scaling
    pub scaled: Array2<f64>,
    /// Label values
    pub target: Array1<f64>,
}

/// One record mapped onto the feature contract
#[derive(Debug, Clone, PartialEq)]
pub struct EncodedRecord {
    pub encoded: Array1<f64>,
    pub scaled: Array1<f64>,
    pub diagnostics: Vec<Diagnostic>,
}

impl EncodedRecord {
    /// True when at least one field was substituted
    pub fn has_substitutions(&self) -> bool {
        self.diagnostics.iter().any(Diagnostic::is_encoding_warning)
    }
}

/// Everything needed to reproduce the training-time encoding
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FittedEncoding {
    label_column: String,
    features: Vec<FeatureSpec>,
    categories: CategoryEncoding,
    scaling: ScalingParameters,
    defaults: BTreeMap<String, FieldValue>,
}

impl FittedEncoding {
    pub fn label_column(&self) -> &str {
        &self.label_column
    }

    /// Feature contract in encoding order
    pub fn features(&self) -> &[FeatureSpec] {
        &self.features
    }

    pub fn feature_names(&self) -> Vec<&str> {
        self.features.iter().map(|f| f.name.as_str()).collect()
    }

    pub fn n_features(&self) -> usize {
        self.features.len()
    }

    pub fn categories(&self) -> &CategoryEncoding {
        &self.categories
    }

    pub fn scaling(&self) -> &ScalingParameters {
        &self.scaling
    }

    /// Value substituted when `field` is missing: training median or mode
    pub fn default_value(&self, field: &str) -> Option<&FieldValue> {
        self.defaults.get(field)
    }

    /// Encode and scale one record with the frozen parameters.
    ///
    /// Never fails: every substitution is listed in the returned diagnostics.
    pub fn transform(&self, record: &Record) -> EncodedRecord {
        let mut diagnostics = Vec::new();
        let encoded: Array1<f64> = self
            .features
            .iter()
            .map(|spec| self.encode_field(spec, record.get(&spec.name), &mut diagnostics))
            .collect();

        // Width always matches: both come from the same feature list
        let scaled = self
            .scaling
            .transform_row(encoded.view())
            .unwrap_or_else(|_| encoded.clone());

        for diagnostic in &diagnostics {
            match diagnostic {
                Diagnostic::MissingField { .. } => debug!(%diagnostic, "Encoding substitution"),
                _ => warn!(%diagnostic, "Encoding substitution"),
            }
        }

        EncodedRecord {
            encoded,
            scaled,
            diagnostics,
        }
    }

    /// Encode several records, preserving input order
    pub fn transform_batch(&self, records: &[Record]) -> Vec<EncodedRecord> {
        records.iter().map(|r| self.transform(r)).collect()
    }

    /// Encode a DataFrame row by row with the lenient inference path
    pub fn transform_frame(&self, df: &DataFrame) -> Result<(Array2<f64>, Array2<f64>)> {
        let records = super::records_from_frame(df)?;
        let n = records.len();
        let p = self.features.len();
        let mut encoded = Array2::zeros((n, p));
        let mut scaled = Array2::zeros((n, p));
        for (i, rec) in self.transform_batch(&records).into_iter().enumerate() {
            encoded.row_mut(i).assign(&rec.encoded);
            scaled.row_mut(i).assign(&rec.scaled);
        }
        Ok((encoded, scaled))
    }

    fn encode_field(
        &self,
        spec: &FeatureSpec,
        value: Option<&FieldValue>,
        diagnostics: &mut Vec<Diagnostic>,
    ) -> f64 {
        match spec.kind {
            FeatureKind::Categorical => {
                let Some(table) = self.categories.column(&spec.name) else {
                    return 0.0;
                };
                match value.and_then(FieldValue::as_text) {
                    Some(text) => match table.code(&text) {
                        Some(code) => code as f64,
                        None => {
                            diagnostics.push(Diagnostic::UnseenCategory {
                                field: spec.name.clone(),
                                value: text.into_owned(),
                                substitute: table.fallback_category().to_string(),
                            });
                            table.fallback_code() as f64
                        }
                    },
                    None => {
                        diagnostics.push(Diagnostic::MissingField {
                            field: spec.name.clone(),
                            default: table.fallback_category().to_string(),
                        });
                        table.fallback_code() as f64
                    }
                }
            }
            FeatureKind::Numeric => {
                let default = self
                    .defaults
                    .get(&spec.name)
                    .and_then(FieldValue::as_f64)
                    .unwrap_or(0.0);
                match value {
                    None => {
                        diagnostics.push(Diagnostic::MissingField {
                            field: spec.name.clone(),
                            default: FieldValue::Number(default).to_string(),
                        });
                        default
                    }
                    Some(v) => match v.as_f64() {
                        Some(x) => x,
                        None => {
                            diagnostics.push(Diagnostic::InvalidValue {
                                field: spec.name.clone(),
                                value: v.to_string(),
                                substitute: FieldValue::Number(default).to_string(),
                            });
                            default
                        }
                    },
                }
            }
        }
    }
}

/// Builds the feature contract from a training DataFrame
#[derive(Debug, Clone, Default)]
pub struct FeatureEncoder {
    config: EncoderConfig,
}

impl FeatureEncoder {
    pub fn new(config: EncoderConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &EncoderConfig {
        &self.config
    }

    /// Resolve the feature columns, encode them, then standardize the result.
    ///
    /// Fails with [`SalaryError::SchemaError`] when the label or any declared
    /// feature column is missing, when the label has nulls, or when a column
    /// is neither text nor numeric.
    pub fn fit_transform(&self, df: &DataFrame) -> Result<(EncodedDataset, FittedEncoding)> {
        let label = &self.config.label_column;
        if df.height() == 0 {
            return Err(SalaryError::SchemaError("dataset has no rows".to_string()));
        }

        let target = self.read_label(df)?;
        let feature_cols = self.resolve_features(df)?;

        let n_rows = df.height();
        let mut features = Vec::with_capacity(feature_cols.len());
        let mut categories = BTreeMap::new();
        let mut defaults = BTreeMap::new();
        let mut col_data: Vec<Vec<f64>> = Vec::with_capacity(feature_cols.len());

        for name in &feature_cols {
            match RawColumn::read(df, name)? {
                RawColumn::Categorical(values) => {
                    let observed: Vec<String> = values.iter().flatten().cloned().collect();
                    if observed.is_empty() {
                        return Err(SalaryError::SchemaError(format!(
                            "categorical column '{}' has no values", name
                        )));
                    }
                    let table = ColumnCategories::fit(&observed);
                    let fill = table.fallback_category().to_string();
                    let codes = values
                        .iter()
                        .map(|v| {
                            let v = v.as_deref().unwrap_or(fill.as_str());
                            table.code(v).unwrap_or(table.fallback_code()) as f64
                        })
                        .collect();

                    debug!(column = %name, n_categories = table.len(), "Encoded categorical column");
                    defaults.insert(name.clone(), FieldValue::Text(fill));
                    categories.insert(name.clone(), table);
                    features.push(FeatureSpec { name: name.clone(), kind: FeatureKind::Categorical });
                    col_data.push(codes);
                }
                RawColumn::Numeric(values) => {
                    let observed: Vec<f64> = values.iter().flatten().copied().filter(|v| v.is_finite()).collect();
                    let median = stats::median(&observed).ok_or_else(|| {
                        SalaryError::SchemaError(format!("numeric column '{}' has no values", name))
                    })?;
                    let filled = values
                        .iter()
                        .map(|v| v.filter(|x| x.is_finite()).unwrap_or(median))
                        .collect();

                    defaults.insert(name.clone(), FieldValue::Number(median));
                    features.push(FeatureSpec { name: name.clone(), kind: FeatureKind::Numeric });
                    col_data.push(filled);
                }
            }
        }

        let col_refs: Vec<&[f64]> = col_data.iter().map(|c| c.as_slice()).collect();
        let encoded = Array2::from_shape_fn((n_rows, col_refs.len()), |(r, c)| col_refs[c][r]);
        let scaling = ScalingParameters::fit(&encoded);
        let scaled = scaling.transform(&encoded)?;

        info!(
            rows = n_rows,
            features = features.len(),
            categorical = categories.len(),
            label = %label,
            "Fitted feature encoding"
        );

        let fitted = FittedEncoding {
            label_column: label.clone(),
            features,
            categories: CategoryEncoding { columns: categories },
            scaling,
            defaults,
        };

        Ok((EncodedDataset { encoded, scaled, target }, fitted))
    }

    fn read_label(&self, df: &DataFrame) -> Result<Array1<f64>> {
        let label = &self.config.label_column;
        if !df.get_column_names().iter().any(|c| c.as_str() == label.as_str()) {
            return Err(SalaryError::SchemaError(format!("label column '{}' not found", label)));
        }

        match RawColumn::read(df, label)? {
            RawColumn::Numeric(values) => {
                let n_invalid = values.iter().filter(|v| !v.map_or(false, f64::is_finite)).count();
                if n_invalid > 0 {
                    return Err(SalaryError::SchemaError(format!(
                        "label column '{}' has {} missing or non-finite values", label, n_invalid
                    )));
                }
                Ok(values.into_iter().flatten().collect())
            }
            RawColumn::Categorical(_) => Err(SalaryError::SchemaError(format!(
                "label column '{}' must be numeric", label
            ))),
        }
    }

    fn resolve_features(&self, df: &DataFrame) -> Result<Vec<String>> {
        let label = &self.config.label_column;
        let available: Vec<String> = df.get_column_names().iter().map(|c| c.to_string()).collect();

        let features: Vec<String> = match &self.config.feature_columns {
            Some(declared) => {
                let missing: Vec<&str> = declared
                    .iter()
                    .filter(|c| !available.contains(*c))
                    .map(String::as_str)
                    .collect();
                if !missing.is_empty() {
                    return Err(SalaryError::SchemaError(format!(
                        "declared feature columns not found: {}", missing.join(", ")
                    )));
                }
                declared.iter().filter(|c| *c != label).cloned().collect()
            }
            None => available.into_iter().filter(|c| c != label).collect(),
        };

        if features.is_empty() {
            return Err(SalaryError::SchemaError("no feature columns".to_string()));
        }
        Ok(features)
    }
}
