//! Frozen result of one training run

use crate::error::{SalaryError, Result};
use crate::preprocessing::{FittedEncoding, RawColumn};
use super::config::TrainingConfig;
use super::engine::TrainedModel;
use super::models::{Metric, ModelMetrics, RegressionScores};
use ndarray::Array1;
use polars::prelude::*;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;
use tracing::info;

/// Encoding, scaling, feature order and trained models that travel together
/// from training to inference.
///
/// A bundle is never modified after training; retraining builds a new one.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelBundle {
    encoding: FittedEncoding,
    models: BTreeMap<String, TrainedModel>,
    config: TrainingConfig,
}

impl ModelBundle {
    pub(crate) fn new(
        encoding: FittedEncoding,
        models: BTreeMap<String, TrainedModel>,
        config: TrainingConfig,
    ) -> Self {
        Self { encoding, models, config }
    }

    /// Category codes, scaling parameters and feature order
    pub fn encoding(&self) -> &FittedEncoding {
        &self.encoding
    }

    /// Configuration the bundle was trained with
    pub fn config(&self) -> &TrainingConfig {
        &self.config
    }

    pub fn model(&self, name: &str) -> Option<&TrainedModel> {
        self.models.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.models.contains_key(name)
    }

    /// Trained models ordered by name
    pub fn models(&self) -> impl Iterator<Item = &TrainedModel> {
        self.models.values()
    }

    pub fn model_names(&self) -> Vec<&str> {
        self.models.keys().map(String::as_str).collect()
    }

    pub fn len(&self) -> usize {
        self.models.len()
    }

    pub fn is_empty(&self) -> bool {
        self.models.is_empty()
    }

    pub fn metrics(&self) -> BTreeMap<&str, &ModelMetrics> {
        self.models
            .iter()
            .map(|(name, model)| (name.as_str(), model.metrics()))
            .collect()
    }

    /// Best model by test `metric`; the first name in order wins ties
    pub fn best_model(&self, metric: Metric) -> Option<&TrainedModel> {
        self.models.values().fold(None, |best: Option<&TrainedModel>, model| match best {
            Some(b) if !metric.is_better(model.metrics().get(metric), b.metrics().get(metric)) => Some(b),
            _ => Some(model),
        })
    }

    /// Score every model on a labelled dataset through the inference-time encoding
    pub fn evaluate(&self, df: &DataFrame) -> Result<BTreeMap<String, RegressionScores>> {
        let label = self.encoding.label_column();
        let target: Array1<f64> = match RawColumn::read(df, label)? {
            RawColumn::Numeric(values) => values
                .into_iter()
                .map(|v| {
                    v.filter(|x| x.is_finite()).ok_or_else(|| {
                        SalaryError::SchemaError(format!("label column '{}' has missing values", label))
                    })
                })
                .collect::<Result<_>>()?,
            RawColumn::Categorical(_) => {
                return Err(SalaryError::SchemaError(format!("label column '{}' must be numeric", label)))
            }
        };

        let (encoded, scaled) = self.encoding.transform_frame(df)?;
        self.models
            .iter()
            .map(|(name, model)| -> Result<(String, RegressionScores)> {
                let predictions = model.predict_matrix(&encoded, &scaled)?;
                Ok((name.clone(), RegressionScores::compute(&target, &predictions)))
            })
            .collect()
    }

    /// Write the bundle as JSON
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let json = serde_json::to_string(self)?;
        std::fs::write(path.as_ref(), json)?;
        info!(path = %path.as_ref().display(), models = self.models.len(), "Saved model bundle");
        Ok(())
    }

    /// Read a bundle written by [`ModelBundle::save`]
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let json = std::fs::read_to_string(path)?;
        let bundle: Self = serde_json::from_str(&json)?;
        Ok(bundle)
    }
}
