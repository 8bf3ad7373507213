//! Predictor implementation
//!
//! Serves estimates from one frozen [`ModelBundle`]:
//! - Ordered model-selection policy
//! - Non-negative estimates with a sentinel on internal failure
//! - Member-dispersion confidence band for tree ensembles
//! - Input validation and feature-impact explanation
//! - Optional market comparison

use crate::diagnostics::Diagnostic;
use crate::error::{SalaryError, Result};
use crate::explainability::{explain_record, FeatureImpact};
use crate::market::{MarketComparison, MarketReference};
use crate::preprocessing::{EncodedRecord, Record};
use crate::training::{ModelBundle, ModelKind, TrainedModel};
use crate::utils::stats;
use super::{PredictorConfig, ValidationIssue};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::{debug, error};

/// Estimate returned when inference fails internally
pub const SENTINEL_ESTIMATE: f64 = 0.0;

/// Normal-approximation band around a point estimate.
///
/// Derived from the spread of the ensemble members' own outputs. This is an
/// approximation, not a calibrated predictive interval.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ConfidenceInterval {
    /// Clamped to zero
    pub lower: f64,
    pub upper: f64,
    /// Population standard deviation of the member outputs
    pub std_dev: f64,
    pub n_members: usize,
}

/// Everything known about one prediction request
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PredictionResult {
    /// Non-negative point estimate
    pub estimate: f64,
    pub interval: Option<ConfidenceInterval>,
    /// `None` when no model could be selected
    pub model_used: Option<String>,
    pub diagnostics: Vec<Diagnostic>,
    /// True when the estimate is the sentinel
    pub degraded: bool,
    pub market: Option<MarketComparison>,
}

/// Summary of what a predictor can serve
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelInfo {
    pub available_models: Vec<String>,
    pub default_model: Option<String>,
    pub feature_order: Vec<String>,
    pub encoded_fields: Vec<String>,
    pub scaling_available: bool,
    pub market_reference: bool,
}

/// One scored request before the output contract is applied
struct Scored<'a> {
    model: Option<&'a TrainedModel>,
    encoded: EncodedRecord,
    raw: Result<f64>,
}

/// Prediction service over a shared, read-only model bundle
#[derive(Debug, Clone)]
pub struct Predictor {
    bundle: Arc<ModelBundle>,
    config: PredictorConfig,
    market: Option<Arc<MarketReference>>,
}

impl Predictor {
    /// Create a predictor with the default configuration
    pub fn new(bundle: Arc<ModelBundle>) -> Self {
        Self {
            bundle,
            config: PredictorConfig::default(),
            market: None,
        }
    }

    pub fn with_config(mut self, config: PredictorConfig) -> Self {
        self.config = config;
        self
    }

    /// Attach historical data for market comparison in [`Predictor::predict_detailed`]
    pub fn with_market_reference(mut self, market: MarketReference) -> Self {
        self.market = Some(Arc::new(market));
        self
    }

    pub fn bundle(&self) -> &ModelBundle {
        &self.bundle
    }

    pub fn config(&self) -> &PredictorConfig {
        &self.config
    }

    pub fn market_reference(&self) -> Option<&MarketReference> {
        self.market.as_deref()
    }

    /// Resolve the model to use.
    ///
    /// A named model is looked up by bundle key, then by alias ("gb", "rf",
    /// ...). Without a name, the configured priority list is tried in order
    /// and the first trained model by name is the last resort.
    pub fn select_model(&self, model_name: Option<&str>) -> Option<&TrainedModel> {
        match model_name {
            Some(name) => self.bundle.model(name).or_else(|| {
                name.parse::<ModelKind>()
                    .ok()
                    .and_then(|kind| self.bundle.model(kind.name()))
            }),
            None => self
                .config
                .model_priority
                .iter()
                .find_map(|name| self.bundle.model(name))
                .or_else(|| self.bundle.models().next()),
        }
    }

    /// Map a raw record onto the bundle's feature contract
    pub fn encode_input(&self, record: &Record) -> EncodedRecord {
        self.bundle.encoding().transform(record)
    }

    fn score(&self, record: &Record, model_name: Option<&str>) -> Scored<'_> {
        let encoded = self.encode_input(record);
        let model = self.select_model(model_name);
        let raw = match model {
            Some(m) => {
                debug!(model = m.name(), requested = ?model_name, "Selected model");
                m.predict_record(&encoded)
            }
            None => Err(SalaryError::ModelNotFound(
                model_name.unwrap_or("<default>").to_string(),
            )),
        };
        Scored { model, encoded, raw }
    }

    /// Apply the output contract: finite and non-negative, or the sentinel
    fn settle(raw: Result<f64>, model: Option<&TrainedModel>) -> (f64, Option<Diagnostic>) {
        let reason = match raw {
            Ok(v) if v.is_finite() => return (v.max(0.0), None),
            Ok(v) => format!("model produced a non-finite estimate ({})", v),
            Err(e) => e.to_string(),
        };
        error!(
            model = model.map(TrainedModel::name).unwrap_or("none"),
            %reason,
            "Prediction degraded to sentinel"
        );
        (SENTINEL_ESTIMATE, Some(Diagnostic::InferenceDegraded { reason }))
    }

    /// Salary estimate for one record; never negative.
    ///
    /// Any internal failure (unknown model, shape mismatch, non-finite
    /// output) returns [`SENTINEL_ESTIMATE`] and logs the reason.
    pub fn predict(&self, record: &Record, model_name: Option<&str>) -> f64 {
        let scored = self.score(record, model_name);
        Self::settle(scored.raw, scored.model).0
    }

    /// Point estimate plus the member-dispersion band.
    ///
    /// The band is `point ± |z|·σ` over the random forest's per-tree outputs,
    /// a normal approximation rather than a calibrated interval. Linear
    /// regression and gradient boosting expose no members and yield `None`,
    /// as does a degraded prediction.
    pub fn predict_with_confidence(
        &self,
        record: &Record,
        model_name: Option<&str>,
    ) -> (f64, Option<ConfidenceInterval>) {
        let scored = self.score(record, model_name);
        let (point, degraded) = Self::settle(scored.raw, scored.model);
        if degraded.is_some() {
            return (point, None);
        }
        let interval = scored
            .model
            .and_then(|m| self.interval(m, &scored.encoded, point));
        (point, interval)
    }

    fn interval(&self, model: &TrainedModel, encoded: &EncodedRecord, point: f64) -> Option<ConfidenceInterval> {
        let members = match model.member_predictions(encoded)? {
            Ok(members) => members,
            Err(e) => {
                error!(model = model.name(), error = %e, "Could not collect member predictions");
                return None;
            }
        };
        let std_dev = stats::population_std(&members).filter(|s| s.is_finite())?;
        // Always brackets the point, whatever sign the configured z has
        let half_width = self.config.confidence_z.abs() * std_dev;
        Some(ConfidenceInterval {
            lower: (point - half_width).max(0.0),
            upper: point + half_width,
            std_dev,
            n_members: members.len(),
        })
    }

    /// Estimate, band, model name, diagnostics and market context in one call
    pub fn predict_detailed(&self, record: &Record, model_name: Option<&str>) -> PredictionResult {
        let scored = self.score(record, model_name);
        let (estimate, degraded) = Self::settle(scored.raw, scored.model);

        let interval = match degraded {
            Some(_) => None,
            None => scored
                .model
                .and_then(|m| self.interval(m, &scored.encoded, estimate)),
        };

        let mut diagnostics = scored.encoded.diagnostics;
        let is_degraded = degraded.is_some();
        diagnostics.extend(degraded);

        let market = match (&self.market, is_degraded) {
            (Some(market), false) => {
                Some(market.compare(estimate, record, self.config.benchmark_experience_window))
            }
            _ => None,
        };

        PredictionResult {
            estimate,
            interval,
            model_used: scored.model.map(|m| m.name().to_string()),
            diagnostics,
            degraded: is_degraded,
            market,
        }
    }

    /// One estimate per record, in input order
    pub fn predict_batch(&self, records: &[Record], model_name: Option<&str>) -> Vec<f64> {
        records
            .par_iter()
            .map(|record| self.predict(record, model_name))
            .collect()
    }

    /// One estimate per trained model, keyed by model name
    pub fn predict_all_models(&self, record: &Record) -> BTreeMap<String, f64> {
        self.bundle
            .model_names()
            .into_iter()
            .map(|name| (name.to_string(), self.predict(record, Some(name))))
            .collect()
    }

    /// Check a raw record against the validation rules.
    ///
    /// Pure: nothing is logged or modified. Every violation is reported.
    pub fn validate_input(&self, record: &Record) -> Vec<ValidationIssue> {
        self.config.validation.check(record)
    }

    /// Trained importances paired with the record's values, most important first.
    ///
    /// `None` for linear regression or when no model can be selected.
    pub fn explain(&self, record: &Record, model_name: Option<&str>) -> Option<Vec<FeatureImpact>> {
        let model = self.select_model(model_name)?;
        explain_record(model, self.bundle.encoding(), record)
    }

    pub fn model_info(&self) -> ModelInfo {
        let encoding = self.bundle.encoding();
        ModelInfo {
            available_models: self.bundle.model_names().iter().map(|s| s.to_string()).collect(),
            default_model: self.select_model(None).map(|m| m.name().to_string()),
            feature_order: encoding.feature_names().iter().map(|s| s.to_string()).collect(),
            encoded_fields: encoding.categories().columns().map(str::to_string).collect(),
            scaling_available: encoding.scaling().n_features() == encoding.n_features(),
            market_reference: self.market.is_some(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::inference::PredictorConfig;
    use crate::training::{ModelBank, TrainingConfig};
    use polars::prelude::*;

    const TITLES: [&str; 3] = ["Analyst", "Engineer", "Manager"];

    fn training_df() -> DataFrame {
        let n = 90;
        df!(
            "experience" => (0..n).map(|i| (i % 15) as f64).collect::<Vec<_>>(),
            "job_title" => (0..n).map(|i| TITLES[i % 3]).collect::<Vec<_>>(),
            "salary" => (0..n)
                .map(|i| 40000.0 + 2500.0 * (i % 15) as f64 + 10000.0 * (i % 3) as f64)
                .collect::<Vec<_>>()
        )
        .unwrap()
    }

    fn predictor(models: &[&str]) -> Predictor {
        let config = TrainingConfig::new()
            .with_n_estimators(10)
            .with_models(models.iter().copied());
        let outcome = ModelBank::new(config).train(&training_df()).unwrap();
        Predictor::new(outcome.bundle)
    }

    fn request() -> Record {
        Record::new().with("experience", 6).with("job_title", "Engineer")
    }

    #[test]
    fn test_default_model_priority() {
        let all = predictor(&["Linear Regression", "Random Forest", "Gradient Boosting"]);
        assert_eq!(all.select_model(None).unwrap().name(), "Gradient Boosting");

        let no_gb = predictor(&["Linear Regression", "Random Forest"]);
        assert_eq!(no_gb.select_model(None).unwrap().name(), "Random Forest");

        let lr_only = predictor(&["Linear Regression"]);
        assert_eq!(lr_only.select_model(None).unwrap().name(), "Linear Regression");
    }

    #[test]
    fn test_priority_falls_back_to_any_model() {
        let p = predictor(&["Linear Regression", "Random Forest"])
            .with_config(PredictorConfig::new().with_model_priority(["Neural Network"]));
        assert_eq!(p.select_model(None).unwrap().name(), "Linear Regression");
    }

    #[test]
    fn test_select_by_alias() {
        let p = predictor(&["Random Forest", "Gradient Boosting"]);
        assert_eq!(p.select_model(Some("rf")).unwrap().name(), "Random Forest");
        assert!(p.select_model(Some("Linear Regression")).is_none());
    }

    #[test]
    fn test_default_prediction_uses_boosting() {
        let p = predictor(&["Linear Regression", "Random Forest", "Gradient Boosting"]);
        let record = request();
        assert_eq!(
            p.predict(&record, None),
            p.predict(&record, Some("Gradient Boosting"))
        );
    }

    #[test]
    fn test_unknown_model_returns_sentinel() {
        let p = predictor(&["Linear Regression"]);
        assert_eq!(p.predict(&request(), Some("Random Forest")), SENTINEL_ESTIMATE);

        let detailed = p.predict_detailed(&request(), Some("Random Forest"));
        assert!(detailed.degraded);
        assert!(detailed.model_used.is_none());
        assert!(detailed
            .diagnostics
            .iter()
            .any(|d| matches!(d, Diagnostic::InferenceDegraded { .. })));
    }

    #[test]
    fn test_confidence_interval_for_ensembles_only() {
        let p = predictor(&["Linear Regression", "Random Forest", "Gradient Boosting"]);
        let record = request();

        let (point, interval) = p.predict_with_confidence(&record, Some("Random Forest"));
        let interval = interval.unwrap();
        assert_eq!(interval.n_members, 10);
        assert!(interval.lower <= point && point <= interval.upper);
        assert!(interval.lower >= 0.0);
        assert!(((interval.upper - point) - 1.96 * interval.std_dev).abs() < 1e-6);

        let (gb_point, gb_interval) = p.predict_with_confidence(&record, Some("Gradient Boosting"));
        assert!(gb_point > 0.0);
        assert!(gb_interval.is_none());
        assert!(p.predict_detailed(&record, None).interval.is_none());

        let (lr_point, lr_interval) = p.predict_with_confidence(&record, Some("Linear Regression"));
        assert!(lr_point >= 0.0);
        assert!(lr_interval.is_none());
    }

    #[test]
    fn test_band_brackets_point_for_negative_z() {
        let p = predictor(&["Random Forest"])
            .with_config(PredictorConfig::new().with_confidence_z(-1.96));
        let (point, interval) = p.predict_with_confidence(&request(), None);
        let interval = interval.unwrap();
        assert!(interval.lower <= point && point <= interval.upper);
        assert!(((interval.upper - point) - 1.96 * interval.std_dev).abs() < 1e-6);
    }

    #[test]
    fn test_predictions_never_negative() {
        let p = predictor(&["Linear Regression"]);
        // Far outside the training range the linear fit goes negative
        let record = Record::new().with("experience", -500).with("job_title", "Analyst");
        assert_eq!(p.predict(&record, None), 0.0);
        let (point, _) = p.predict_with_confidence(&record, None);
        assert_eq!(point, 0.0);
    }

    #[test]
    fn test_unseen_category_is_flagged() {
        let p = predictor(&["Random Forest"]);
        let record = Record::new().with("experience", 3).with("job_title", "Astronaut");
        let result = p.predict_detailed(&record, None);

        assert!(result.estimate.is_finite() && result.estimate >= 0.0);
        assert!(!result.degraded);
        assert!(result.diagnostics.iter().any(|d| matches!(
            d,
            Diagnostic::UnseenCategory { field, .. } if field == "job_title"
        )));
    }

    #[test]
    fn test_batch_preserves_order() {
        let p = predictor(&["Random Forest"]);
        let records: Vec<Record> = (0..8)
            .map(|i| Record::new().with("experience", i).with("job_title", TITLES[i as usize % 3]))
            .collect();
        let batch = p.predict_batch(&records, None);
        let single: Vec<f64> = records.iter().map(|r| p.predict(r, None)).collect();
        assert_eq!(batch, single);
    }

    #[test]
    fn test_predict_all_models() {
        let p = predictor(&["Linear Regression", "Random Forest"]);
        let all = p.predict_all_models(&request());
        assert_eq!(all.len(), 2);
        assert_eq!(all["Random Forest"], p.predict(&request(), Some("Random Forest")));
    }

    #[test]
    fn test_explain_uses_model_importances_and_request_values() {
        let p = predictor(&["Linear Regression", "Random Forest"]);
        let record = request();

        assert!(p.explain(&record, Some("Linear Regression")).is_none());

        let impacts = p.explain(&record, Some("Random Forest")).unwrap();
        assert_eq!(impacts.len(), 2);
        assert!(impacts[0].importance >= impacts[1].importance);
        let total: f64 = impacts.iter().map(|i| i.importance).sum();
        assert!((total - 1.0).abs() < 1e-9);
        let title = impacts.iter().find(|i| i.feature == "job_title").unwrap();
        assert_eq!(title.value, record.get("job_title").cloned());
    }

    #[test]
    fn test_market_comparison_attached() {
        let market = MarketReference::from_dataset(&training_df(), "salary").unwrap();
        let p = predictor(&["Random Forest"]).with_market_reference(market);
        let result = p.predict_detailed(&request(), None);

        let comparison = result.market.unwrap();
        assert!(comparison.percentile_rank >= 0.0 && comparison.percentile_rank <= 100.0);
        assert!(comparison.benchmark.unwrap().sample_size > 0);
        assert!(result.interval.is_some());
    }

    #[test]
    fn test_model_info() {
        let p = predictor(&["Linear Regression", "Gradient Boosting"]);
        let info = p.model_info();
        assert_eq!(info.available_models, vec!["Gradient Boosting", "Linear Regression"]);
        assert_eq!(info.default_model.as_deref(), Some("Gradient Boosting"));
        assert_eq!(info.feature_order, vec!["experience", "job_title"]);
        assert_eq!(info.encoded_fields, vec!["job_title"]);
        assert!(info.scaling_available);
        assert!(!info.market_reference);
    }
}
