//! Inference configuration

use crate::training::ModelKind;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Plausibility rules checked by [`Predictor::validate_input`](super::Predictor::validate_input)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ValidationRules {
    /// Fields that must be present and non-null
    pub required_fields: Vec<String>,
    /// Allowed values of categorical fields, checked when the field is present
    pub allowed_categories: BTreeMap<String, Vec<String>>,
    /// Inclusive age bounds
    pub age_range: (f64, f64),
    pub min_experience: f64,
}

impl Default for ValidationRules {
    fn default() -> Self {
        let owned = |values: &[&str]| values.iter().map(|v| v.to_string()).collect::<Vec<_>>();

        let allowed_categories = BTreeMap::from([
            (
                "education".to_string(),
                owned(&["High School", "Bachelor's", "Master's", "PhD"]),
            ),
            ("gender".to_string(), owned(&["Male", "Female", "Other"])),
            ("remote_work".to_string(), owned(&["Yes", "No", "Hybrid"])),
            (
                "company_size".to_string(),
                owned(&[
                    "Small (1-50)",
                    "Medium (51-200)",
                    "Large (201-1000)",
                    "Enterprise (1000+)",
                ]),
            ),
        ]);

        Self {
            required_fields: owned(&["experience", "education", "job_title", "location", "industry"]),
            allowed_categories,
            age_range: (18.0, 100.0),
            min_experience: 0.0,
        }
    }
}

impl ValidationRules {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder method to replace the required fields
    pub fn with_required_fields<I, S>(mut self, fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.required_fields = fields.into_iter().map(Into::into).collect();
        self
    }

    /// Builder method to set the allowed values of one field
    pub fn with_allowed<I, S>(mut self, field: impl Into<String>, values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.allowed_categories
            .insert(field.into(), values.into_iter().map(Into::into).collect());
        self
    }

    pub fn with_age_range(mut self, min: f64, max: f64) -> Self {
        self.age_range = (min, max);
        self
    }
}

/// Configuration for the predictor
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PredictorConfig {
    /// Model names tried in order when the caller names none
    pub model_priority: Vec<String>,
    /// Normal quantile of the member-dispersion band
    pub confidence_z: f64,
    pub validation: ValidationRules,
    /// Experience tolerance, in years, when benchmarking similar profiles
    pub benchmark_experience_window: f64,
}

impl Default for PredictorConfig {
    fn default() -> Self {
        Self {
            model_priority: [
                ModelKind::GradientBoosting,
                ModelKind::RandomForest,
                ModelKind::LinearRegression,
            ]
            .iter()
            .map(|k| k.name().to_string())
            .collect(),
            confidence_z: 1.96,
            validation: ValidationRules::default(),
            benchmark_experience_window: 2.0,
        }
    }
}

impl PredictorConfig {
    /// Create a new predictor configuration
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder method to set the model priority
    pub fn with_model_priority<I, S>(mut self, priority: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.model_priority = priority.into_iter().map(Into::into).collect();
        self
    }

    /// Builder method to set the band width in standard deviations
    pub fn with_confidence_z(mut self, z: f64) -> Self {
        self.confidence_z = z;
        self
    }

    pub fn with_validation(mut self, rules: ValidationRules) -> Self {
        self.validation = rules;
        self
    }

    pub fn with_benchmark_window(mut self, years: f64) -> Self {
        self.benchmark_experience_window = years;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_priority() {
        let config = PredictorConfig::default();
        assert_eq!(
            config.model_priority,
            vec!["Gradient Boosting", "Random Forest", "Linear Regression"]
        );
        assert_eq!(config.confidence_z, 1.96);
        assert_eq!(config.benchmark_experience_window, 2.0);
    }

    #[test]
    fn test_default_rules() {
        let rules = ValidationRules::default();
        assert_eq!(rules.required_fields.len(), 5);
        assert_eq!(rules.age_range, (18.0, 100.0));
        assert_eq!(rules.allowed_categories["education"].len(), 4);
        assert!(rules.allowed_categories["remote_work"].contains(&"Hybrid".to_string()));
    }

    #[test]
    fn test_builders() {
        let rules = ValidationRules::new()
            .with_required_fields(["experience"])
            .with_allowed("gender", ["X"])
            .with_age_range(16.0, 70.0);
        let config = PredictorConfig::new()
            .with_model_priority(["Random Forest"])
            .with_validation(rules.clone());

        assert_eq!(config.model_priority, vec!["Random Forest"]);
        assert_eq!(config.validation, rules);
        assert_eq!(config.validation.allowed_categories["gender"], vec!["X"]);
    }
}
