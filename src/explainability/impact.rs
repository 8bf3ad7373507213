//! Feature impact: trained importances paired with the request's own values

use crate::preprocessing::{FieldValue, FittedEncoding, Record};
use crate::training::TrainedModel;
use serde::{Deserialize, Serialize};
use std::fmt;

/// One feature's share of a tree ensemble's importance
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeatureImpact {
    pub feature: String,
    /// Normalized importance learned at training time
    pub importance: f64,
    /// Value of the feature in the explained request; `None` when absent
    pub value: Option<FieldValue>,
}

impl fmt::Display for FeatureImpact {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.value {
            Some(v) => write!(f, "{} = {} ({:.3})", self.feature, v, self.importance),
            None => write!(f, "{} = N/A ({:.3})", self.feature, self.importance),
        }
    }
}

/// Ordered importance list for `record`, most important first.
///
/// `None` when the model has no importances (linear regression). Features
/// with equal importance keep the encoding order.
pub fn explain_record(
    model: &TrainedModel,
    encoding: &FittedEncoding,
    record: &Record,
) -> Option<Vec<FeatureImpact>> {
    let importances = model.feature_importances()?;

    let mut impacts: Vec<FeatureImpact> = encoding
        .features()
        .iter()
        .zip(importances.iter())
        .map(|(spec, &importance)| FeatureImpact {
            feature: spec.name.clone(),
            importance,
            value: record.get(&spec.name).cloned(),
        })
        .collect();

    impacts.sort_by(|a, b| {
        b.importance
            .partial_cmp(&a.importance)
            .unwrap_or(std::cmp::Ordering::Equal)
    });
    Some(impacts)
}

/// The `k` most important entries
pub fn top_k(impacts: &[FeatureImpact], k: usize) -> &[FeatureImpact] {
    &impacts[..k.min(impacts.len())]
}
