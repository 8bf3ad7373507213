//! Encoder configuration

use serde::{Deserialize, Serialize};

/// Default label column name
pub const DEFAULT_LABEL: &str = "salary";

/// Which columns the encoder reads
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EncoderConfig {
    /// Numeric label column
    pub label_column: String,

    /// Declared feature columns, in encoding order (None = every column except the label)
    pub feature_columns: Option<Vec<String>>,
}

impl Default for EncoderConfig {
    fn default() -> Self {
        Self {
            label_column: DEFAULT_LABEL.to_string(),
            feature_columns: None,
        }
    }
}

impl EncoderConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder method to set the label column
    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label_column = label.into();
        self
    }

    /// Builder method to declare the feature columns and their order
    pub fn with_features<I, S>(mut self, features: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.feature_columns = Some(features.into_iter().map(Into::into).collect());
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = EncoderConfig::default();
        assert_eq!(config.label_column, "salary");
        assert!(config.feature_columns.is_none());
    }

    #[test]
    fn test_builder_pattern() {
        let config = EncoderConfig::new()
            .with_label("income")
            .with_features(["experience", "education"]);

        assert_eq!(config.label_column, "income");
        assert_eq!(
            config.feature_columns,
            Some(vec!["experience".to_string(), "education".to_string()])
        );
    }
}
