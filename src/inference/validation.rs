//! Input validation for prediction requests

use crate::preprocessing::Record;
use super::ValidationRules;
use serde::{Deserialize, Serialize};
use std::fmt;

/// One rule violated by a prediction request
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum ValidationIssue {
    MissingField { field: String },
    NotNumeric { field: String, value: String },
    OutOfRange { field: String, value: f64, min: f64, max: Option<f64> },
    NotAllowed { field: String, value: String },
}

impl ValidationIssue {
    pub fn field(&self) -> &str {
        match self {
            ValidationIssue::MissingField { field }
            | ValidationIssue::NotNumeric { field, .. }
            | ValidationIssue::OutOfRange { field, .. }
            | ValidationIssue::NotAllowed { field, .. } => field,
        }
    }
}

impl fmt::Display for ValidationIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ValidationIssue::MissingField { field } => write!(f, "Missing required field: {}", field),
            ValidationIssue::NotNumeric { field, value } => {
                write!(f, "{} must be a number, got '{}'", field, value)
            }
            ValidationIssue::OutOfRange { field, value, min, max: Some(max) } => {
                write!(f, "{} must be between {} and {}, got {}", field, min, max, value)
            }
            ValidationIssue::OutOfRange { field, value, min, max: None } => {
                write!(f, "{} must be at least {}, got {}", field, min, value)
            }
            ValidationIssue::NotAllowed { field, value } => {
                write!(f, "Invalid value for {}: {}", field, value)
            }
        }
    }
}

fn check_number(
    record: &Record,
    field: &str,
    min: f64,
    max: Option<f64>,
    issues: &mut Vec<ValidationIssue>,
) {
    let Some(value) = record.get(field) else {
        return;
    };
    match value.as_f64() {
        None => issues.push(ValidationIssue::NotNumeric {
            field: field.to_string(),
            value: value.to_string(),
        }),
        Some(x) if x < min || max.is_some_and(|m| x > m) => {
            issues.push(ValidationIssue::OutOfRange { field: field.to_string(), value: x, min, max })
        }
        Some(_) => {}
    }
}

impl ValidationRules {
    /// Every violation in `record`, in rule order
    pub fn check(&self, record: &Record) -> Vec<ValidationIssue> {
        let mut issues: Vec<ValidationIssue> = self
            .required_fields
            .iter()
            .filter(|field| !record.contains(field))
            .map(|field| ValidationIssue::MissingField { field: field.clone() })
            .collect();

        check_number(record, "age", self.age_range.0, Some(self.age_range.1), &mut issues);
        check_number(record, "experience", self.min_experience, None, &mut issues);

        for (field, allowed) in &self.allowed_categories {
            let Some(value) = record.get(field) else {
                continue;
            };
            let text = value.to_string();
            if !allowed.iter().any(|a| *a == text) {
                issues.push(ValidationIssue::NotAllowed { field: field.clone(), value: text });
            }
        }

        issues
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn valid() -> Record {
        Record::new()
            .with("experience", 5)
            .with("education", "Bachelor's")
            .with("job_title", "Software Engineer")
            .with("location", "New York, NY")
            .with("industry", "Technology")
    }

    #[test]
    fn test_valid_record() {
        assert!(ValidationRules::default().check(&valid()).is_empty());
    }

    #[test]
    fn test_empty_record_names_every_required_field() {
        let issues = ValidationRules::default().check(&Record::new());
        let fields: Vec<&str> = issues.iter().map(ValidationIssue::field).collect();
        assert_eq!(fields, vec!["experience", "education", "job_title", "location", "industry"]);
        assert!(issues.iter().all(|i| matches!(i, ValidationIssue::MissingField { .. })));
    }

    #[test]
    fn test_reports_all_violations() {
        let record = valid()
            .with("age", 12)
            .with("experience", -1)
            .with("education", "Bootcamp")
            .with("remote_work", "Sometimes");
        let issues = ValidationRules::default().check(&record);

        assert_eq!(issues.len(), 4);
        assert!(issues.contains(&ValidationIssue::OutOfRange {
            field: "age".to_string(),
            value: 12.0,
            min: 18.0,
            max: Some(100.0),
        }));
        assert!(issues.iter().any(|i| i.to_string() == "Invalid value for education: Bootcamp"));
        assert!(issues.iter().any(|i| i.field() == "remote_work"));
    }

    #[test]
    fn test_non_numeric_and_null() {
        let record = valid().with("age", "thirty").with("education", None::<&str>);
        let issues = ValidationRules::default().check(&record);

        assert_eq!(issues.len(), 2);
        assert_eq!(issues[0], ValidationIssue::MissingField { field: "education".to_string() });
        assert!(matches!(&issues[1], ValidationIssue::NotNumeric { field, .. } if field == "age"));
    }

    #[test]
    fn test_age_bounds_inclusive() {
        let rules = ValidationRules::default();
        assert!(rules.check(&valid().with("age", 18)).is_empty());
        assert!(rules.check(&valid().with("age", 100)).is_empty());
        assert_eq!(rules.check(&valid().with("age", 101)).len(), 1);
    }
}
