//! Non-fatal inference diagnostics
//!
//! Encoding substitutions and degraded predictions are reported as values,
//! never as errors, so a single unusual request cannot fail a caller.

use serde::{Deserialize, Serialize};
use std::fmt;

/// A recoverable problem observed while encoding or scoring a record
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Diagnostic {
    /// Categorical value absent from the training vocabulary
    UnseenCategory {
        field: String,
        value: String,
        substitute: String,
    },
    /// Required feature absent from the record (or null)
    MissingField { field: String, default: String },
    /// Value present but unusable for the field's type (e.g. text in a numeric field)
    InvalidValue {
        field: String,
        value: String,
        substitute: String,
    },
    /// Prediction fell back to the sentinel estimate
    InferenceDegraded { reason: String },
}

impl Diagnostic {
    /// True for the encoding-time substitutions (unseen, missing, invalid)
    pub fn is_encoding_warning(&self) -> bool {
        !matches!(self, Diagnostic::InferenceDegraded { .. })
    }

    /// Field the diagnostic refers to, if any
    pub fn field(&self) -> Option<&str> {
        match self {
            Diagnostic::UnseenCategory { field, .. }
            | Diagnostic::MissingField { field, .. }
            | Diagnostic::InvalidValue { field, .. } => Some(field),
            Diagnostic::InferenceDegraded { .. } => None,
        }
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Diagnostic::UnseenCategory { field, value, substitute } => write!(
                f,
                "unseen value '{}' for {}, substituted '{}'",
                value, field, substitute
            ),
            Diagnostic::MissingField { field, default } => {
                write!(f, "missing field {}, used default '{}'", field, default)
            }
            Diagnostic::InvalidValue { field, value, substitute } => write!(
                f,
                "invalid value '{}' for {}, substituted '{}'",
                value, field, substitute
            ),
            Diagnostic::InferenceDegraded { reason } => {
                write!(f, "inference degraded: {}", reason)
            }
        }
    }
}
