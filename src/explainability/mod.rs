//! Model explainability module
//!
//! Tree ensembles expose normalized impurity-based importances; an
//! explanation lists them next to the values of the explained request.

mod impact;

pub use impact::{explain_record, top_k, FeatureImpact};
