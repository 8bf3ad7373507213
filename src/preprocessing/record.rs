//! Raw input records

use crate::error::Result;
use super::RawColumn;
use polars::prelude::*;
use serde::{Deserialize, Serialize};
use std::borrow::Cow;
use std::collections::BTreeMap;
use std::fmt;

/// A single raw field value
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FieldValue {
    Number(f64),
    Text(String),
    Null,
}

impl FieldValue {
    /// Numeric view of the value. Text is parsed; non-finite numbers are rejected.
    pub fn as_f64(&self) -> Option<f64> {
        let v = match self {
            FieldValue::Number(v) => *v,
            FieldValue::Text(s) => s.trim().parse::<f64>().ok()?,
            FieldValue::Null => return None,
        };
        v.is_finite().then_some(v)
    }

    /// Text view of the value. Integral numbers render without a fractional part.
    pub fn as_text(&self) -> Option<Cow<'_, str>> {
        match self {
            FieldValue::Text(s) => Some(Cow::Borrowed(s.as_str())),
            FieldValue::Number(v) if v.is_finite() && v.fract() == 0.0 && v.abs() < 1e15 => {
                Some(Cow::Owned(format!("{}", *v as i64)))
            }
            FieldValue::Number(v) => Some(Cow::Owned(v.to_string())),
            FieldValue::Null => None,
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, FieldValue::Null)
    }
}

impl fmt::Display for FieldValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.as_text() {
            Some(text) => f.write_str(&text),
            None => f.write_str("null"),
        }
    }
}

impl From<f64> for FieldValue {
    fn from(v: f64) -> Self {
        FieldValue::Number(v)
    }
}

impl From<f32> for FieldValue {
    fn from(v: f32) -> Self {
        FieldValue::Number(v as f64)
    }
}

impl From<i32> for FieldValue {
    fn from(v: i32) -> Self {
        FieldValue::Number(v as f64)
    }
}

impl From<i64> for FieldValue {
    fn from(v: i64) -> Self {
        FieldValue::Number(v as f64)
    }
}

impl From<u32> for FieldValue {
    fn from(v: u32) -> Self {
        FieldValue::Number(v as f64)
    }
}

impl From<&str> for FieldValue {
    fn from(v: &str) -> Self {
        FieldValue::Text(v.to_string())
    }
}

impl From<String> for FieldValue {
    fn from(v: String) -> Self {
        FieldValue::Text(v)
    }
}

impl<T: Into<FieldValue>> From<Option<T>> for FieldValue {
    fn from(v: Option<T>) -> Self {
        v.map(Into::into).unwrap_or(FieldValue::Null)
    }
}

/// One row of named field values, as submitted for prediction
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Record {
    fields: BTreeMap<String, FieldValue>,
}

impl Record {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder method to set a field
    pub fn with(mut self, name: impl Into<String>, value: impl Into<FieldValue>) -> Self {
        self.fields.insert(name.into(), value.into());
        self
    }

    pub fn insert(&mut self, name: impl Into<String>, value: impl Into<FieldValue>) {
        self.fields.insert(name.into(), value.into());
    }

    /// Field value; nulls are reported as absent
    pub fn get(&self, name: &str) -> Option<&FieldValue> {
        self.fields.get(name).filter(|v| !v.is_null())
    }

    pub fn contains(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &FieldValue)> {
        self.fields.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Parse a record from a JSON object
    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }
}

impl<K: Into<String>, V: Into<FieldValue>> FromIterator<(K, V)> for Record {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self {
            fields: iter.into_iter().map(|(k, v)| (k.into(), v.into())).collect(),
        }
    }
}

/// Split a DataFrame into one [`Record`] per row.
/// String columns become text values, everything else is read as `f64`.
pub fn records_from_frame(df: &DataFrame) -> Result<Vec<Record>> {
    let mut records = vec![Record::new(); df.height()];

    for name in df.get_column_names() {
        let name = name.to_string();
        match RawColumn::read(df, &name)? {
            RawColumn::Numeric(values) => {
                for (record, value) in records.iter_mut().zip(values) {
                    record.insert(name.clone(), value);
                }
            }
            RawColumn::Categorical(values) => {
                for (record, value) in records.iter_mut().zip(values) {
                    record.insert(name.clone(), value);
                }
            }
        }
    }

    Ok(records)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_field_value_views() {
        assert_eq!(FieldValue::from(5).as_f64(), Some(5.0));
        assert_eq!(FieldValue::from(" 7.5 ").as_f64(), Some(7.5));
        assert_eq!(FieldValue::from("senior").as_f64(), None);
        assert_eq!(FieldValue::from(f64::NAN).as_f64(), None);
        assert_eq!(FieldValue::from(3.0).as_text().as_deref(), Some("3"));
        assert_eq!(FieldValue::Null.as_text(), None);
    }

    #[test]
    fn test_record_null_is_absent() {
        let record = Record::new()
            .with("experience", 5)
            .with("education", None::<&str>);

        assert!(record.contains("experience"));
        assert!(!record.contains("education"));
        assert_eq!(record.len(), 2);
    }

    #[test]
    fn test_record_from_json() {
        let record = Record::from_json(
            r#"{"experience": 5, "education": "Bachelor's", "age": null}"#,
        )
        .unwrap();

        assert_eq!(record.get("experience"), Some(&FieldValue::Number(5.0)));
        assert_eq!(
            record.get("education"),
            Some(&FieldValue::Text("Bachelor's".to_string()))
        );
        assert!(record.get("age").is_none());
    }

    #[test]
    fn test_records_from_frame() {
        let df = df!(
            "experience" => &[1.0, 2.0],
            "education" => &["PhD", "Bachelor's"]
        )
        .unwrap();

        let records = records_from_frame(&df).unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(records[1].get("experience"), Some(&FieldValue::Number(2.0)));
        assert_eq!(
            records[0].get("education"),
            Some(&FieldValue::Text("PhD".to_string()))
        );
    }
}
