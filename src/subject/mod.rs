//! # Subject
//!
//! The entity under decision: a loan application or a transaction.
//!
//! The pipeline treats a subject as an opaque bag of named scalar fields.
//! Upstream adapters (CSV row, JSON request body) convert into this type at
//! the boundary; nothing downstream branches on the input shape. Accessors
//! default on missing fields (numeric ⇒ 0, string ⇒ empty, flag ⇒ false) so
//! reason derivation stays total.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// A single scalar field value.
///
/// Untagged so the JSON forms `true`, `42.5` and `"Yes"` round-trip naturally.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FieldValue {
    /// Boolean flag
    Bool(bool),
    /// Numeric field (integers widen to f64)
    Number(f64),
    /// Free-form text field
    Text(String),
}

impl From<bool> for FieldValue {
    fn from(v: bool) -> Self {
        FieldValue::Bool(v)
    }
}

impl From<f64> for FieldValue {
    fn from(v: f64) -> Self {
        FieldValue::Number(v)
    }
}

impl From<i64> for FieldValue {
    fn from(v: i64) -> Self {
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

/// The subject bag: named scalar fields, deterministically ordered.
///
/// `BTreeMap` keeps serialization stable, which matters for the audit
/// snapshot (the same subject always produces the same persisted bytes).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Subject {
    fields: BTreeMap<String, FieldValue>,
}

impl Subject {
    /// Create an empty subject.
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style field insertion.
    pub fn with(mut self, key: impl Into<String>, value: impl Into<FieldValue>) -> Self {
        self.fields.insert(key.into(), value.into());
        self
    }

    /// Insert or replace a field.
    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<FieldValue>) {
        self.fields.insert(key.into(), value.into());
    }

    /// Raw field lookup.
    pub fn get(&self, key: &str) -> Option<&FieldValue> {
        self.fields.get(key)
    }

    /// Numeric accessor with defaulting.
    ///
    /// Missing key ⇒ 0.0. Text that parses as a number is accepted
    /// (CSV adapters produce stringly-typed rows); anything else ⇒ 0.0.
    pub fn num(&self, key: &str) -> f64 {
        match self.fields.get(key) {
            Some(FieldValue::Number(n)) => *n,
            Some(FieldValue::Bool(b)) => {
                if *b {
                    1.0
                } else {
                    0.0
                }
            }
            Some(FieldValue::Text(s)) => s.trim().parse().unwrap_or(0.0),
            None => 0.0,
        }
    }

    /// Text accessor with defaulting: missing or non-text key ⇒ "".
    pub fn text(&self, key: &str) -> &str {
        match self.fields.get(key) {
            Some(FieldValue::Text(s)) => s.as_str(),
            _ => "",
        }
    }

    /// Flag accessor with defaulting: missing key ⇒ false.
    ///
    /// Accepts `true`, nonzero numbers, and the strings "yes"/"true"/"1"
    /// (case-insensitive) — the source data encodes self-employment as
    /// the literal string "Yes".
    pub fn flag(&self, key: &str) -> bool {
        match self.fields.get(key) {
            Some(FieldValue::Bool(b)) => *b,
            Some(FieldValue::Number(n)) => *n != 0.0,
            Some(FieldValue::Text(s)) => {
                matches!(s.trim().to_ascii_lowercase().as_str(), "yes" | "true" | "1")
            }
            None => false,
        }
    }

    /// Convert a JSON object into a subject.
    ///
    /// Only scalar members are kept; nested objects, arrays and nulls are
    /// dropped (the audit schema flattens scalar fields only). Non-object
    /// values yield `None`.
    pub fn from_json(value: &serde_json::Value) -> Option<Self> {
        let obj = value.as_object()?;
        let mut subject = Subject::new();
        for (key, member) in obj {
            match member {
                serde_json::Value::Bool(b) => subject.insert(key.clone(), *b),
                serde_json::Value::Number(n) => {
                    if let Some(f) = n.as_f64() {
                        subject.insert(key.clone(), f);
                    }
                }
                serde_json::Value::String(s) => subject.insert(key.clone(), s.clone()),
                _ => {}
            }
        }
        Some(subject)
    }

    /// Iterate over fields in key order.
    pub fn iter(&self) -> impl Iterator<Item = (&String, &FieldValue)> {
        self.fields.iter()
    }

    /// Number of fields.
    pub fn len(&self) -> usize {
        self.fields.len()
    }

    /// Whether the bag is empty.
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_fields_default() {
        let subject = Subject::new();
        assert_eq!(subject.num("cibil_score"), 0.0);
        assert_eq!(subject.text("applicant_name"), "");
        assert!(!subject.flag("self_employed"));
    }

    #[test]
    fn test_numeric_accessor_parses_text() {
        let subject = Subject::new()
            .with("loan_amount", 400_000.0)
            .with("income_annum", "500000")
            .with("note", "not a number");
        assert_eq!(subject.num("loan_amount"), 400_000.0);
        assert_eq!(subject.num("income_annum"), 500_000.0);
        assert_eq!(subject.num("note"), 0.0);
    }

    #[test]
    fn test_flag_accepts_yes_string() {
        let subject = Subject::new()
            .with("self_employed", "Yes")
            .with("education", "Graduate");
        assert!(subject.flag("self_employed"));
        assert!(!subject.flag("education"));

        let subject = Subject::new().with("self_employed", "No");
        assert!(!subject.flag("self_employed"));
    }

    #[test]
    fn test_from_json_keeps_scalars_only() {
        let value = serde_json::json!({
            "amount": 1234.56,
            "type": "TRANSFER",
            "flagged": true,
            "nested": {"ignored": 1},
            "tags": ["ignored"],
            "missing": null
        });
        let subject = Subject::from_json(&value).unwrap();
        assert_eq!(subject.len(), 3);
        assert_eq!(subject.num("amount"), 1234.56);
        assert_eq!(subject.text("type"), "TRANSFER");
        assert!(subject.flag("flagged"));
    }

    #[test]
    fn test_from_json_rejects_non_object() {
        assert!(Subject::from_json(&serde_json::json!([1, 2, 3])).is_none());
        assert!(Subject::from_json(&serde_json::json!("plain")).is_none());
    }

    #[test]
    fn test_serialization_is_deterministic() {
        let subject = Subject::new()
            .with("zeta", 1.0)
            .with("alpha", "x")
            .with("mid", true);
        let a = serde_json::to_string(&subject).unwrap();
        let b = serde_json::to_string(&subject.clone()).unwrap();
        assert_eq!(a, b);
        // BTreeMap ordering: alpha before mid before zeta
        assert!(a.find("alpha").unwrap() < a.find("zeta").unwrap());
    }

    #[test]
    fn test_json_roundtrip() {
        let subject = Subject::new()
            .with("cibil_score", 450.0)
            .with("self_employed", "No")
            .with("flagged", false);
        let json = serde_json::to_string(&subject).unwrap();
        let back: Subject = serde_json::from_str(&json).unwrap();
        assert_eq!(subject, back);
    }
}
