//! Opaque store documents
//!
//! Records come out of the document store as untyped key-value maps. The
//! search core never deserializes them into fixed structs up front; it reads
//! individual fields through the narrow accessors here, with explicit
//! optionality for every field.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// A single document from the store
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Document(Map<String, Value>);

impl Document {
    pub fn new() -> Self {
        Self(Map::new())
    }

    /// Wrap a JSON value, if it is an object
    pub fn from_value(value: Value) -> Option<Self> {
        match value {
            Value::Object(map) => Some(Self(map)),
            _ => None,
        }
    }

    pub fn get(&self, field: &str) -> Option<&Value> {
        self.0.get(field)
    }

    pub fn set(&mut self, field: impl Into<String>, value: Value) {
        self.0.insert(field.into(), value);
    }

    /// String field, `None` when absent, null, or not a string
    pub fn str_field(&self, field: &str) -> Option<&str> {
        self.0.get(field).and_then(Value::as_str)
    }

    /// Integer field (millisecond timestamps, durations)
    pub fn i64_field(&self, field: &str) -> Option<i64> {
        self.0.get(field).and_then(Value::as_i64)
    }

    pub fn f64_field(&self, field: &str) -> Option<f64> {
        self.0.get(field).and_then(Value::as_f64)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl From<Map<String, Value>> for Document {
    fn from(map: Map<String, Value>) -> Self {
        Self(map)
    }
}

impl From<Document> for Value {
    fn from(doc: Document) -> Self {
        Value::Object(doc.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_typed_accessors() {
        let doc = Document::from_value(json!({
            "call_id": "abc",
            "created_at": 1000,
            "mos": 3.5,
            "terminated_at": null,
        }))
        .unwrap();

        assert_eq!(doc.str_field("call_id"), Some("abc"));
        assert_eq!(doc.i64_field("created_at"), Some(1000));
        assert_eq!(doc.f64_field("mos"), Some(3.5));
        assert_eq!(doc.i64_field("terminated_at"), None);
        assert_eq!(doc.str_field("missing"), None);
    }

    #[test]
    fn test_from_value_rejects_non_objects() {
        assert!(Document::from_value(json!("scalar")).is_none());
        assert!(Document::from_value(json!([1, 2])).is_none());
        assert!(Document::from_value(json!({})).is_some());
    }

    #[test]
    fn test_wrong_type_reads_as_absent() {
        let doc = Document::from_value(json!({"created_at": "not-a-number"})).unwrap();
        assert_eq!(doc.i64_field("created_at"), None);
        assert_eq!(doc.str_field("created_at"), Some("not-a-number"));
    }
}
