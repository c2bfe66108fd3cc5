//! Call leg view
//!
//! A leg is one SIP dialog record seen from one signalling vantage point.
//! The store document is opaque; this view materializes exactly the fields
//! the correlation engine reads. A missing required field marks the record
//! malformed and the record is skipped, never fatal.

use crate::domain::document::Document;
use crate::domain::shared::SearchError;
use serde::Serialize;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CallLeg {
    pub call_id: String,
    /// Operator-inserted cross-correlation header, when present
    pub x_call_id: Option<String>,
    pub caller: String,
    pub callee: String,
    /// Milliseconds since epoch
    pub created_at: i64,
    pub terminated_at: Option<i64>,
    pub state: String,
    pub duration: Option<i64>,
    pub error_code: Option<String>,
    pub src_addr: String,
    pub dst_addr: String,
    pub src_host: Option<String>,
    pub dst_host: Option<String>,
}

impl CallLeg {
    /// Read a leg out of a `sip_call_index` document
    pub fn from_document(doc: &Document) -> Result<Self, SearchError> {
        Ok(Self {
            call_id: required_str(doc, "call_id")?,
            x_call_id: doc.str_field("x_call_id").map(str::to_string),
            caller: required_str(doc, "caller")?,
            callee: required_str(doc, "callee")?,
            created_at: doc
                .i64_field("created_at")
                .ok_or_else(|| SearchError::MalformedDocument("created_at".to_string()))?,
            terminated_at: doc.i64_field("terminated_at"),
            state: required_str(doc, "state")?,
            duration: doc.i64_field("duration"),
            error_code: doc.str_field("error_code").map(str::to_string),
            src_addr: required_str(doc, "src_addr")?,
            dst_addr: required_str(doc, "dst_addr")?,
            src_host: doc.str_field("src_host").map(str::to_string),
            dst_host: doc.str_field("dst_host").map(str::to_string),
        })
    }

    /// Storage and tie-break order of legs within a correlated call
    pub fn sort_key(&self) -> (i64, String) {
        (self.created_at, self.dst_addr.clone())
    }
}

fn required_str(doc: &Document, field: &str) -> Result<String, SearchError> {
    doc.str_field(field)
        .map(str::to_string)
        .ok_or_else(|| SearchError::MalformedDocument(field.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn leg_document() -> Document {
        Document::from_value(json!({
            "call_id": "A",
            "caller": "alice",
            "callee": "bob",
            "created_at": 1000,
            "terminated_at": 1200,
            "state": "answered",
            "duration": 200,
            "src_addr": "1.1.1.1",
            "dst_addr": "2.2.2.2",
        }))
        .unwrap()
    }

    #[test]
    fn test_full_leg() {
        let leg = CallLeg::from_document(&leg_document()).unwrap();

        assert_eq!(leg.call_id, "A");
        assert_eq!(leg.caller, "alice");
        assert_eq!(leg.created_at, 1000);
        assert_eq!(leg.terminated_at, Some(1200));
        assert_eq!(leg.duration, Some(200));
        assert_eq!(leg.x_call_id, None);
        assert_eq!(leg.src_host, None);
    }

    #[test]
    fn test_missing_required_field() {
        let mut doc = leg_document();
        doc.set("call_id", serde_json::Value::Null);

        match CallLeg::from_document(&doc) {
            Err(SearchError::MalformedDocument(field)) => assert_eq!(field, "call_id"),
            other => panic!("expected MalformedDocument, got {:?}", other),
        }
    }

    #[test]
    fn test_sort_key() {
        let leg = CallLeg::from_document(&leg_document()).unwrap();
        assert_eq!(leg.sort_key(), (1000, "2.2.2.2".to_string()));
    }
}
