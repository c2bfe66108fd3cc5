//! Store adapter port
//!
//! The document store is reached through the `SessionStore` trait defined
//! here and implemented in the infrastructure layer. Callers hand over a
//! logical collection name, a time partition hint, and a filter expression;
//! they get back a lazy stream of matching documents in insertion order.

use crate::domain::document::Document;
use crate::domain::shared::Result;
use async_trait::async_trait;
use futures::stream::Stream;
use serde_json::Value;
use std::collections::BTreeSet;
use std::pin::Pin;

/// SIP call legs
pub const SIP_CALL_INDEX: &str = "sip_call_index";
/// RTP periodic report records
pub const RTPR_RTP_INDEX: &str = "rtpr_rtp_index";
/// RTCP periodic report records
pub const RTPR_RTCP_INDEX: &str = "rtpr_rtcp_index";
/// Attribute descriptors (logical prefix)
pub const ATTRIBUTES: &str = "attributes";

/// Lazy document sequence; a store failure surfaces as a terminal `Err` item
pub type DocumentStream = Pin<Box<dyn Stream<Item = Result<Document>> + Send>>;

/// Inclusive millisecond-epoch window used to select physical shards
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimeRange {
    pub from: i64,
    pub to: i64,
}

impl TimeRange {
    pub const ALL: TimeRange = TimeRange {
        from: i64::MIN,
        to: i64::MAX,
    };

    pub fn new(from: i64, to: i64) -> Self {
        Self { from, to }
    }

    pub fn contains(&self, instant: i64) -> bool {
        self.from <= instant && instant <= self.to
    }
}

/// Filter expression evaluated by the store
#[derive(Debug, Clone, PartialEq)]
pub enum Filter {
    /// Matches every document
    All,
    Eq(String, Value),
    Ne(String, Value),
    Gt(String, Value),
    Lt(String, Value),
    Gte(String, Value),
    Lte(String, Value),
    /// Substring match on a string field
    Contains(String, String),
    /// Field equals any of the listed values
    In(String, Vec<Value>),
    And(Vec<Filter>),
    Or(Vec<Filter>),
}

impl Filter {
    /// Inclusive range filter on an integer field
    pub fn between(field: &str, from: i64, to: i64) -> Filter {
        Filter::And(vec![
            Filter::Gte(field.to_string(), Value::from(from)),
            Filter::Lte(field.to_string(), Value::from(to)),
        ])
    }

    /// Evaluate against a document
    ///
    /// A predicate on an absent field never matches, `Ne` included: a record
    /// that does not carry the field asserts nothing about it.
    pub fn matches(&self, doc: &Document) -> bool {
        match self {
            Filter::All => true,
            Filter::Eq(field, value) => doc.get(field).is_some_and(|v| values_eq(v, value)),
            Filter::Ne(field, value) => doc.get(field).is_some_and(|v| !values_eq(v, value)),
            Filter::Gt(field, value) => cmp_field(doc, field, value)
                .is_some_and(|o| o == std::cmp::Ordering::Greater),
            Filter::Lt(field, value) => {
                cmp_field(doc, field, value).is_some_and(|o| o == std::cmp::Ordering::Less)
            }
            Filter::Gte(field, value) => {
                cmp_field(doc, field, value).is_some_and(|o| o != std::cmp::Ordering::Less)
            }
            Filter::Lte(field, value) => {
                cmp_field(doc, field, value).is_some_and(|o| o != std::cmp::Ordering::Greater)
            }
            Filter::Contains(field, needle) => {
                doc.str_field(field).is_some_and(|s| s.contains(needle))
            }
            Filter::In(field, values) => doc
                .get(field)
                .is_some_and(|v| values.iter().any(|candidate| values_eq(v, candidate))),
            Filter::And(filters) => filters.iter().all(|f| f.matches(doc)),
            Filter::Or(filters) => filters.iter().any(|f| f.matches(doc)),
        }
    }
}

/// Numbers compare numerically across integer/float representations
fn values_eq(a: &Value, b: &Value) -> bool {
    match (a.as_f64(), b.as_f64()) {
        (Some(x), Some(y)) => x == y,
        _ => a == b,
    }
}

fn cmp_field(doc: &Document, field: &str, value: &Value) -> Option<std::cmp::Ordering> {
    let actual = doc.get(field)?;
    if let (Some(x), Some(y)) = (actual.as_f64(), value.as_f64()) {
        return x.partial_cmp(&y);
    }
    if let (Some(x), Some(y)) = (actual.as_str(), value.as_str()) {
        return Some(x.cmp(y));
    }
    None
}

/// Port to the document store
///
/// Implementations may shard a logical collection across time-prefixed
/// physical collections; `find` selects the shards overlapping `range` and
/// concatenates their results in ascending insertion order per shard.
#[async_trait]
pub trait SessionStore: Send + Sync {
    /// Lazy sequence of documents matching `filter` within `range`
    async fn find(
        &self,
        collection: &str,
        range: TimeRange,
        filter: Filter,
    ) -> Result<DocumentStream>;

    /// Concrete physical collection names starting with `prefix`
    async fn list_collection_names(&self, prefix: &str) -> Result<BTreeSet<String>>;
}
