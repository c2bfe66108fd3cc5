//! Attribute catalog
//!
//! Known attribute descriptors drive type coercion of query predicates. The
//! catalog lives in the store under the `attributes` logical prefix and is
//! cached process-wide after the first read; `refresh` drops the cache.

use crate::domain::document::Document;
use crate::domain::shared::Result;
use crate::domain::store::{Filter, SessionStore, TimeRange, ATTRIBUTES};
use async_trait::async_trait;
use futures::TryStreamExt;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::{debug, warn};

/// Value space of an attribute
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AttributeKind {
    String,
    Number,
    Boolean,
}

impl AttributeKind {
    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "string" => Some(AttributeKind::String),
            "number" => Some(AttributeKind::Number),
            "boolean" => Some(AttributeKind::Boolean),
            _ => None,
        }
    }
}

/// Descriptor of a known attribute
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Attribute {
    /// Dotted path, e.g. `sip.caller`
    pub name: String,
    #[serde(rename = "type")]
    pub kind: AttributeKind,
    /// Enumerated values, when the attribute carries them
    #[serde(skip_serializing_if = "Option::is_none")]
    pub options: Option<Vec<String>>,
}

impl Attribute {
    fn from_document(doc: &Document) -> Option<Self> {
        let name = doc.str_field("name")?.to_string();
        let kind = AttributeKind::from_str(doc.str_field("type")?)?;
        let options = doc.get("options").and_then(|v| {
            v.as_array().map(|items| {
                items
                    .iter()
                    .filter_map(|i| i.as_str().map(str::to_string))
                    .collect()
            })
        });
        Some(Self {
            name,
            kind,
            options,
        })
    }
}

/// Read side of the attribute catalog
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait AttributeCatalog: Send + Sync {
    /// All known attribute descriptors
    async fn attributes(&self) -> Result<Vec<Attribute>>;
}

/// Store-backed catalog with a process-wide cache
pub struct StoreAttributeCatalog {
    store: Arc<dyn SessionStore>,
    cache: RwLock<Option<Arc<Vec<Attribute>>>>,
}

impl StoreAttributeCatalog {
    pub fn new(store: Arc<dyn SessionStore>) -> Self {
        Self {
            store,
            cache: RwLock::new(None),
        }
    }

    /// Drop the cached descriptors; the next read repopulates them
    pub async fn refresh(&self) {
        self.cache.write().await.take();
    }

    async fn load(&self) -> Result<Vec<Attribute>> {
        let mut attributes = Vec::new();
        for collection in self.store.list_collection_names(ATTRIBUTES).await? {
            let mut stream = self
                .store
                .find(&collection, TimeRange::ALL, Filter::All)
                .await?;
            while let Some(doc) = stream.try_next().await? {
                match Attribute::from_document(&doc) {
                    Some(attribute) => attributes.push(attribute),
                    None => warn!("Skipping malformed attribute descriptor"),
                }
            }
        }
        debug!("Loaded {} attribute descriptors", attributes.len());
        Ok(attributes)
    }
}

#[async_trait]
impl AttributeCatalog for StoreAttributeCatalog {
    async fn attributes(&self) -> Result<Vec<Attribute>> {
        if let Some(cached) = self.cache.read().await.as_ref() {
            return Ok(cached.as_ref().clone());
        }

        let loaded = self.load().await?;
        let mut cache = self.cache.write().await;
        let entry = cache.get_or_insert_with(|| Arc::new(loaded));
        Ok(entry.as_ref().clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_attribute_from_document() {
        let doc = Document::from_value(json!({
            "name": "sip.duration",
            "type": "number",
        }))
        .unwrap();

        let attribute = Attribute::from_document(&doc).unwrap();
        assert_eq!(attribute.name, "sip.duration");
        assert_eq!(attribute.kind, AttributeKind::Number);
        assert!(attribute.options.is_none());
    }

    #[test]
    fn test_attribute_with_options() {
        let doc = Document::from_value(json!({
            "name": "sip.state",
            "type": "string",
            "options": ["answered", "failed"],
        }))
        .unwrap();

        let attribute = Attribute::from_document(&doc).unwrap();
        assert_eq!(
            attribute.options,
            Some(vec!["answered".to_string(), "failed".to_string()])
        );
    }

    #[test]
    fn test_malformed_descriptor_is_rejected() {
        let missing_type = Document::from_value(json!({"name": "sip.caller"})).unwrap();
        assert!(Attribute::from_document(&missing_type).is_none());

        let unknown_kind =
            Document::from_value(json!({"name": "sip.caller", "type": "blob"})).unwrap();
        assert!(Attribute::from_document(&unknown_kind).is_none());
    }
}
