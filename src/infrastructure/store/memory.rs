//! Embedded in-memory store
//!
//! Store adapter over process memory, used by the test harness and the
//! standalone binary. Logical collections are day-sharded into physical
//! collections named `{logical}_{YYYYMMDD}`; `find` prunes shards against
//! the time partition hint and concatenates the survivors in name order,
//! which is chronological. Documents keep their insertion order per shard.

use crate::domain::document::Document;
use crate::domain::shared::Result;
use crate::domain::store::{DocumentStream, Filter, SessionStore, TimeRange};
use async_trait::async_trait;
use chrono::{DateTime, NaiveDate};
use futures::stream;
use std::collections::{BTreeMap, BTreeSet};
use tokio::sync::RwLock;
use tracing::debug;

#[derive(Default)]
pub struct InMemorySessionStore {
    collections: RwLock<BTreeMap<String, Vec<Document>>>,
}

impl InMemorySessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Physical shard name for a logical collection at an instant
    pub fn shard_name(logical: &str, timestamp_ms: i64) -> String {
        match day_of(timestamp_ms) {
            Some(day) => format!("{}_{}", logical, day.format("%Y%m%d")),
            None => logical.to_string(),
        }
    }

    /// Append a document to the day shard covering `timestamp_ms`
    pub async fn insert(&self, logical: &str, timestamp_ms: i64, doc: Document) {
        let shard = Self::shard_name(logical, timestamp_ms);
        self.insert_into(&shard, doc).await;
    }

    /// Append a document to an exact physical collection
    pub async fn insert_into(&self, collection: &str, doc: Document) {
        self.collections
            .write()
            .await
            .entry(collection.to_string())
            .or_default()
            .push(doc);
    }
}

#[async_trait]
impl SessionStore for InMemorySessionStore {
    async fn find(
        &self,
        collection: &str,
        range: TimeRange,
        filter: Filter,
    ) -> Result<DocumentStream> {
        let collections = self.collections.read().await;
        let mut matched = Vec::new();
        for (name, docs) in collections.iter() {
            if !shard_overlaps(name, collection, range) {
                continue;
            }
            matched.extend(docs.iter().filter(|doc| filter.matches(doc)).cloned());
        }
        debug!(
            "find({}) matched {} documents across shards",
            collection,
            matched.len()
        );
        Ok(Box::pin(stream::iter(matched.into_iter().map(Ok))))
    }

    async fn list_collection_names(&self, prefix: &str) -> Result<BTreeSet<String>> {
        Ok(self
            .collections
            .read()
            .await
            .keys()
            .filter(|name| name.starts_with(prefix))
            .cloned()
            .collect())
    }
}

/// Whether a physical collection belongs to `logical` and overlaps `range`
fn shard_overlaps(name: &str, logical: &str, range: TimeRange) -> bool {
    if name == logical {
        return true;
    }
    let Some(suffix) = name
        .strip_prefix(logical)
        .and_then(|rest| rest.strip_prefix('_'))
    else {
        return false;
    };
    let Ok(day) = NaiveDate::parse_from_str(suffix, "%Y%m%d") else {
        return false;
    };

    // Range ends outside the representable date span leave that side open
    let from_ok = day_of(range.from).map_or(true, |from| day >= from);
    let to_ok = day_of(range.to).map_or(true, |to| day <= to);
    from_ok && to_ok
}

fn day_of(timestamp_ms: i64) -> Option<NaiveDate> {
    DateTime::from_timestamp_millis(timestamp_ms).map(|dt| dt.date_naive())
}
