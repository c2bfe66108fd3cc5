//! Ordered stream merge
//!
//! K-way merge of document streams already sorted on a shared integer key.
//! One head is buffered per source; each pull emits the minimum head and
//! advances that source. Ties go to the earlier source, so the merge is
//! stable. Nothing beyond the heads is materialized.

use crate::domain::document::Document;
use crate::domain::shared::Result;
use crate::domain::store::DocumentStream;
use futures::stream;
use futures::TryStreamExt;
use tracing::warn;

pub struct OrderedMerge {
    key_field: String,
    sources: Vec<Source>,
}

struct Source {
    stream: DocumentStream,
    head: Option<(i64, Document)>,
    exhausted: bool,
}

impl Source {
    /// Buffer the next keyed document, skipping records without the key
    async fn fill(&mut self, key_field: &str) -> Result<()> {
        while self.head.is_none() && !self.exhausted {
            match self.stream.try_next().await? {
                None => self.exhausted = true,
                Some(doc) => match doc.i64_field(key_field) {
                    Some(key) => self.head = Some((key, doc)),
                    None => warn!("Skipping document without `{}` in merge", key_field),
                },
            }
        }
        Ok(())
    }
}

impl OrderedMerge {
    pub fn new(key_field: impl Into<String>, streams: Vec<DocumentStream>) -> Self {
        Self {
            key_field: key_field.into(),
            sources: streams
                .into_iter()
                .map(|stream| Source {
                    stream,
                    head: None,
                    exhausted: false,
                })
                .collect(),
        }
    }

    pub async fn try_next(&mut self) -> Result<Option<Document>> {
        for source in &mut self.sources {
            source.fill(&self.key_field).await?;
        }

        let best = self
            .sources
            .iter()
            .enumerate()
            .filter_map(|(index, source)| source.head.as_ref().map(|(key, _)| (*key, index)))
            .min()
            .map(|(_, index)| index);

        Ok(best.and_then(|index| self.sources[index].head.take().map(|(_, doc)| doc)))
    }

    /// Adapt into a lazy document stream
    pub fn into_stream(self) -> DocumentStream {
        Box::pin(stream::try_unfold(self, |mut merge| async move {
            Ok(merge.try_next().await?.map(|doc| (doc, merge)))
        }))
    }
}
