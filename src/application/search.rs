//! Session search use case
//!
//! Orchestrates one search: validate the window, type the query through the
//! attribute catalog, resolve matching SIP documents through the right index
//! scanner, correlate them into logical calls, and project summaries. The
//! returned stream is lazy end to end; abandoning it cancels the search.

use crate::domain::attribute::AttributeCatalog;
use crate::domain::query;
use crate::domain::session::{
    CallCorrelator, CallSummary, CorrelationConfig, RtprIndexScanner, SipIndexScanner,
};
use crate::domain::shared::{Result, SearchError};
use crate::domain::store::{SessionStore, TimeRange};
use futures::stream;
use futures::Stream;
use std::pin::Pin;
use std::sync::Arc;
use tracing::debug;

/// Search window and free-text query, times in milliseconds since epoch
#[derive(Debug, Clone, PartialEq)]
pub struct SearchRequest {
    pub created_at: i64,
    pub terminated_at: i64,
    pub query: String,
}

/// Lazy sequence of correlated-call summaries
pub type CallSummaryStream = Pin<Box<dyn Stream<Item = Result<CallSummary>> + Send>>;

pub struct SessionSearchService {
    store: Arc<dyn SessionStore>,
    catalog: Arc<dyn AttributeCatalog>,
    config: CorrelationConfig,
}

impl SessionSearchService {
    pub fn new(
        store: Arc<dyn SessionStore>,
        catalog: Arc<dyn AttributeCatalog>,
        config: CorrelationConfig,
    ) -> Self {
        Self {
            store,
            catalog,
            config,
        }
    }

    pub async fn search(&self, request: SearchRequest) -> Result<CallSummaryStream> {
        if request.terminated_at < request.created_at {
            return Err(SearchError::InvalidQuery(format!(
                "Window end {} precedes start {}",
                request.terminated_at, request.created_at
            )));
        }

        let attributes = self.catalog.attributes().await?;
        let parsed = query::parse(&request.query, &attributes);
        let window = TimeRange::new(request.created_at, request.terminated_at);

        let matched = if parsed.has_media_predicates() {
            debug!("Resolving query through the RTPR indices");
            RtprIndexScanner::new(self.store.clone(), self.config.aggregation_timeout)
                .scan(window, &parsed)
                .await?
        } else {
            debug!("Resolving query through the SIP index");
            SipIndexScanner::new(self.store.clone())
                .scan(window, &parsed)
                .await?
        };

        let correlator = Arc::new(CallCorrelator::new(self.store.clone(), self.config));
        let calls = correlator.correlate_stream(matched, request.created_at);

        Ok(Box::pin(stream::try_unfold(calls, |mut calls| async move {
            loop {
                match calls.try_next().await? {
                    None => return Ok(None),
                    Some(call) => {
                        if let Some(summary) = CallSummary::project(&call) {
                            return Ok(Some((summary, calls)));
                        }
                    }
                }
            }
        })))
    }
}
