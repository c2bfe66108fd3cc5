//! RTPR index scanner
//!
//! Resolves media-metric queries: scans the RTP and/or RTCP report indices,
//! merges the matching reports in `started_at` order, then joins each report
//! back to its SIP leg by `call_id` within the aggregation window. The output
//! is a `sip_call_index` document stream in the merge's order.

use crate::domain::document::Document;
use crate::domain::query::{ParsedQuery, QueryDomain};
use crate::domain::session::merge::OrderedMerge;
use crate::domain::shared::Result;
use crate::domain::store::{
    DocumentStream, Filter, SessionStore, TimeRange, RTPR_RTCP_INDEX, RTPR_RTP_INDEX,
    SIP_CALL_INDEX,
};
use futures::stream;
use futures::TryStreamExt;
use serde_json::Value;
use std::sync::Arc;
use tracing::{debug, warn};

pub struct RtprIndexScanner {
    store: Arc<dyn SessionStore>,
    /// Clock skew budget for the report-to-leg join, milliseconds
    aggregation_timeout: i64,
}

impl RtprIndexScanner {
    pub fn new(store: Arc<dyn SessionStore>, aggregation_timeout: i64) -> Self {
        Self {
            store,
            aggregation_timeout,
        }
    }

    pub async fn scan(&self, window: TimeRange, query: &ParsedQuery) -> Result<DocumentStream> {
        let mut filters = vec![Filter::between("started_at", window.from, window.to)];
        filters.extend(query.rtpr_predicates().map(|p| p.to_filter()));
        let filter = Filter::And(filters);

        let mut streams = Vec::new();
        if query.has_domain(QueryDomain::Rtp) {
            streams.push(self.store.find(RTPR_RTP_INDEX, window, filter.clone()).await?);
        }
        if query.has_domain(QueryDomain::Rtcp) {
            streams.push(self.store.find(RTPR_RTCP_INDEX, window, filter).await?);
        }
        debug!("Scanning {} RTPR report indices", streams.len());

        let merged = OrderedMerge::new("started_at", streams);
        Ok(self.join_reports(merged))
    }

    /// For each report, take the first SIP leg with the same call-id created
    /// within `[started_at - aggregation_timeout, started_at]`; reports with
    /// no such leg are dropped
    fn join_reports(&self, merged: OrderedMerge) -> DocumentStream {
        let store = self.store.clone();
        let aggregation_timeout = self.aggregation_timeout;

        Box::pin(stream::try_unfold(
            (merged, store),
            move |(mut merged, store)| async move {
                loop {
                    let Some(report) = merged.try_next().await? else {
                        return Ok(None);
                    };
                    let Some(leg) =
                        lookup_leg(store.as_ref(), &report, aggregation_timeout).await?
                    else {
                        continue;
                    };
                    return Ok(Some((leg, (merged, store))));
                }
            },
        ))
    }
}

async fn lookup_leg(
    store: &dyn SessionStore,
    report: &Document,
    aggregation_timeout: i64,
) -> Result<Option<Document>> {
    let Some(call_id) = report.str_field("call_id") else {
        warn!("Skipping RTPR report without call_id");
        return Ok(None);
    };
    // The merge only emits keyed reports
    let Some(started_at) = report.i64_field("started_at") else {
        return Ok(None);
    };

    let range = TimeRange::new(started_at.saturating_sub(aggregation_timeout), started_at);
    let filter = Filter::And(vec![
        Filter::Eq("call_id".to_string(), Value::from(call_id)),
        Filter::between("created_at", range.from, range.to),
    ]);

    let mut legs = store.find(SIP_CALL_INDEX, range, filter).await?;
    legs.try_next().await
}
