//! SIP index scanner
//!
//! Resolves a SIP-only query to a lazy stream of `sip_call_index` documents.
//! Media predicates never reach this scanner, and the `sip.method` axis is
//! dropped here: method filtering happens downstream through the fixed
//! `INVITE` projection label.

use crate::domain::query::ParsedQuery;
use crate::domain::shared::Result;
use crate::domain::store::{DocumentStream, Filter, SessionStore, TimeRange, SIP_CALL_INDEX};
use std::sync::Arc;
use tracing::debug;

pub struct SipIndexScanner {
    store: Arc<dyn SessionStore>,
}

impl SipIndexScanner {
    pub fn new(store: Arc<dyn SessionStore>) -> Self {
        Self { store }
    }

    /// Matching legs created inside `window`, in store order
    pub async fn scan(&self, window: TimeRange, query: &ParsedQuery) -> Result<DocumentStream> {
        let mut filters = vec![Filter::between("created_at", window.from, window.to)];
        filters.extend(query.sip_predicates().map(|p| p.to_filter()));

        debug!(
            "Scanning {} with {} query predicates",
            SIP_CALL_INDEX,
            filters.len() - 1
        );
        self.store
            .find(SIP_CALL_INDEX, window, Filter::And(filters))
            .await
    }
}
