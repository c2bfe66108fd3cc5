//! Correlation engine
//!
//! Consumes the matched SIP document stream and emits each logical call
//! exactly once. A call grows from its anchor leg by three rules, applied in
//! order: pair discovery (identity + time), second sighting of a known pair,
//! and cross-call-id closure over the accumulated identifier set. Expansion
//! within one pair-discovery batch never re-queries the store; cycles are
//! broken by the ordered leg set and the observed-pair set.

use crate::domain::session::correlated_call::{CorrelatedCall, DEFAULT_MAX_LEGS};
use crate::domain::session::leg::CallLeg;
use crate::domain::shared::Result;
use crate::domain::store::{DocumentStream, Filter, SessionStore, TimeRange, SIP_CALL_INDEX};
use futures::future::BoxFuture;
use futures::TryStreamExt;
use serde_json::Value;
use std::collections::{BTreeSet, HashSet};
use std::sync::Arc;
use tracing::{debug, warn};

pub const DEFAULT_AGGREGATION_TIMEOUT_MS: i64 = 60_000;
pub const DEFAULT_TERMINATION_TIMEOUT_MS: i64 = 10_000;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CorrelationConfig {
    /// Clock skew budget for grouping temporally adjacent legs, milliseconds
    pub aggregation_timeout: i64,
    /// Slack for treating two in-progress legs as overlapping, milliseconds
    pub termination_timeout: i64,
    pub max_legs: usize,
    pub use_x_correlation_header: bool,
}

impl Default for CorrelationConfig {
    fn default() -> Self {
        Self {
            aggregation_timeout: DEFAULT_AGGREGATION_TIMEOUT_MS,
            termination_timeout: DEFAULT_TERMINATION_TIMEOUT_MS,
            max_legs: DEFAULT_MAX_LEGS,
            use_x_correlation_header: true,
        }
    }
}

pub struct CallCorrelator {
    store: Arc<dyn SessionStore>,
    config: CorrelationConfig,
}

impl CallCorrelator {
    pub fn new(store: Arc<dyn SessionStore>, config: CorrelationConfig) -> Self {
        Self { store, config }
    }

    /// Drive the outer loop over a matched document stream. `floor` is the
    /// requested window's lower bound; calls whose first leg slipped below it
    /// through aggregation padding are discarded.
    pub fn correlate_stream(
        self: Arc<Self>,
        matched: DocumentStream,
        floor: i64,
    ) -> CorrelationStream {
        CorrelationStream {
            correlator: self,
            matched,
            processed: HashSet::new(),
            floor,
        }
    }

    /// Grow `call` from `leg` by the three correlation rules. Legs emitted
    /// as part of an earlier call never join another one.
    fn correlate<'a>(
        &'a self,
        call: &'a mut CorrelatedCall,
        leg: CallLeg,
        processed: &'a HashSet<String>,
    ) -> BoxFuture<'a, Result<()>> {
        Box::pin(async move {
            if processed.contains(&leg.call_id) {
                return Ok(());
            }
            if call.observe_pair(&leg.caller, &leg.callee) {
                // Rule 1: pair discovery
                let mut candidates = self.fetch_pair_candidates(&leg).await?;
                candidates.retain(|c| !processed.contains(&c.call_id));
                self.extend(call, leg, &candidates);
                if self.config.use_x_correlation_header {
                    self.expand_linked(call, processed).await?;
                }
            } else if !call.is_full() && !call.contains(&leg) {
                // Rule 2: second sighting of a known pair
                if call.insert(leg) {
                    self.expand_linked(call, processed).await?;
                }
            }
            // An already-present leg of an already-observed pair falls
            // through both guards and must not re-enter rule 1
            Ok(())
        })
    }

    /// Rule 3: fetch legs whose identifiers touch the accumulated set and
    /// correlate each
    async fn expand_linked(
        &self,
        call: &mut CorrelatedCall,
        processed: &HashSet<String>,
    ) -> Result<()> {
        for linked in self.fetch_linked_legs(call).await? {
            self.correlate(call, linked, processed).await?;
        }
        Ok(())
    }

    /// Add `leg`, then pull in every candidate that overlaps it in time and
    /// topology. Recursion stays within the one candidate batch, which
    /// bounds the traversal and the store I/O.
    fn extend(&self, call: &mut CorrelatedCall, leg: CallLeg, candidates: &[CallLeg]) {
        if !call.insert(leg.clone()) {
            return;
        }
        for candidate in candidates {
            if self.overlaps_in_time(&leg, candidate) && topology_match(&leg, candidate) {
                self.extend(call, candidate.clone(), candidates);
            }
        }
    }

    /// Candidate legs sharing `(caller, callee)` within the aggregation
    /// window around the leg
    async fn fetch_pair_candidates(&self, leg: &CallLeg) -> Result<Vec<CallLeg>> {
        let range = TimeRange::new(
            leg.created_at.saturating_sub(self.config.aggregation_timeout),
            leg.created_at.saturating_add(self.config.aggregation_timeout),
        );
        let filter = Filter::And(vec![
            Filter::Eq("caller".to_string(), Value::from(leg.caller.as_str())),
            Filter::Eq("callee".to_string(), Value::from(leg.callee.as_str())),
            Filter::between("created_at", range.from, range.to),
        ]);
        self.fetch_legs(range, filter).await
    }

    /// Legs linked to the call through the cross-correlation header: either
    /// their `x_call_id` points at one of ours, or their `call_id` is
    /// pointed at by one of our `x_call_id`s
    async fn fetch_linked_legs(&self, call: &CorrelatedCall) -> Result<Vec<CallLeg>> {
        let Some(first) = call.first_leg() else {
            return Ok(Vec::new());
        };
        let lower = first.created_at.saturating_sub(self.config.aggregation_timeout);
        // When the first leg is still in progress the upper bound stays at
        // its creation time
        let upper = first
            .terminated_at
            .unwrap_or(first.created_at)
            .saturating_add(self.config.aggregation_timeout);
        let range = TimeRange::new(lower, upper);

        let ids = id_values(call.call_ids());
        let xids = id_values(call.x_call_ids());
        let identity = if xids.is_empty() {
            Filter::In("x_call_id".to_string(), ids)
        } else {
            Filter::Or(vec![
                Filter::In("x_call_id".to_string(), ids),
                Filter::In("call_id".to_string(), xids.clone()),
                Filter::In("x_call_id".to_string(), xids),
            ])
        };
        let filter = Filter::And(vec![
            identity,
            Filter::between("created_at", range.from, range.to),
        ]);
        self.fetch_legs(range, filter).await
    }

    async fn fetch_legs(&self, range: TimeRange, filter: Filter) -> Result<Vec<CallLeg>> {
        let mut stream = self.store.find(SIP_CALL_INDEX, range, filter).await?;
        let mut legs = Vec::new();
        while let Some(doc) = stream.try_next().await? {
            match CallLeg::from_document(&doc) {
                Ok(leg) => legs.push(leg),
                Err(error) => warn!("Skipping leg document: {}", error),
            }
        }
        Ok(legs)
    }

    /// Lifetime windows overlap; when either termination is unknown the legs
    /// only need to start within the termination timeout of each other
    fn overlaps_in_time(&self, l: &CallLeg, m: &CallLeg) -> bool {
        match (l.terminated_at, m.terminated_at) {
            (Some(l_terminated), Some(m_terminated)) => {
                l_terminated >= m.created_at && l.created_at <= m_terminated
            }
            _ => (m.created_at - l.created_at).abs() <= self.config.termination_timeout,
        }
    }
}

/// One side's source matches the other side's destination, by host name when
/// both carry one and by address otherwise
fn topology_match(l: &CallLeg, m: &CallLeg) -> bool {
    let src_match = match &l.src_host {
        Some(host) => m.dst_host.as_deref() == Some(host.as_str()),
        None => l.src_addr == m.dst_addr,
    };
    let dst_match = match &l.dst_host {
        Some(host) => m.src_host.as_deref() == Some(host.as_str()),
        None => l.dst_addr == m.src_addr,
    };
    src_match || dst_match
}

fn id_values(ids: BTreeSet<String>) -> Vec<Value> {
    ids.into_iter().map(Value::from).collect()
}

/// Pull-based sequence of correlated calls; the consumer's pull drives every
/// downstream store read
pub struct CorrelationStream {
    correlator: Arc<CallCorrelator>,
    matched: DocumentStream,
    /// Call-ids already emitted as part of some correlated call
    processed: HashSet<String>,
    floor: i64,
}

impl CorrelationStream {
    pub async fn try_next(&mut self) -> Result<Option<CorrelatedCall>> {
        loop {
            let Some(doc) = self.matched.try_next().await? else {
                return Ok(None);
            };
            let anchor = match CallLeg::from_document(&doc) {
                Ok(leg) => leg,
                Err(error) => {
                    warn!("Skipping matched document: {}", error);
                    continue;
                }
            };
            if self.processed.contains(&anchor.call_id) {
                continue;
            }

            let mut call = CorrelatedCall::new(self.correlator.config.max_legs);
            self.correlator
                .correlate(&mut call, anchor, &self.processed)
                .await?;
            self.processed.extend(call.call_ids());

            let Some(first_created_at) = call.first_leg().map(|l| l.created_at) else {
                continue;
            };
            if first_created_at < self.floor {
                debug!(
                    "Discarding correlated call anchored below the requested window ({} < {})",
                    first_created_at, self.floor
                );
                continue;
            }
            return Ok(Some(call));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infrastructure::store::InMemorySessionStore;

    fn leg(call_id: &str, created_at: i64, terminated_at: Option<i64>) -> CallLeg {
        CallLeg {
            call_id: call_id.to_string(),
            x_call_id: None,
            caller: "alice".to_string(),
            callee: "bob".to_string(),
            created_at,
            terminated_at,
            state: "answered".to_string(),
            duration: None,
            error_code: None,
            src_addr: "1.1.1.1".to_string(),
            dst_addr: "2.2.2.2".to_string(),
            src_host: None,
            dst_host: None,
        }
    }

    fn correlator() -> CallCorrelator {
        CallCorrelator::new(
            Arc::new(InMemorySessionStore::new()),
            CorrelationConfig::default(),
        )
    }

    #[test]
    fn test_time_overlap_with_both_terminations() {
        let c = correlator();

        assert!(c.overlaps_in_time(&leg("A", 1000, Some(2000)), &leg("B", 1500, Some(2500))));
        assert!(c.overlaps_in_time(&leg("A", 1500, Some(2500)), &leg("B", 1000, Some(2000))));
        assert!(!c.overlaps_in_time(&leg("A", 1000, Some(1400)), &leg("B", 1500, Some(2500))));
    }

    #[test]
    fn test_time_overlap_with_call_in_progress() {
        let c = correlator();

        // Either termination missing: starts must sit within the
        // termination timeout of each other
        assert!(c.overlaps_in_time(&leg("A", 1000, None), &leg("B", 11_000, Some(20_000))));
        assert!(!c.overlaps_in_time(&leg("A", 1000, None), &leg("B", 11_001, Some(20_000))));
        assert!(c.overlaps_in_time(&leg("A", 11_000, Some(20_000)), &leg("B", 1000, None)));
        assert!(!c.overlaps_in_time(&leg("A", 1000, Some(900_000)), &leg("B", 20_000, None)));
    }

    #[test]
    fn test_topology_match_by_address() {
        let mut a = leg("A", 1000, Some(2000));
        a.src_addr = "1.1.1.1".to_string();
        a.dst_addr = "2.2.2.2".to_string();
        let mut b = leg("B", 1000, Some(2000));
        b.src_addr = "2.2.2.2".to_string();
        b.dst_addr = "3.3.3.3".to_string();

        // a.dst == b.src
        assert!(topology_match(&a, &b));

        b.src_addr = "9.9.9.9".to_string();
        assert!(!topology_match(&a, &b));
    }

    #[test]
    fn test_topology_prefers_host_over_address() {
        let mut a = leg("A", 1000, Some(2000));
        a.dst_addr = "2.2.2.2".to_string();
        a.dst_host = Some("edge-1".to_string());
        let mut b = leg("B", 1000, Some(2000));
        b.src_addr = "2.2.2.2".to_string();

        // A carries a destination host, so the address fallback on that
        // side no longer applies
        assert!(!topology_match(&a, &b));

        b.src_host = Some("edge-1".to_string());
        assert!(topology_match(&a, &b));
    }
}
