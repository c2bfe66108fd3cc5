//! Result projection
//!
//! Collapses a correlated call's leg set into one response record. The leg
//! with minimum `(created_at, dst_addr)` is the representative: it supplies
//! the timestamps, state, duration and error code. Participants are the
//! distinct callers/callees joined in leg order, and the search is
//! INVITE-centric so the method label is fixed.

use crate::domain::session::correlated_call::CorrelatedCall;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeSet, HashSet};

pub const METHOD_INVITE: &str = "INVITE";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CallSummary {
    pub created_at: i64,
    pub terminated_at: Option<i64>,
    pub method: String,
    pub state: String,
    pub caller: String,
    pub callee: String,
    pub call_ids: BTreeSet<String>,
    pub duration: Option<i64>,
    pub error_code: Option<String>,
}

impl CallSummary {
    /// Project a frozen correlated call; `None` only for an empty leg set
    pub fn project(call: &CorrelatedCall) -> Option<Self> {
        let first = call.first_leg()?;
        Some(Self {
            created_at: first.created_at,
            terminated_at: first.terminated_at,
            method: METHOD_INVITE.to_string(),
            state: first.state.clone(),
            caller: distinct_joined(call.legs().map(|l| l.caller.as_str())),
            callee: distinct_joined(call.legs().map(|l| l.callee.as_str())),
            call_ids: call.call_ids(),
            duration: first.duration,
            error_code: first.error_code.clone(),
        })
    }
}

/// First-occurrence distinct values joined with " - ", preserving leg order
fn distinct_joined<'a>(values: impl Iterator<Item = &'a str>) -> String {
    let mut seen = HashSet::new();
    let mut ordered = Vec::new();
    for value in values {
        if seen.insert(value) {
            ordered.push(value);
        }
    }
    ordered.join(" - ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::session::correlated_call::DEFAULT_MAX_LEGS;
    use crate::domain::session::leg::CallLeg;

    fn leg(call_id: &str, caller: &str, callee: &str, created_at: i64) -> CallLeg {
        CallLeg {
            call_id: call_id.to_string(),
            x_call_id: None,
            caller: caller.to_string(),
            callee: callee.to_string(),
            created_at,
            terminated_at: Some(created_at + 100),
            state: "answered".to_string(),
            duration: Some(100),
            error_code: None,
            src_addr: "1.1.1.1".to_string(),
            dst_addr: format!("addr-{}", call_id),
            src_host: None,
            dst_host: None,
        }
    }

    #[test]
    fn test_projection_off_first_leg() {
        let mut call = CorrelatedCall::new(DEFAULT_MAX_LEGS);
        let mut first = leg("A", "alice", "bob", 1000);
        first.state = "failed".to_string();
        first.error_code = Some("487".to_string());
        first.duration = Some(42);
        call.insert(leg("B", "bob", "carol", 1500));
        call.insert(first);

        let summary = CallSummary::project(&call).unwrap();
        assert_eq!(summary.created_at, 1000);
        assert_eq!(summary.terminated_at, Some(1100));
        assert_eq!(summary.method, "INVITE");
        assert_eq!(summary.state, "failed");
        assert_eq!(summary.duration, Some(42));
        assert_eq!(summary.error_code, Some("487".to_string()));
        assert_eq!(
            summary.call_ids,
            ["A", "B"].iter().map(|s| s.to_string()).collect()
        );
    }

    #[test]
    fn test_participants_distinct_in_leg_order() {
        let mut call = CorrelatedCall::new(DEFAULT_MAX_LEGS);
        call.insert(leg("A", "alice", "bob", 1000));
        call.insert(leg("B", "alice", "proxy", 1200));
        call.insert(leg("C", "proxy", "bob", 1400));

        let summary = CallSummary::project(&call).unwrap();
        assert_eq!(summary.caller, "alice - proxy");
        assert_eq!(summary.callee, "bob - proxy");
    }

    #[test]
    fn test_empty_call_projects_to_none() {
        let call = CorrelatedCall::new(DEFAULT_MAX_LEGS);
        assert!(CallSummary::project(&call).is_none());
    }
}
