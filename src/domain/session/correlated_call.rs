//! Correlated call aggregate
//!
//! An ordered set of legs judged to belong to one end-to-end session. The
//! set is keyed by `(created_at, dst_addr)`; insertion is idempotent by that
//! key and bounded by `max_legs`. The minimum under the key order is the
//! call's representative first leg.

use crate::domain::session::leg::CallLeg;
use std::collections::{BTreeMap, BTreeSet, HashSet};

pub const DEFAULT_MAX_LEGS: usize = 10;

#[derive(Debug, Clone)]
pub struct CorrelatedCall {
    legs: BTreeMap<(i64, String), CallLeg>,
    /// `(caller, callee)` pairs already expanded; gates the pair-discovery
    /// store lookup
    observed_pairs: HashSet<(String, String)>,
    max_legs: usize,
}

impl CorrelatedCall {
    pub fn new(max_legs: usize) -> Self {
        Self {
            legs: BTreeMap::new(),
            observed_pairs: HashSet::new(),
            max_legs,
        }
    }

    /// Add a leg. Returns false without touching the set when the leg is
    /// already present under its key or the set is at capacity.
    pub fn insert(&mut self, leg: CallLeg) -> bool {
        let key = leg.sort_key();
        if self.legs.contains_key(&key) || self.legs.len() >= self.max_legs {
            return false;
        }
        self.legs.insert(key, leg);
        true
    }

    pub fn contains(&self, leg: &CallLeg) -> bool {
        self.legs.contains_key(&leg.sort_key())
    }

    /// Record a participant pair; true when it was not seen before
    pub fn observe_pair(&mut self, caller: &str, callee: &str) -> bool {
        self.observed_pairs
            .insert((caller.to_string(), callee.to_string()))
    }

    /// The minimum leg under the `(created_at, dst_addr)` order
    pub fn first_leg(&self) -> Option<&CallLeg> {
        self.legs.values().next()
    }

    /// Legs in storage order
    pub fn legs(&self) -> impl Iterator<Item = &CallLeg> {
        self.legs.values()
    }

    pub fn call_ids(&self) -> BTreeSet<String> {
        self.legs.values().map(|l| l.call_id.clone()).collect()
    }

    pub fn x_call_ids(&self) -> BTreeSet<String> {
        self.legs
            .values()
            .filter_map(|l| l.x_call_id.clone())
            .collect()
    }

    pub fn len(&self) -> usize {
        self.legs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.legs.is_empty()
    }

    pub fn is_full(&self) -> bool {
        self.legs.len() >= self.max_legs
    }
}
