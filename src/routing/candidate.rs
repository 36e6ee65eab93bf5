//! Per-request candidate sets.
//!
//! # Responsibilities
//! - Hold the ranked endpoints a matcher produced for one request
//! - Allow replacing a candidate's endpoint by index
//! - Track validity as downstream policies reject candidates
//!
//! # Design Decisions
//! - Owned by a single request, never shared
//! - Mutation is by index only; no iterator is held across a replacement

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::sync::Arc;

use crate::routing::endpoint::RouteEndpoint;

/// Values extracted from the path for one request.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RouteValues(BTreeMap<String, String>);

impl RouteValues {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.0.insert(key.into(), value.into());
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.0.get(key).map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for RouteValues {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self(iter.into_iter().map(|(k, v)| (k.into(), v.into())).collect())
    }
}

/// One slot in a candidate set.
#[derive(Debug, Clone)]
pub struct CandidateState {
    pub endpoint: Arc<RouteEndpoint>,
    pub values: RouteValues,
    /// Rank assigned by the matcher; lower is better.
    pub score: i32,
}

/// The candidates matched for one request.
#[derive(Debug, Default)]
pub struct CandidateSet {
    candidates: Vec<CandidateState>,
    valid: Vec<bool>,
}

impl CandidateSet {
    /// Create a set; every candidate starts valid.
    pub fn new(candidates: Vec<CandidateState>) -> Self {
        let valid = vec![true; candidates.len()];
        Self { candidates, valid }
    }

    pub fn len(&self) -> usize {
        self.candidates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.candidates.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&CandidateState> {
        self.candidates.get(index)
    }

    pub fn iter(&self) -> std::slice::Iter<'_, CandidateState> {
        self.candidates.iter()
    }

    pub fn is_valid(&self, index: usize) -> bool {
        self.valid.get(index).copied().unwrap_or(false)
    }

    pub fn set_validity(&mut self, index: usize, valid: bool) {
        if let Some(slot) = self.valid.get_mut(index) {
            *slot = valid;
        }
    }

    /// Replace the endpoint of a candidate.
    ///
    /// The caller passes the values to keep; passing the candidate's current
    /// values preserves them. Out-of-range indices are ignored.
    pub fn replace_endpoint(&mut self, index: usize, endpoint: Arc<RouteEndpoint>, values: RouteValues) {
        if let Some(candidate) = self.candidates.get_mut(index) {
            candidate.endpoint = endpoint;
            candidate.values = values;
        }
    }
}
