//! Endpoint aggregation (pass two)
//!
//! Buffered record summaries are re-keyed by templated path and method.
//! Each (path, method) pair owns an `OperationAccumulator`; nothing is shared
//! between accumulators.

use std::collections::BTreeMap;

use super::segments::RecordSummary;

/// Presence counts and observed statuses for one operation
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OperationAccumulator {
    total: usize,
    header_counts: BTreeMap<String, usize>,
    query_counts: BTreeMap<String, usize>,
    statuses: Vec<u16>,
}

impl OperationAccumulator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fold one record into the counters
    pub fn observe(&mut self, summary: &RecordSummary) {
        self.total += 1;
        for key in &summary.header_keys {
            *self.header_counts.entry(key.clone()).or_insert(0) += 1;
        }
        for key in &summary.query_keys {
            *self.query_counts.entry(key.clone()).or_insert(0) += 1;
        }
        self.statuses.push(summary.status);
    }

    /// Records routed to this operation
    pub fn total(&self) -> usize {
        self.total
    }

    /// Records carrying each header (lower-cased)
    pub fn header_counts(&self) -> &BTreeMap<String, usize> {
        &self.header_counts
    }

    /// Records carrying each query key
    pub fn query_counts(&self) -> &BTreeMap<String, usize> {
        &self.query_counts
    }

    /// Every observed status, in arrival order
    pub fn statuses(&self) -> &[u16] {
        &self.statuses
    }
}

/// Operations observed on one templated path, keyed by method
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EndpointAccumulator {
    operations: BTreeMap<String, OperationAccumulator>,
}

impl EndpointAccumulator {
    /// Records across all methods
    pub fn total_records(&self) -> usize {
        self.operations.values().map(OperationAccumulator::total).sum()
    }

    pub fn operations(&self) -> &BTreeMap<String, OperationAccumulator> {
        &self.operations
    }

    pub fn operation(&self, method: &str) -> Option<&OperationAccumulator> {
        self.operations.get(method)
    }
}

/// Groups records into endpoint and operation accumulators
#[derive(Debug, Default)]
pub struct EndpointAggregator {
    endpoints: BTreeMap<String, EndpointAccumulator>,
}

impl EndpointAggregator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Route a record to the accumulator for its templated path and method
    pub fn route(&mut self, templated_path: String, summary: &RecordSummary) {
        self.endpoints
            .entry(templated_path)
            .or_default()
            .operations
            .entry(summary.shape.method.clone())
            .or_default()
            .observe(summary);
    }

    /// Drop endpoints with fewer than `min_samples` records; returns the
    /// number dropped
    pub fn retain_min_samples(&mut self, min_samples: usize) -> usize {
        let before = self.endpoints.len();
        self.endpoints.retain(|path, endpoint| {
            let total = endpoint.total_records();
            let keep = total >= min_samples;
            if !keep {
                tracing::debug!(path = %path, total, min_samples, "dropping endpoint below sample floor");
            }
            keep
        });
        before - self.endpoints.len()
    }

    pub fn len(&self) -> usize {
        self.endpoints.len()
    }

    pub fn is_empty(&self) -> bool {
        self.endpoints.is_empty()
    }

    pub fn endpoint(&self, path: &str) -> Option<&EndpointAccumulator> {
        self.endpoints.get(path)
    }

    /// Endpoints in path order
    pub fn endpoints(&self) -> impl Iterator<Item = (&String, &EndpointAccumulator)> {
        self.endpoints.iter()
    }
}
