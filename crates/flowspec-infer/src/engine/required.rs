//! Required-field inference
//!
//! A key is required when the fraction of an operation's records carrying
//! it reaches the threshold. The comparison is inclusive, so production
//! noise below `1 - threshold` does not demote a field to optional.

use flowspec_model::RequiredFields;
use std::collections::{BTreeMap, BTreeSet};

use super::aggregator::OperationAccumulator;

#[derive(Debug, Clone, Copy)]
pub struct RequiredFieldInferrer {
    threshold: f64,
}

impl RequiredFieldInferrer {
    pub fn new(threshold: f64) -> Self {
        Self { threshold }
    }

    /// Required header and query keys for one operation
    pub fn infer(&self, operation: &OperationAccumulator) -> RequiredFields {
        RequiredFields {
            headers: self.required_keys(operation.header_counts(), operation.total()),
            query: self.required_keys(operation.query_counts(), operation.total()),
        }
    }

    fn required_keys(&self, counts: &BTreeMap<String, usize>, total: usize) -> BTreeSet<String> {
        if total == 0 {
            return BTreeSet::new();
        }
        counts
            .iter()
            .filter(|(_, count)| **count as f64 / total as f64 >= self.threshold)
            .map(|(key, _)| key.clone())
            .collect()
    }
}
