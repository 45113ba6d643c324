//! Segment statistics collection (pass one)
//!
//! Every accepted record is keyed by its shape (method plus segment count).
//! For each position of a shape we count how often each literal value
//! occurs. Templating decisions need the complete counts, so the collector
//! also buffers a compact summary of each record for the second pass.

use flowspec_model::NormalizedRecord;
use std::collections::BTreeMap;

use crate::error::{InferenceError, Result};
use crate::report::GenerationWarning;
use crate::source::RecordSource;

/// Structural signature of a path: method plus number of segments
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ShapeKey {
    pub method: String,
    pub segment_count: usize,
}

impl ShapeKey {
    pub fn new(method: impl Into<String>, segment_count: usize) -> Self {
        Self {
            method: method.into(),
            segment_count,
        }
    }
}

/// Value frequencies observed at one position of one shape
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PathSegmentAnalysis {
    values: BTreeMap<String, usize>,
    total: usize,
}

impl PathSegmentAnalysis {
    pub fn new() -> Self {
        Self::default()
    }

    /// Count one occurrence of `value`
    pub fn observe(&mut self, value: &str) {
        *self.values.entry(value.to_string()).or_insert(0) += 1;
        self.total += 1;
    }

    /// Occurrences across all records at this position
    pub fn total(&self) -> usize {
        self.total
    }

    /// Number of distinct values
    pub fn unique_count(&self) -> usize {
        self.values.len()
    }

    /// Distinct values over total occurrences; 0 when nothing was observed
    pub fn uniqueness_ratio(&self) -> f64 {
        if self.total == 0 {
            0.0
        } else {
            self.unique_count() as f64 / self.total as f64
        }
    }

    /// Occurrence count of a single value
    pub fn count_of(&self, value: &str) -> usize {
        self.values.get(value).copied().unwrap_or(0)
    }

    /// Distinct values in sorted order
    pub fn values(&self) -> impl Iterator<Item = &str> {
        self.values.keys().map(String::as_str)
    }
}

/// Positional statistics for one shape
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShapeStatistics {
    record_count: usize,
    positions: Vec<PathSegmentAnalysis>,
}

impl ShapeStatistics {
    fn new(segment_count: usize) -> Self {
        Self {
            record_count: 0,
            positions: vec![PathSegmentAnalysis::new(); segment_count],
        }
    }

    fn observe(&mut self, segments: &[String]) {
        self.record_count += 1;
        for (analysis, segment) in self.positions.iter_mut().zip(segments) {
            analysis.observe(segment);
        }
    }

    /// Records that had this shape
    pub fn record_count(&self) -> usize {
        self.record_count
    }

    /// Per-position analyses, in path order
    pub fn positions(&self) -> &[PathSegmentAnalysis] {
        &self.positions
    }
}

/// What the second pass needs to know about one accepted record
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordSummary {
    pub shape: ShapeKey,
    pub segments: Vec<String>,
    pub status: u16,
    /// Lower-cased, deduplicated, sorted
    pub header_keys: Vec<String>,
    /// Casing preserved, deduplicated, sorted
    pub query_keys: Vec<String>,
}

impl RecordSummary {
    fn from_record(record: &NormalizedRecord) -> Self {
        let method = record.method.trim().to_ascii_uppercase();
        let segments: Vec<String> = record.segments().map(str::to_string).collect();
        Self {
            shape: ShapeKey::new(method, segments.len()),
            segments,
            status: record.status,
            header_keys: record.header_keys(),
            // BTreeMap keys are already unique and sorted
            query_keys: record.query.keys().cloned().collect(),
        }
    }
}

/// Pass-one accumulator over a whole record stream
#[derive(Debug, Default)]
pub struct SegmentStatistics {
    shapes: BTreeMap<ShapeKey, ShapeStatistics>,
    records: Vec<RecordSummary>,
    warnings: Vec<GenerationWarning>,
    seen: usize,
}

impl SegmentStatistics {
    pub fn new() -> Self {
        Self::default()
    }

    /// Drain `source` to exhaustion
    ///
    /// Malformed records are skipped with a warning. A source error aborts
    /// collection and nothing gathered so far is returned.
    pub fn collect<S: RecordSource>(source: &mut S) -> Result<Self> {
        let mut stats = Self::new();
        while let Some(item) = source.next_record() {
            match item {
                Ok(record) => stats.observe(record),
                Err(e) => {
                    tracing::error!(index = stats.seen, error = %e, "record source failed");
                    return Err(InferenceError::ingestion(stats.seen, e));
                }
            }
        }
        Ok(stats)
    }

    /// Account for one record from the source
    pub fn observe(&mut self, record: NormalizedRecord) {
        let index = self.seen;
        self.seen += 1;

        if let Some(reason) = record.malformed_reason() {
            tracing::warn!(index, reason, "skipping malformed record");
            self.warnings.push(GenerationWarning::new(index, reason));
            return;
        }

        let summary = RecordSummary::from_record(&record);
        self.shapes
            .entry(summary.shape.clone())
            .or_insert_with(|| ShapeStatistics::new(summary.shape.segment_count))
            .observe(&summary.segments);
        self.records.push(summary);
    }

    /// Records pulled from the source, malformed ones included
    pub fn records_seen(&self) -> usize {
        self.seen
    }

    /// Records kept for analysis
    pub fn records_accepted(&self) -> usize {
        self.records.len()
    }

    pub fn warnings(&self) -> &[GenerationWarning] {
        &self.warnings
    }

    pub fn shape(&self, key: &ShapeKey) -> Option<&ShapeStatistics> {
        self.shapes.get(key)
    }

    pub fn shapes(&self) -> impl Iterator<Item = (&ShapeKey, &ShapeStatistics)> {
        self.shapes.iter()
    }

    /// Split into shape statistics, buffered summaries and warnings
    pub fn into_parts(
        self,
    ) -> (
        BTreeMap<ShapeKey, ShapeStatistics>,
        Vec<RecordSummary>,
        Vec<GenerationWarning>,
    ) {
        (self.shapes, self.records, self.warnings)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::SourceError;
    use crate::source::records;

    #[test]
    fn test_analysis_counts() {
        let mut analysis = PathSegmentAnalysis::new();
        for value in ["1", "2", "2", "3"] {
            analysis.observe(value);
        }
        assert_eq!(analysis.total(), 4);
        assert_eq!(analysis.unique_count(), 3);
        assert_eq!(analysis.count_of("2"), 2);
        assert_eq!(analysis.uniqueness_ratio(), 0.75);
        assert_eq!(analysis.values().collect::<Vec<_>>(), vec!["1", "2", "3"]);
        assert_eq!(PathSegmentAnalysis::new().uniqueness_ratio(), 0.0);
    }

    #[test]
    fn test_collect_groups_by_method_and_length() {
        let mut source = records(vec![
            NormalizedRecord::new("GET", "/api/users/1", 200),
            NormalizedRecord::new("GET", "/api/users/2", 200),
            NormalizedRecord::new("POST", "/api/users", 201),
            NormalizedRecord::new("GET", "/api/orders", 200),
        ]);
        let stats = SegmentStatistics::collect(&mut source).unwrap();

        assert_eq!(stats.records_seen(), 4);
        assert_eq!(stats.records_accepted(), 4);
        assert_eq!(stats.shapes().count(), 3);

        let get3 = stats.shape(&ShapeKey::new("GET", 3)).unwrap();
        assert_eq!(get3.record_count(), 2);
        assert_eq!(get3.positions()[0].unique_count(), 1);
        assert_eq!(get3.positions()[2].unique_count(), 2);

        let get2 = stats.shape(&ShapeKey::new("GET", 2)).unwrap();
        assert_eq!(get2.positions()[1].values().collect::<Vec<_>>(), vec!["orders"]);
    }

    #[test]
    fn test_method_is_normalized_to_uppercase() {
        let mut record = NormalizedRecord::new("GET", "/a", 200);
        record.method = " get".to_string();

        let mut stats = SegmentStatistics::new();
        stats.observe(record);
        assert!(stats.shape(&ShapeKey::new("GET", 1)).is_some());
    }

    #[test]
    fn test_malformed_records_are_skipped() {
        let mut stats = SegmentStatistics::new();
        stats.observe(NormalizedRecord::new("", "/a", 200));
        stats.observe(NormalizedRecord::new("GET", "/a", 200));
        stats.observe(NormalizedRecord::new("GET", "", 200));

        assert_eq!(stats.records_seen(), 3);
        assert_eq!(stats.records_accepted(), 1);
        let indices: Vec<usize> = stats.warnings().iter().map(|w| w.index).collect();
        assert_eq!(indices, vec![0, 2]);
    }

    #[test]
    fn test_records_without_status_are_skipped() {
        let mut stats = SegmentStatistics::new();
        let missing: NormalizedRecord =
            serde_json::from_str(r#"{"method": "GET", "path": "/health"}"#).unwrap();
        stats.observe(missing);
        stats.observe(NormalizedRecord::new("GET", "/health", 200));
        stats.observe(NormalizedRecord::new("GET", "/health", 700));

        assert_eq!(stats.records_accepted(), 1);
        let reasons: Vec<(usize, &str)> = stats
            .warnings()
            .iter()
            .map(|w| (w.index, w.reason.as_str()))
            .collect();
        assert_eq!(reasons, vec![(0, "missing status"), (2, "invalid status")]);
        assert_eq!(stats.shape(&ShapeKey::new("GET", 1)).unwrap().record_count(), 1);
    }

    #[test]
    fn test_source_error_aborts() {
        let mut source = vec![
            Ok(NormalizedRecord::new("GET", "/a", 200)),
            Err(SourceError::other("stream closed")),
            Ok(NormalizedRecord::new("GET", "/b", 200)),
        ]
        .into_iter();

        let err = SegmentStatistics::collect(&mut source).unwrap_err();
        assert!(matches!(err, InferenceError::Ingestion { index: 1, .. }));
    }

    #[test]
    fn test_summary_keys() {
        let record = NormalizedRecord::new("GET", "/a", 200)
            .with_header("X-Trace", "1")
            .with_header("x-trace", "2")
            .with_query("Page", "1");
        let summary = RecordSummary::from_record(&record);
        assert_eq!(summary.header_keys, vec!["x-trace".to_string()]);
        assert_eq!(summary.query_keys, vec!["Page".to_string()]);
    }
}
