//! Generation report
//!
//! Records what a generation saw and decided: how many records were
//! accepted or skipped (and why), how many shapes were analyzed, which
//! endpoints fell below the sample floor, and the fingerprint of the
//! resulting document.

use serde::{Deserialize, Serialize};

/// A record that was skipped during ingestion
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GenerationWarning {
    /// Zero-based position of the record in the source
    pub index: usize,
    /// Why the record was skipped
    pub reason: String,
}

impl GenerationWarning {
    pub fn new(index: usize, reason: impl Into<String>) -> Self {
        Self {
            index,
            reason: reason.into(),
        }
    }
}

/// Summary of a single generation
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GenerationReport {
    pub records_seen: usize,
    pub records_accepted: usize,
    pub records_skipped: usize,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub warnings: Vec<GenerationWarning>,
    /// Shapes with enough records to run positional analysis
    pub shapes_analyzed: usize,
    /// Shapes kept fully literal for lack of records
    pub shapes_below_sample_floor: usize,
    /// Segment positions replaced by a placeholder, across all shapes
    pub parameterized_positions: usize,
    /// Endpoints discarded by the minimum sample rule
    pub endpoints_dropped: usize,
    pub endpoints_emitted: usize,
    pub duration_ms: u64,
    /// `ServiceSpec::fingerprint` of the produced document
    pub fingerprint: String,
}

impl GenerationReport {
    /// Whether any record was skipped
    pub fn has_warnings(&self) -> bool {
        !self.warnings.is_empty()
    }

    /// Fraction of seen records that made it into the analysis
    pub fn acceptance_rate(&self) -> f64 {
        if self.records_seen == 0 {
            1.0
        } else {
            self.records_accepted as f64 / self.records_seen as f64
        }
    }
}
