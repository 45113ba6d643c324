//! Status code aggregation
//!
//! Summarizes the status codes observed for one operation according to the
//! configured strategy. Codes and ranges are mutually exclusive: `exact`
//! only emits codes, `range` and `auto` only emit class labels.

use flowspec_model::{status_class, StatusResult};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;

/// Strategy for summarizing observed status codes
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StatusAggregation {
    /// Distinct codes as observed
    Exact,
    /// One `Nxx` label per class observed
    Range,
    /// Class labels, whether one class or several is present
    #[default]
    Auto,
}

impl StatusAggregation {
    /// Summarize a multiset of status codes; order of `statuses` is irrelevant
    pub fn aggregate(&self, statuses: &[u16]) -> StatusResult {
        match self {
            StatusAggregation::Exact => StatusResult {
                codes: distinct_codes(statuses),
                ranges: Vec::new(),
            },
            StatusAggregation::Range | StatusAggregation::Auto => StatusResult {
                codes: Vec::new(),
                ranges: distinct_classes(statuses),
            },
        }
    }
}

fn distinct_codes(statuses: &[u16]) -> Vec<u16> {
    let set: BTreeSet<u16> = statuses.iter().copied().collect();
    set.into_iter().collect()
}

fn distinct_classes(statuses: &[u16]) -> Vec<String> {
    let classes: BTreeSet<u16> = statuses.iter().map(|s| s / 100).collect();
    classes
        .into_iter()
        .map(|class| status_class(class * 100))
        .collect()
}

impl fmt::Display for StatusAggregation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StatusAggregation::Exact => write!(f, "exact"),
            StatusAggregation::Range => write!(f, "range"),
            StatusAggregation::Auto => write!(f, "auto"),
        }
    }
}

impl FromStr for StatusAggregation {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "exact" => Ok(StatusAggregation::Exact),
            "range" => Ok(StatusAggregation::Range),
            "auto" => Ok(StatusAggregation::Auto),
            other => Err(format!(
                "unknown status aggregation strategy '{}', expected exact, range or auto",
                other
            )),
        }
    }
}
