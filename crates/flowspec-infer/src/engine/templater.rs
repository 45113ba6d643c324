//! Path templating
//!
//! Decides, position by position, whether a path segment is an identifier
//! that should be replaced by a typed placeholder. A position is
//! parameterized only when all of the following hold:
//!
//! - at least `min_sample_size` records were observed there
//! - the unique/total ratio strictly exceeds `cardinality_threshold`
//! - more than one distinct value was observed
//!
//! High uniqueness over a handful of samples is treated as insufficient
//! evidence, not as an identifier.

use std::fmt;

use super::segments::{PathSegmentAnalysis, ShapeStatistics};
use crate::config::GenerationOptions;

/// Typed placeholder for an inferred path parameter
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Placeholder {
    /// Every observed value parsed as an integer
    Num,
    /// Anything else
    Str,
}

impl Placeholder {
    /// Short name used in templates and metric labels
    pub fn name(self) -> &'static str {
        match self {
            Placeholder::Num => "num",
            Placeholder::Str => "str",
        }
    }

    fn infer<'a>(mut values: impl Iterator<Item = &'a str>) -> Self {
        if values.all(is_integer) {
            Placeholder::Num
        } else {
            Placeholder::Str
        }
    }
}

/// Optionally signed run of ASCII digits, of any width
fn is_integer(value: &str) -> bool {
    let digits = value.strip_prefix('-').unwrap_or(value);
    !digits.is_empty() && digits.bytes().all(|b| b.is_ascii_digit())
}

impl fmt::Display for Placeholder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{{{}}}", self.name())
    }
}

/// Outcome for one segment position
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SegmentDecision {
    Literal,
    Parameter(Placeholder),
}

/// Templating decisions for every position of one shape
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShapeTemplate {
    decisions: Vec<SegmentDecision>,
}

impl ShapeTemplate {
    /// A template that keeps every segment literal
    pub fn literal(segment_count: usize) -> Self {
        Self {
            decisions: vec![SegmentDecision::Literal; segment_count],
        }
    }

    pub fn decisions(&self) -> &[SegmentDecision] {
        &self.decisions
    }

    /// Placeholders chosen for this shape, in path order
    pub fn placeholders(&self) -> impl Iterator<Item = Placeholder> + '_ {
        self.decisions.iter().filter_map(|d| match d {
            SegmentDecision::Parameter(p) => Some(*p),
            SegmentDecision::Literal => None,
        })
    }

    pub fn parameterized_count(&self) -> usize {
        self.placeholders().count()
    }

    /// Render the templated path for a record's literal segments
    pub fn render(&self, segments: &[String]) -> String {
        if segments.is_empty() {
            return "/".to_string();
        }

        let mut path = String::new();
        for (i, segment) in segments.iter().enumerate() {
            path.push('/');
            match self.decisions.get(i) {
                Some(SegmentDecision::Parameter(placeholder)) => {
                    path.push_str(&placeholder.to_string())
                }
                _ => path.push_str(segment),
            }
        }
        path
    }
}

/// Applies the parameterization rule to collected statistics
#[derive(Debug, Clone)]
pub struct PathTemplater {
    min_sample_size: usize,
    cardinality_threshold: f64,
}

impl PathTemplater {
    pub fn new(min_sample_size: usize, cardinality_threshold: f64) -> Self {
        Self {
            min_sample_size,
            cardinality_threshold,
        }
    }

    pub fn from_options(options: &GenerationOptions) -> Self {
        Self::new(options.min_sample_size, options.cardinality_threshold)
    }

    /// Decide a single position
    pub fn decide(&self, analysis: &PathSegmentAnalysis) -> SegmentDecision {
        if analysis.total() < self.min_sample_size {
            return SegmentDecision::Literal;
        }
        if analysis.unique_count() < 2 {
            return SegmentDecision::Literal;
        }
        if analysis.uniqueness_ratio() <= self.cardinality_threshold {
            return SegmentDecision::Literal;
        }
        SegmentDecision::Parameter(Placeholder::infer(analysis.values()))
    }

    /// Decide every position of a shape independently
    pub fn template_shape(&self, shape: &ShapeStatistics) -> ShapeTemplate {
        ShapeTemplate {
            decisions: shape.positions().iter().map(|a| self.decide(a)).collect(),
        }
    }
}
