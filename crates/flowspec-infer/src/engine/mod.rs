//! Inference engine
//!
//! Generation is an explicit staged pipeline:
//!
//! 1. **Collect** (`segments`): drain the source once, building per-shape
//!    positional statistics and buffering record summaries.
//! 2. **Decide** (`templater`): choose literal or placeholder for every
//!    position of every shape that has enough records.
//! 3. **Aggregate** (`aggregator`): route buffered summaries to
//!    (templated path, method) accumulators, then drop endpoints below the
//!    sample floor.
//! 4. **Assemble** (`assembler`, `required`, `status`): infer required
//!    fields and status results per operation and compose the document.
//!
//! Every accumulator is owned by a single stage of a single call; nothing
//! outlives `generate`.

pub mod aggregator;
pub mod assembler;
pub mod required;
pub mod segments;
pub mod status;
pub mod templater;

use flowspec_model::ServiceSpec;
use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Instant;

use crate::config::GenerationOptions;
use crate::error::{InferenceError, Result};
use crate::report::GenerationReport;
use crate::source::RecordSource;
use crate::telemetry::InferenceMetrics;
use aggregator::EndpointAggregator;
use assembler::SpecAssembler;
use segments::{SegmentStatistics, ShapeKey};
use templater::{PathTemplater, ShapeTemplate};

/// A generated document together with its report
#[derive(Debug, Clone)]
pub struct GenerationOutcome {
    pub spec: ServiceSpec,
    pub report: GenerationReport,
}

/// Synthesizes a `ServiceSpec` from a stream of traffic records
pub struct SpecGenerator {
    options: GenerationOptions,
    metrics: Option<Arc<InferenceMetrics>>,
}

impl Default for SpecGenerator {
    fn default() -> Self {
        Self::new(GenerationOptions::default())
    }
}

impl SpecGenerator {
    pub fn new(options: GenerationOptions) -> Self {
        Self {
            options,
            metrics: None,
        }
    }

    /// Record generation metrics into `metrics`
    pub fn with_metrics(mut self, metrics: Arc<InferenceMetrics>) -> Self {
        self.metrics = Some(metrics);
        self
    }

    pub fn options(&self) -> &GenerationOptions {
        &self.options
    }

    /// Generate a spec, discarding the report
    pub fn generate<S: RecordSource>(&self, source: S) -> Result<ServiceSpec> {
        self.generate_with_report(source).map(|outcome| outcome.spec)
    }

    /// Generate a spec and report
    ///
    /// Options are validated before the source is touched. Any source
    /// failure aborts the whole generation; no partial document is returned.
    pub fn generate_with_report<S: RecordSource>(&self, mut source: S) -> Result<GenerationOutcome> {
        let span = tracing::info_span!(
            "generate_spec",
            strategy = %self.options.status_aggregation,
            min_sample_size = self.options.min_sample_size,
            min_endpoint_samples = self.options.min_endpoint_samples,
        );
        let _enter = span.enter();
        let _timer = self.metrics.as_ref().map(|m| m.start_timer());

        let result = self.run(&mut source);

        if let Some(metrics) = &self.metrics {
            match &result {
                Ok(outcome) => {
                    metrics.record_generation("success");
                    metrics.record_records("accepted", outcome.report.records_accepted);
                    metrics.record_records("skipped", outcome.report.records_skipped);
                    metrics.record_endpoints(outcome.report.endpoints_emitted);
                }
                Err(e) => metrics.record_generation(e.kind()),
            }
        }

        result
    }

    fn run<S: RecordSource>(&self, source: &mut S) -> Result<GenerationOutcome> {
        let start = Instant::now();
        self.options.validate()?;

        tracing::info!("collecting segment statistics");
        let stats = SegmentStatistics::collect(source)?;
        let records_seen = stats.records_seen();
        let records_accepted = stats.records_accepted();
        let (shapes, summaries, warnings) = stats.into_parts();

        let templater = PathTemplater::from_options(&self.options);
        let mut templates: BTreeMap<ShapeKey, ShapeTemplate> = BTreeMap::new();
        let mut shapes_below_floor = 0;
        let mut parameterized_positions = 0;

        for (key, shape) in &shapes {
            let template = if shape.record_count() < self.options.min_endpoint_samples {
                shapes_below_floor += 1;
                ShapeTemplate::literal(key.segment_count)
            } else {
                templater.template_shape(shape)
            };

            for placeholder in template.placeholders() {
                parameterized_positions += 1;
                if let Some(metrics) = &self.metrics {
                    metrics.record_parameterized(placeholder.name());
                }
            }
            tracing::debug!(
                method = %key.method,
                segments = key.segment_count,
                records = shape.record_count(),
                parameters = template.parameterized_count(),
                "templated shape"
            );
            templates.insert(key.clone(), template);
        }

        let mut aggregator = EndpointAggregator::new();
        for summary in &summaries {
            let template = templates.get(&summary.shape).ok_or_else(|| {
                InferenceError::internal(format!(
                    "no template for shape {} /{}",
                    summary.shape.method, summary.shape.segment_count
                ))
            })?;
            aggregator.route(template.render(&summary.segments), summary);
        }
        let endpoints_dropped = aggregator.retain_min_samples(self.options.min_endpoint_samples);

        let spec = SpecAssembler::from_options(&self.options).assemble(&aggregator);

        let report = GenerationReport {
            records_seen,
            records_accepted,
            records_skipped: warnings.len(),
            warnings,
            shapes_analyzed: shapes.len() - shapes_below_floor,
            shapes_below_sample_floor: shapes_below_floor,
            parameterized_positions,
            endpoints_dropped,
            endpoints_emitted: spec.endpoints.len(),
            duration_ms: start.elapsed().as_millis() as u64,
            fingerprint: spec.fingerprint(),
        };

        tracing::info!(
            records_seen = report.records_seen,
            records_skipped = report.records_skipped,
            endpoints = report.endpoints_emitted,
            endpoints_dropped = report.endpoints_dropped,
            fingerprint = %report.fingerprint,
            "spec generated"
        );

        Ok(GenerationOutcome { spec, report })
    }
}

/// Generate a spec with the given options
pub fn generate_spec<S: RecordSource>(source: S, options: &GenerationOptions) -> Result<ServiceSpec> {
    SpecGenerator::new(options.clone()).generate(source)
}
