//! Prometheus metrics for spec generation
//!
//! - `records_total` (counter) - records by result (`accepted`, `skipped`)
//! - `generations_total` (counter) - generations by result
//! - `endpoints_emitted_total` (counter) - endpoints published
//! - `parameterized_segments_total` (counter) - placeholders by type
//! - `generation_duration_seconds` (histogram) - wall time per generation
//!
//! # Example
//!
//! ```rust
//! use flowspec_infer::telemetry::InferenceMetricsRegistry;
//!
//! let registry = InferenceMetricsRegistry::new().unwrap();
//! registry.inference().record_records("accepted", 42);
//! assert!(registry.encode_text().unwrap().contains("flowspec_inference_records_total"));
//! ```

use prometheus::{Counter, CounterVec, Histogram, HistogramOpts, Opts, Registry};
use std::sync::Arc;
use std::time::Instant;

use super::{Result, TelemetryError};

const NAMESPACE: &str = "flowspec_inference";

/// Generation metrics for Prometheus
pub struct InferenceMetrics {
    records_total: CounterVec,
    generations_total: CounterVec,
    endpoints_emitted_total: Counter,
    parameterized_segments_total: CounterVec,
    duration_seconds: Histogram,
}

impl InferenceMetrics {
    /// Create the metrics and register them with `registry`
    pub fn new(registry: &Registry) -> Result<Self> {
        let records_total = CounterVec::new(
            Opts::new("records_total", "Traffic records processed by result").namespace(NAMESPACE),
            &["result"],
        )?;

        let generations_total = CounterVec::new(
            Opts::new("generations_total", "Spec generations by result").namespace(NAMESPACE),
            &["result"],
        )?;

        let endpoints_emitted_total = Counter::with_opts(
            Opts::new("endpoints_emitted_total", "Endpoints published in generated specs")
                .namespace(NAMESPACE),
        )?;

        let parameterized_segments_total = CounterVec::new(
            Opts::new(
                "parameterized_segments_total",
                "Path positions replaced by a placeholder",
            )
            .namespace(NAMESPACE),
            &["placeholder"],
        )?;

        let duration_seconds = Histogram::with_opts(
            HistogramOpts::new("generation_duration_seconds", "Spec generation duration in seconds")
                .namespace(NAMESPACE)
                .buckets(vec![0.001, 0.005, 0.01, 0.05, 0.1, 0.5, 1.0, 5.0, 30.0]),
        )?;

        registry.register(Box::new(records_total.clone()))?;
        registry.register(Box::new(generations_total.clone()))?;
        registry.register(Box::new(endpoints_emitted_total.clone()))?;
        registry.register(Box::new(parameterized_segments_total.clone()))?;
        registry.register(Box::new(duration_seconds.clone()))?;

        Ok(Self {
            records_total,
            generations_total,
            endpoints_emitted_total,
            parameterized_segments_total,
            duration_seconds,
        })
    }

    /// Count `n` records with the given result label
    pub fn record_records(&self, result: &str, n: usize) {
        self.records_total
            .with_label_values(&[result])
            .inc_by(n as f64);
    }

    /// Count a finished generation; `result` is `success` or an error kind
    pub fn record_generation(&self, result: &str) {
        self.generations_total.with_label_values(&[result]).inc();
    }

    pub fn record_endpoints(&self, n: usize) {
        self.endpoints_emitted_total.inc_by(n as f64);
    }

    pub fn record_parameterized(&self, placeholder: &str) {
        self.parameterized_segments_total
            .with_label_values(&[placeholder])
            .inc();
    }

    pub fn observe_duration(&self, duration_secs: f64) {
        self.duration_seconds.observe(duration_secs);
    }

    /// Start a generation timer (records duration on drop)
    pub fn start_timer(&self) -> GenerationTimer<'_> {
        GenerationTimer {
            start: Instant::now(),
            metrics: self,
        }
    }
}

/// RAII guard for timing generations
pub struct GenerationTimer<'a> {
    start: Instant,
    metrics: &'a InferenceMetrics,
}

impl<'a> GenerationTimer<'a> {
    pub fn elapsed_secs(&self) -> f64 {
        self.start.elapsed().as_secs_f64()
    }
}

impl<'a> Drop for GenerationTimer<'a> {
    fn drop(&mut self) {
        self.metrics
            .observe_duration(self.start.elapsed().as_secs_f64());
    }
}

/// Registry owning the inference metrics
pub struct InferenceMetricsRegistry {
    registry: Arc<Registry>,
    inference: Arc<InferenceMetrics>,
}

impl InferenceMetricsRegistry {
    /// Create a fresh registry
    pub fn new() -> Result<Self> {
        Self::with_registry(Arc::new(Registry::new()))
    }

    /// Register into an existing Prometheus registry
    pub fn with_registry(registry: Arc<Registry>) -> Result<Self> {
        let inference = Arc::new(InferenceMetrics::new(&registry)?);
        Ok(Self {
            registry,
            inference,
        })
    }

    pub fn registry(&self) -> Arc<Registry> {
        Arc::clone(&self.registry)
    }

    /// Shared handle for `SpecGenerator::with_metrics`
    pub fn inference(&self) -> Arc<InferenceMetrics> {
        Arc::clone(&self.inference)
    }

    pub fn gather(&self) -> Vec<prometheus::proto::MetricFamily> {
        self.registry.gather()
    }

    /// Encode metrics in the Prometheus text format
    pub fn encode_text(&self) -> Result<String> {
        use prometheus::Encoder;
        let encoder = prometheus::TextEncoder::new();
        let mut buffer = Vec::new();
        encoder.encode(&self.gather(), &mut buffer)?;
        String::from_utf8(buffer).map_err(|e| TelemetryError::EncodingError(e.to_string()))
    }
}
