//! Telemetry for the inference engine
//!
//! - `metrics` - Prometheus metrics for generations, recorded into a
//!   caller-owned registry
//! - `init_tracing` - installs a `tracing` subscriber for embedding binaries

pub mod metrics;

pub use metrics::{GenerationTimer, InferenceMetrics, InferenceMetricsRegistry};

use thiserror::Error;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Telemetry errors
#[derive(Error, Debug)]
pub enum TelemetryError {
    #[error("Metrics error: {0}")]
    MetricsError(#[from] prometheus::Error),

    #[error("Encoding error: {0}")]
    EncodingError(String),
}

pub type Result<T> = std::result::Result<T, TelemetryError>;

/// Install a global `tracing` subscriber
///
/// The filter comes from `RUST_LOG`, defaulting to `info`. Returns `false`
/// when a subscriber was already installed.
pub fn init_tracing(json: bool) -> bool {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let registry = tracing_subscriber::registry().with(filter);

    let result = if json {
        registry.with(tracing_subscriber::fmt::layer().json()).try_init()
    } else {
        registry.with(tracing_subscriber::fmt::layer()).try_init()
    };

    result.is_ok()
}
