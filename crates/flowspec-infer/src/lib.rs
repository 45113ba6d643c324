//! FlowSpec Traffic-to-Contract Inference
//!
//! Synthesizes a `ServiceSpec` contract from normalized HTTP traffic when no
//! contract exists yet.
//!
//! ## Features
//!
//! - **Path templating**: per-position cardinality statistics decide which
//!   segments are identifiers (`/users/123` becomes `/users/{num}`)
//! - **Required-field inference**: headers and query keys present in at
//!   least a threshold fraction of requests
//! - **Status aggregation**: exact codes or class ranges (`2xx`)
//! - **Deterministic output**: the same records in any order produce the
//!   same document
//! - **Telemetry**: structured `tracing` events and Prometheus metrics
//!
//! ## Architecture
//!
//! ```text
//! RecordSource
//!     │
//!     ├──> Segment Statistics (pass 1: per-shape value frequencies)
//!     ├──> Path Templater     (literal or {num}/{str} per position)
//!     ├──> Endpoint Aggregator (pass 2: per path+method accumulators)
//!     ├──> Required Fields + Status Aggregation
//!     └──> Spec Assembler ──> ServiceSpec (flowspec/v1alpha1)
//! ```
//!
//! ## Example
//!
//! ```rust
//! use flowspec_infer::{records, GenerationOptions, SpecGenerator};
//! use flowspec_model::NormalizedRecord;
//!
//! let traffic = vec![
//!     NormalizedRecord::new("GET", "/api/users/123", 200).with_header("Authorization", "Bearer a"),
//!     NormalizedRecord::new("GET", "/api/users/456", 200).with_header("Authorization", "Bearer b"),
//!     NormalizedRecord::new("POST", "/api/users", 201),
//! ];
//!
//! let options = GenerationOptions::builder()
//!     .min_endpoint_samples(1)
//!     .min_sample_size(1)
//!     .build();
//!
//! let spec = SpecGenerator::new(options).generate(records(traffic)).unwrap();
//! assert_eq!(spec.endpoints.len(), 2);
//! assert!(spec.endpoint("/api/users/{num}").is_some());
//! ```

pub mod config;
pub mod engine;
pub mod error;
pub mod report;
pub mod source;
pub mod telemetry;

pub use config::{GenerationOptions, GenerationOptionsBuilder};
pub use engine::status::StatusAggregation;
pub use engine::templater::Placeholder;
pub use engine::{generate_spec, GenerationOutcome, SpecGenerator};
pub use error::{InferenceError, Result, SourceError};
pub use report::{GenerationReport, GenerationWarning};
pub use source::{records, JsonLinesSource, RecordSource};

/// Engine version (from Cargo.toml)
pub const ENGINE_VERSION: &str = env!("CARGO_PKG_VERSION");
