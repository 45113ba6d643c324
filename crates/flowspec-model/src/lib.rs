//! FlowSpec contract model.
//!
//! Shared types for the FlowSpec tooling: the normalized traffic record that
//! inference consumes, the `ServiceSpec` contract document it produces (and
//! that the verification engine reads), and the process exit code taxonomy.
//!
//! # Document Shape
//!
//! ```text
//! ServiceSpec (flowspec/v1alpha1)
//!   └─ EndpointSpec (templated path, sorted by path)
//!       └─ OperationSpec (method, sorted by method)
//!           ├─ RequiredFields { headers, query }
//!           └─ StatusResult { codes | ranges }
//! ```

pub mod exit;
pub mod record;
pub mod spec;

pub use exit::ExitCode;
pub use record::NormalizedRecord;
pub use spec::{
    EndpointSpec, OperationSpec, RequiredFields, ServiceSpec, SpecMetadata, StatusResult,
    status_class, API_VERSION, KIND,
};
