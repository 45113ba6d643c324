//! Error types for the inference engine
//!
//! Per-record problems are not errors: malformed records are skipped and
//! reported as warnings. Everything here aborts a generation.

use flowspec_model::ExitCode;
use thiserror::Error;

/// Failure reported by a record source
#[derive(Error, Debug)]
pub enum SourceError {
    /// The underlying reader failed
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// A line could not be decoded into a record
    #[error("Decode error at line {line}: {message}")]
    Decode { line: usize, message: String },

    /// Any other terminal source failure
    #[error("{0}")]
    Other(String),
}

impl SourceError {
    /// Create a generic source error
    pub fn other(msg: impl Into<String>) -> Self {
        SourceError::Other(msg.into())
    }
}

/// Main error type for spec generation
#[derive(Error, Debug)]
pub enum InferenceError {
    /// The record source could not be read to completion
    #[error("Ingestion failed after {index} records: {source}")]
    Ingestion {
        index: usize,
        #[source]
        source: SourceError,
    },

    /// A generation option is outside its valid domain
    #[error("Invalid option `{option}`: {message}")]
    Configuration { option: String, message: String },

    /// Internal error
    #[error("Internal error: {0}")]
    Internal(String),
}

impl InferenceError {
    /// Create a configuration error for the named option
    pub fn configuration(option: impl Into<String>, message: impl Into<String>) -> Self {
        InferenceError::Configuration {
            option: option.into(),
            message: message.into(),
        }
    }

    /// Create an ingestion error at the given record index
    pub fn ingestion(index: usize, source: SourceError) -> Self {
        InferenceError::Ingestion { index, source }
    }

    /// Create an internal error
    pub fn internal(msg: impl Into<String>) -> Self {
        InferenceError::Internal(msg.into())
    }

    /// Check if this is a caller-facing error (vs internal)
    pub fn is_user_error(&self) -> bool {
        matches!(
            self,
            InferenceError::Ingestion { .. } | InferenceError::Configuration { .. }
        )
    }

    /// Exit code class for this failure
    pub fn exit_code(&self) -> ExitCode {
        match self {
            InferenceError::Ingestion { .. } => ExitCode::ParseError,
            InferenceError::Configuration { .. } | InferenceError::Internal(_) => {
                ExitCode::SystemError
            }
        }
    }

    /// Short label used for metrics and logs
    pub fn kind(&self) -> &'static str {
        match self {
            InferenceError::Ingestion { .. } => "ingestion",
            InferenceError::Configuration { .. } => "configuration",
            InferenceError::Internal(_) => "internal",
        }
    }
}

/// Result type alias for inference operations
pub type Result<T> = std::result::Result<T, InferenceError>;
