//! Process exit codes shared by every FlowSpec entry point.

use std::fmt;

/// Exit codes for FlowSpec operations
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(i32)]
pub enum ExitCode {
    /// Successful execution
    Success = 0,
    /// Observed traffic does not match the contract
    ValidationMismatch = 1,
    /// The contract document itself is malformed
    ContractFormat = 2,
    /// Input traces or traffic could not be parsed or ingested
    ParseError = 3,
    /// Runtime or system failure
    SystemError = 4,
    /// Invalid invocation
    Usage = 64,
}

impl From<ExitCode> for i32 {
    fn from(code: ExitCode) -> Self {
        code as i32
    }
}

impl ExitCode {
    /// Whether this code signals a failure of any kind
    pub fn is_failure(self) -> bool {
        self != ExitCode::Success
    }
}

impl fmt::Display for ExitCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ExitCode::Success => write!(f, "success"),
            ExitCode::ValidationMismatch => write!(f, "validation mismatch"),
            ExitCode::ContractFormat => write!(f, "contract format error"),
            ExitCode::ParseError => write!(f, "parse error"),
            ExitCode::SystemError => write!(f, "system error"),
            ExitCode::Usage => write!(f, "usage error"),
        }
    }
}
