//! Error types for the trust gate
//!
//! Validation and detection failures are returned as structured results,
//! never as `Err`; this enum covers infrastructure faults only.

use thiserror::Error;

/// Infrastructure-level error for gate operations
#[derive(Error, Debug)]
pub enum GateError {
    /// No contract registered for the requested key
    #[error("no data contract registered for key '{0}'")]
    ContractNotFound(String),

    /// A contract was structurally unusable
    #[error("invalid contract: {0}")]
    InvalidContract(String),

    /// Record data could not be serialized or deserialized
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl GateError {
    /// Check if this is a caller error (vs internal)
    pub fn is_caller_error(&self) -> bool {
        matches!(self, GateError::ContractNotFound(_) | GateError::InvalidContract(_))
    }
}

/// Result type alias for gate operations
pub type Result<T> = std::result::Result<T, GateError>;
