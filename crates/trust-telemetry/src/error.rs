//! Error types for the observability engine
//!
//! Persistence failures inside the engine are swallowed and logged, never
//! propagated: telemetry must not be able to break the primary write path.
//! This enum therefore only surfaces at construction time (opening the
//! durable store) and in explicit maintenance calls.

use thiserror::Error;

/// Observability engine errors
#[derive(Error, Debug)]
pub enum TelemetryError {
    #[error("storage error: {0}")]
    Storage(#[from] sled::Error),

    #[error("failed to serialize snapshot: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("engine is shut down")]
    ShutDown,
}

/// Result type alias for observability operations
pub type Result<T> = std::result::Result<T, TelemetryError>;
