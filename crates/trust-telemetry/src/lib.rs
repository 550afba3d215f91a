//! In-process observability engine: metrics, logging, tracing, alerting
//! and health checks for operations that pass through the trust layer.
//!
//! The engine keeps everything in memory behind a mutex, optionally
//! persisting a bounded snapshot (last 1000 metrics, 500 logs, 100 alerts)
//! to a local sled database after every mutation. Background tasks purge
//! expired data hourly and re-run health checks every five minutes.
//!
//! ```
//! use trust_telemetry::{ObservabilityConfig, ObservabilityEngine};
//!
//! let engine = ObservabilityEngine::new(ObservabilityConfig::default());
//! engine.timing("save.duration", 42.0, None);
//! let stats = engine.get_metric_stats("save.duration").unwrap();
//! assert_eq!(stats.count, 1);
//! ```

pub mod config;
pub mod engine;
pub mod error;
mod jobs;
pub mod store;
pub mod types;

pub use config::{AlertThresholds, ObservabilityConfig};
pub use engine::{
    ObservabilityEngine, CHECK_DURABLE_STORAGE, CHECK_EPHEMERAL_STORAGE, CHECK_ERROR_RATE,
};
pub use error::{Result, TelemetryError};
pub use store::{SnapshotStore, StateSnapshot};
pub use types::{
    Alert, AlertCategory, AlertSeverity, HealthCheck, HealthStatus, LogEntry, LogLevel, Metric,
    MetricStats, Span, SpanStatus,
};
