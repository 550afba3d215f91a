//! Observability engine configuration

use serde::{Deserialize, Serialize};

/// Thresholds driving automatic alerting on metric recording
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AlertThresholds {
    /// Maximum acceptable rolling error rate (0.0 - 1.0) over the last hour
    pub error_rate: f64,
    /// Latency ceiling in milliseconds for duration/latency metrics
    pub latency_ms: f64,
    /// Minimum acceptable data quality score (0 - 100)
    pub data_quality_score: f64,
    /// Placeholder count above which the alert escalates to error
    pub placeholder_count: u64,
}

impl Default for AlertThresholds {
    fn default() -> Self {
        Self {
            error_rate: 0.05,
            latency_ms: 1000.0,
            data_quality_score: 70.0,
            placeholder_count: 5,
        }
    }
}

/// Configuration for the observability engine
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ObservabilityConfig {
    pub enable_metrics: bool,
    pub enable_logging: bool,
    pub enable_tracing: bool,
    pub enable_alerts: bool,
    pub enable_health_checks: bool,
    /// Retention window for metrics (and the alert purge key), in days
    pub metric_retention_days: i64,
    /// Retention window for log entries, in days; shorter than metrics
    pub log_retention_days: i64,
    pub alert_thresholds: AlertThresholds,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            enable_metrics: true,
            enable_logging: true,
            enable_tracing: true,
            enable_alerts: true,
            enable_health_checks: true,
            metric_retention_days: 7,
            log_retention_days: 3,
            alert_thresholds: AlertThresholds::default(),
        }
    }
}
