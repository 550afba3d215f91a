//! Observability record types
//!
//! Metrics, log entries, spans, alerts and health-check results are
//! append-only: once stored they are never mutated except for
//! `Alert::resolved`/`resolved_at` and span completion fields, each set
//! exactly once. All types are JSON-serializable without loss so the
//! bounded snapshot can round-trip through durable storage.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use uuid::Uuid;

/// A single recorded measurement
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Metric {
    pub name: String,
    pub value: f64,
    pub timestamp: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tags: Option<HashMap<String, String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub unit: Option<String>,
}

/// Summary statistics over a metric's rolling window
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MetricStats {
    pub count: usize,
    pub min: f64,
    pub max: f64,
    pub mean: f64,
    pub p50: f64,
    pub p95: f64,
    pub p99: f64,
}

/// Log level of a stored entry
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Debug,
    Info,
    Warn,
    Error,
}

impl fmt::Display for LogLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LogLevel::Debug => write!(f, "debug"),
            LogLevel::Info => write!(f, "info"),
            LogLevel::Warn => write!(f, "warn"),
            LogLevel::Error => write!(f, "error"),
        }
    }
}

/// A structured log entry retained in the engine's bounded log store
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LogEntry {
    pub level: LogLevel,
    pub message: String,
    pub timestamp: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub context: Option<serde_json::Value>,
}

/// Terminal status of a span
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SpanStatus {
    Ok,
    Error,
}

/// A timed unit of work, grouped under a trace for latency attribution
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Span {
    pub trace_id: Uuid,
    pub span_id: Uuid,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub parent_span_id: Option<Uuid>,
    pub operation: String,
    pub start_time: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub end_time: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub duration_ms: Option<u64>,
    pub status: SpanStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tags: Option<HashMap<String, String>>,
}

impl Span {
    /// Create a new open span in the given trace
    pub fn new(
        trace_id: Uuid,
        parent_span_id: Option<Uuid>,
        operation: &str,
        tags: Option<HashMap<String, String>>,
    ) -> Self {
        Self {
            trace_id,
            span_id: Uuid::new_v4(),
            parent_span_id,
            operation: operation.to_string(),
            start_time: Utc::now(),
            end_time: None,
            duration_ms: None,
            status: SpanStatus::Ok,
            error: None,
            tags,
        }
    }

    /// Stamp completion fields. Sets end time, duration and status exactly
    /// once; later calls are no-ops.
    pub fn complete(&mut self, error: Option<String>) {
        if self.end_time.is_some() {
            return;
        }
        let now = Utc::now();
        self.end_time = Some(now);
        self.duration_ms = Some(
            (now - self.start_time)
                .num_milliseconds()
                .max(0) as u64,
        );
        if let Some(message) = error {
            self.status = SpanStatus::Error;
            self.error = Some(message);
        }
    }

    pub fn is_finished(&self) -> bool {
        self.end_time.is_some()
    }
}

/// Severity of an alert
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AlertSeverity {
    Info,
    Warning,
    Error,
    Critical,
}

impl fmt::Display for AlertSeverity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AlertSeverity::Info => write!(f, "info"),
            AlertSeverity::Warning => write!(f, "warning"),
            AlertSeverity::Error => write!(f, "error"),
            AlertSeverity::Critical => write!(f, "critical"),
        }
    }
}

/// Category of an alert, used by the host to choose how to render it
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AlertCategory {
    Performance,
    DataQuality,
    Security,
    System,
}

impl fmt::Display for AlertCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AlertCategory::Performance => write!(f, "performance"),
            AlertCategory::DataQuality => write!(f, "data_quality"),
            AlertCategory::Security => write!(f, "security"),
            AlertCategory::System => write!(f, "system"),
        }
    }
}

/// A raised alert; `resolved`/`resolved_at` are the only mutable fields
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Alert {
    pub id: Uuid,
    pub severity: AlertSeverity,
    pub title: String,
    pub message: String,
    pub timestamp: DateTime<Utc>,
    pub category: AlertCategory,
    pub resolved: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub resolved_at: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub metadata: Option<serde_json::Value>,
}

impl Alert {
    pub fn new(
        severity: AlertSeverity,
        title: impl Into<String>,
        message: impl Into<String>,
        category: AlertCategory,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            severity,
            title: title.into(),
            message: message.into(),
            timestamp: Utc::now(),
            category,
            resolved: false,
            resolved_at: None,
            metadata: None,
        }
    }

    pub fn with_metadata(mut self, metadata: serde_json::Value) -> Self {
        self.metadata = Some(metadata);
        self
    }
}

/// Status of a health check
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HealthStatus {
    Healthy,
    Degraded,
    Unhealthy,
}

/// Timestamped result of a named health check
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthCheck {
    pub name: String,
    pub status: HealthStatus,
    pub message: String,
    pub timestamp: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<serde_json::Value>,
}

impl HealthCheck {
    pub fn new(name: impl Into<String>, status: HealthStatus, message: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            status,
            message: message.into(),
            timestamp: Utc::now(),
            details: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_span_completion_roundtrip() {
        let mut span = Span::new(Uuid::new_v4(), None, "document.save", None);
        assert!(!span.is_finished());

        span.complete(None);

        assert_eq!(span.status, SpanStatus::Ok);
        assert!(span.end_time.is_some());
        let expected =
            (span.end_time.unwrap() - span.start_time).num_milliseconds().max(0) as u64;
        assert_eq!(span.duration_ms, Some(expected));
    }

    #[test]
    fn test_span_error_completion() {
        let mut span = Span::new(Uuid::new_v4(), None, "task.update", None);
        span.complete(Some("validation failed".to_string()));

        assert_eq!(span.status, SpanStatus::Error);
        assert_eq!(span.error.as_deref(), Some("validation failed"));
    }

    #[test]
    fn test_span_completion_is_set_once() {
        let mut span = Span::new(Uuid::new_v4(), None, "op", None);
        span.complete(None);
        let first_end = span.end_time;

        span.complete(Some("too late".to_string()));
        assert_eq!(span.end_time, first_end);
        assert_eq!(span.status, SpanStatus::Ok);
        assert!(span.error.is_none());
    }

    #[test]
    fn test_alert_starts_unresolved() {
        let alert = Alert::new(
            AlertSeverity::Warning,
            "High latency detected",
            "save.duration exceeded 1000ms",
            AlertCategory::Performance,
        );
        assert!(!alert.resolved);
        assert!(alert.resolved_at.is_none());
    }

    #[test]
    fn test_span_json_roundtrip() {
        let mut span = Span::new(Uuid::new_v4(), Some(Uuid::new_v4()), "settings.save", None);
        span.complete(None);

        let json = serde_json::to_string(&span).unwrap();
        let back: Span = serde_json::from_str(&json).unwrap();
        assert_eq!(back.span_id, span.span_id);
        assert_eq!(back.trace_id, span.trace_id);
        assert_eq!(back.duration_ms, span.duration_ms);
    }

    #[test]
    fn test_severity_and_level_names() {
        assert_eq!(AlertSeverity::Critical.to_string(), "critical");
        assert_eq!(LogLevel::Warn.to_string(), "warn");
        assert_eq!(AlertCategory::DataQuality.to_string(), "data_quality");
    }
}
