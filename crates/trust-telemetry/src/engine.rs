//! The observability engine
//!
//! Records metrics, logs, spans, alerts and health checks for every
//! operation that passes through the trust layer, keeps a bounded window of
//! its own state, and persists a snapshot to durable storage after every
//! mutation.
//!
//! Note: recording a metric is the one place where storage has a further
//! side effect. Every `record_metric` call also evaluates the configured
//! alert thresholds and may raise an alert (which in turn writes a log
//! entry). Span completion records `span.duration`/`span.errors` metrics,
//! so spans and metrics are coupled, not orthogonal.

use chrono::{DateTime, Duration, Utc};
use serde_json::Value;
use std::collections::{BTreeMap, HashMap, VecDeque};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use uuid::Uuid;

use crate::config::ObservabilityConfig;
use crate::store::{SnapshotStore, StateSnapshot, SNAPSHOT_ALERTS, SNAPSHOT_LOGS, SNAPSHOT_METRICS};
use crate::types::{
    Alert, AlertCategory, AlertSeverity, HealthCheck, HealthStatus, LogEntry, LogLevel, Metric,
    MetricStats, Span, SpanStatus,
};

/// Rolling per-name aggregate window used for percentile statistics
const ROLLING_WINDOW: usize = 1000;

/// A registered health-check predicate
pub type HealthCheckFn = Box<dyn Fn() -> (HealthStatus, String) + Send + Sync>;

/// Names of the built-in checks re-run by the periodic health sweep
pub const CHECK_DURABLE_STORAGE: &str = "durable_storage";
pub const CHECK_EPHEMERAL_STORAGE: &str = "ephemeral_storage";
pub const CHECK_ERROR_RATE: &str = "error_rate";

#[derive(Default)]
pub(crate) struct EngineState {
    metrics: Vec<Metric>,
    rolling: HashMap<String, VecDeque<f64>>,
    logs: Vec<LogEntry>,
    traces: HashMap<Uuid, Vec<Span>>,
    alerts: Vec<Alert>,
    health: BTreeMap<String, HealthCheck>,
}

impl EngineState {
    fn push_metric(&mut self, metric: Metric) {
        let window = self.rolling.entry(metric.name.clone()).or_default();
        window.push_back(metric.value);
        if window.len() > ROLLING_WINDOW {
            window.pop_front();
        }
        self.metrics.push(metric);
    }

    fn push_alert(&mut self, alert: Alert, logging_enabled: bool) {
        if logging_enabled {
            let level = if alert.severity >= AlertSeverity::Error {
                LogLevel::Error
            } else {
                LogLevel::Warn
            };
            self.logs.push(LogEntry {
                level,
                message: format!("[{}] {}: {}", alert.category, alert.title, alert.message),
                timestamp: Utc::now(),
                context: None,
            });
        }
        self.alerts.push(alert);
    }
}

/// State shared between foreground calls and the background sweeps.
pub(crate) struct Shared {
    pub(crate) config: ObservabilityConfig,
    state: Mutex<EngineState>,
    checks: Mutex<Vec<(String, HealthCheckFn)>>,
    store: Option<SnapshotStore>,
}

impl Shared {
    fn state(&self) -> MutexGuard<'_, EngineState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Persist the bounded snapshot. Best-effort: storage failures are
    /// logged by the store and never reach the caller.
    fn persist(&self) {
        let Some(store) = &self.store else { return };
        let snapshot = {
            let state = self.state();
            StateSnapshot {
                metrics: tail(&state.metrics, SNAPSHOT_METRICS),
                logs: tail(&state.logs, SNAPSHOT_LOGS),
                alerts: tail(&state.alerts, SNAPSHOT_ALERTS),
            }
        };
        store.save(&snapshot);
    }

    /// Evaluate alert thresholds for a freshly recorded metric.
    fn evaluate_thresholds(&self, state: &mut EngineState, name: &str, value: f64) {
        if !self.config.enable_alerts {
            return;
        }
        let thresholds = &self.config.alert_thresholds;

        if (name.contains("duration") || name.contains("latency")) && value > thresholds.latency_ms
        {
            state.push_alert(
                Alert::new(
                    AlertSeverity::Warning,
                    "High latency detected",
                    format!(
                        "{} was {:.0}ms, above the {:.0}ms threshold",
                        name, value, thresholds.latency_ms
                    ),
                    AlertCategory::Performance,
                ),
                self.config.enable_logging,
            );
        }

        if name == "placeholder.count" && value > 0.0 {
            let severity = if value > thresholds.placeholder_count as f64 {
                AlertSeverity::Error
            } else {
                AlertSeverity::Warning
            };
            state.push_alert(
                Alert::new(
                    severity,
                    "Placeholder content detected",
                    format!("{:.0} placeholder finding(s) recorded", value),
                    AlertCategory::DataQuality,
                ),
                self.config.enable_logging,
            );
        }

        if name == "data_quality.score" && value < thresholds.data_quality_score {
            state.push_alert(
                Alert::new(
                    AlertSeverity::Warning,
                    "Data quality below threshold",
                    format!(
                        "score {:.0} is below the {:.0} threshold",
                        value, thresholds.data_quality_score
                    ),
                    AlertCategory::DataQuality,
                ),
                self.config.enable_logging,
            );
        }
    }

    /// Hourly retention sweep: purge metrics and logs past their windows,
    /// alerts past the metric window (resolved alerts keyed off
    /// `resolved_at`), and completed spans past the metric window.
    pub(crate) fn sweep_retention(&self) {
        let now = Utc::now();
        let metric_cutoff = now - Duration::days(self.config.metric_retention_days);
        let log_cutoff = now - Duration::days(self.config.log_retention_days);

        {
            let mut state = self.state();
            state.metrics.retain(|m| m.timestamp >= metric_cutoff);
            state.logs.retain(|l| l.timestamp >= log_cutoff);
            state.alerts.retain(|a| {
                if a.resolved {
                    a.resolved_at.map(|t| t >= metric_cutoff).unwrap_or(true)
                } else {
                    a.timestamp >= metric_cutoff
                }
            });
            for spans in state.traces.values_mut() {
                spans.retain(|s| s.end_time.map(|t| t >= metric_cutoff).unwrap_or(true));
            }
            state.traces.retain(|_, spans| !spans.is_empty());
        }
        tracing::debug!("retention sweep completed");
        self.persist();
    }

    /// Five-minute health sweep: built-in checks plus every registered one.
    ///
    /// Registered check functions must not register further checks from
    /// inside the callback.
    pub(crate) fn sweep_health(&self) {
        if !self.config.enable_health_checks {
            return;
        }

        let durable = match &self.store {
            Some(store) if store.is_available() => HealthCheck::new(
                CHECK_DURABLE_STORAGE,
                HealthStatus::Healthy,
                "durable store is writable",
            ),
            Some(_) => HealthCheck::new(
                CHECK_DURABLE_STORAGE,
                HealthStatus::Unhealthy,
                "durable store probe failed",
            ),
            None => HealthCheck::new(
                CHECK_DURABLE_STORAGE,
                HealthStatus::Healthy,
                "persistence disabled",
            ),
        };

        let (ephemeral, error_rate) = {
            let state = self.state();
            let ephemeral = HealthCheck::new(
                CHECK_EPHEMERAL_STORAGE,
                HealthStatus::Healthy,
                format!(
                    "{} metrics, {} logs, {} alerts in memory",
                    state.metrics.len(),
                    state.logs.len(),
                    state.alerts.len()
                ),
            );

            let hour_ago = Utc::now() - Duration::hours(1);
            let recent: Vec<_> = state.logs.iter().filter(|l| l.timestamp >= hour_ago).collect();
            let errors = recent.iter().filter(|l| l.level == LogLevel::Error).count();
            let rate = if recent.is_empty() {
                0.0
            } else {
                errors as f64 / recent.len() as f64
            };
            let status = if rate <= self.config.alert_thresholds.error_rate {
                HealthStatus::Healthy
            } else {
                HealthStatus::Unhealthy
            };
            let error_rate = HealthCheck::new(
                CHECK_ERROR_RATE,
                status,
                format!(
                    "error rate {:.3} over the last hour ({} of {} entries)",
                    rate,
                    errors,
                    recent.len()
                ),
            );
            (ephemeral, error_rate)
        };

        // Run registered checks outside the state lock; they may call back
        // into the engine's metric and log methods.
        let mut results = vec![durable, ephemeral, error_rate];
        {
            let checks = self.checks.lock().unwrap_or_else(PoisonError::into_inner);
            for (name, check) in checks.iter() {
                let (status, message) = check();
                results.push(HealthCheck::new(name.clone(), status, message));
            }
        }

        let mut state = self.state();
        for result in results {
            state.health.insert(result.name.clone(), result);
        }
    }
}

/// In-process observability engine.
///
/// All operations are synchronous and safe to call from any thread; shared
/// collections are guarded by a mutex, and the only I/O is the best-effort
/// snapshot write at the end of each mutation.
pub struct ObservabilityEngine {
    shared: Arc<Shared>,
    jobs: Mutex<Option<crate::jobs::BackgroundJobs>>,
}

impl ObservabilityEngine {
    /// Create an engine with no durable store (ephemeral only)
    pub fn new(config: ObservabilityConfig) -> Self {
        Self::build(config, None)
    }

    /// Create an engine backed by a durable snapshot store, loading the
    /// snapshot persisted by a previous run.
    pub fn with_store(config: ObservabilityConfig, store: SnapshotStore) -> Self {
        Self::build(config, Some(store))
    }

    fn build(config: ObservabilityConfig, store: Option<SnapshotStore>) -> Self {
        let mut state = EngineState::default();
        if let Some(snapshot) = store.as_ref().and_then(SnapshotStore::load) {
            for metric in &snapshot.metrics {
                let window = state.rolling.entry(metric.name.clone()).or_default();
                window.push_back(metric.value);
            }
            state.metrics = snapshot.metrics;
            state.logs = snapshot.logs;
            state.alerts = snapshot.alerts;
        }

        Self {
            shared: Arc::new(Shared {
                config,
                state: Mutex::new(state),
                checks: Mutex::new(Vec::new()),
                store,
            }),
            jobs: Mutex::new(None),
        }
    }

    pub fn config(&self) -> &ObservabilityConfig {
        &self.shared.config
    }

    // ---- metrics ----

    /// Record a measurement.
    ///
    /// Side effect: evaluates the configured alert thresholds and may raise
    /// an alert (see the module docs).
    pub fn record_metric(
        &self,
        name: &str,
        value: f64,
        tags: Option<HashMap<String, String>>,
        unit: Option<&str>,
    ) {
        if !self.shared.config.enable_metrics {
            return;
        }
        let metric = Metric {
            name: name.to_string(),
            value,
            timestamp: Utc::now(),
            tags,
            unit: unit.map(String::from),
        };
        {
            let mut state = self.shared.state();
            state.push_metric(metric);
            self.shared.evaluate_thresholds(&mut state, name, value);
        }
        self.shared.persist();
    }

    /// Record latest-value + 1 for a (name, tags) pair
    pub fn increment(&self, name: &str, tags: Option<HashMap<String, String>>) {
        let latest = self.latest_value(name, &tags);
        self.record_metric(name, latest + 1.0, tags, None);
    }

    /// Record latest-value - 1 for a (name, tags) pair
    pub fn decrement(&self, name: &str, tags: Option<HashMap<String, String>>) {
        let latest = self.latest_value(name, &tags);
        self.record_metric(name, latest - 1.0, tags, None);
    }

    /// Record a duration measurement in milliseconds
    pub fn timing(&self, name: &str, duration_ms: f64, tags: Option<HashMap<String, String>>) {
        self.record_metric(name, duration_ms, tags, Some("ms"));
    }

    fn latest_value(&self, name: &str, tags: &Option<HashMap<String, String>>) -> f64 {
        let state = self.shared.state();
        state
            .metrics
            .iter()
            .rev()
            .find(|m| m.name == name && m.tags == *tags)
            .map(|m| m.value)
            .unwrap_or(0.0)
    }

    /// Stored metrics, optionally filtered by name and minimum timestamp
    pub fn get_metrics(&self, name: Option<&str>, since: Option<DateTime<Utc>>) -> Vec<Metric> {
        let state = self.shared.state();
        state
            .metrics
            .iter()
            .filter(|m| name.map(|n| m.name == n).unwrap_or(true))
            .filter(|m| since.map(|s| m.timestamp >= s).unwrap_or(true))
            .cloned()
            .collect()
    }

    /// Summary statistics over the metric's rolling window.
    ///
    /// Percentiles index the sorted window at `floor(n * percentile)`.
    pub fn get_metric_stats(&self, name: &str) -> Option<MetricStats> {
        let state = self.shared.state();
        let window = state.rolling.get(name)?;
        if window.is_empty() {
            return None;
        }
        let mut sorted: Vec<f64> = window.iter().copied().collect();
        sorted.sort_by(f64::total_cmp);

        let n = sorted.len();
        let at = |p: f64| sorted[(((n as f64) * p).floor() as usize).min(n - 1)];

        Some(MetricStats {
            count: n,
            min: sorted[0],
            max: sorted[n - 1],
            mean: sorted.iter().sum::<f64>() / n as f64,
            p50: at(0.50),
            p95: at(0.95),
            p99: at(0.99),
        })
    }

    // ---- logging ----

    pub fn debug(&self, message: impl Into<String>, context: Option<Value>) {
        self.log(LogLevel::Debug, message.into(), context);
    }

    pub fn info(&self, message: impl Into<String>, context: Option<Value>) {
        self.log(LogLevel::Info, message.into(), context);
    }

    pub fn warn(&self, message: impl Into<String>, context: Option<Value>) {
        self.log(LogLevel::Warn, message.into(), context);
    }

    /// Log at error level and increment the `error.count` metric tagged
    /// `level=error`.
    pub fn error(&self, message: impl Into<String>, error: Option<&str>, context: Option<Value>) {
        let message = match error {
            Some(err) => format!("{}: {}", message.into(), err),
            None => message.into(),
        };
        self.log(LogLevel::Error, message, context);
        self.increment(
            "error.count",
            Some(HashMap::from([("level".to_string(), "error".to_string())])),
        );
    }

    fn log(&self, level: LogLevel, message: String, context: Option<Value>) {
        if !self.shared.config.enable_logging {
            return;
        }
        {
            let mut state = self.shared.state();
            state.logs.push(LogEntry {
                level,
                message,
                timestamp: Utc::now(),
                context,
            });
        }
        self.shared.persist();
    }

    /// Stored log entries, optionally filtered by level and minimum timestamp
    pub fn get_logs(&self, level: Option<LogLevel>, since: Option<DateTime<Utc>>) -> Vec<LogEntry> {
        let state = self.shared.state();
        state
            .logs
            .iter()
            .filter(|l| level.map(|lv| l.level == lv).unwrap_or(true))
            .filter(|l| since.map(|s| l.timestamp >= s).unwrap_or(true))
            .cloned()
            .collect()
    }

    // ---- tracing ----

    /// Start a span. With a parent, the span joins the parent's trace
    /// (found by reverse lookup over all known traces); an unknown parent
    /// starts a new trace.
    pub fn start_span(
        &self,
        operation: &str,
        parent_span_id: Option<Uuid>,
        tags: Option<HashMap<String, String>>,
    ) -> Span {
        let mut state = self.shared.state();
        let trace_id = parent_span_id
            .and_then(|parent| {
                state
                    .traces
                    .iter()
                    .find(|(_, spans)| spans.iter().any(|s| s.span_id == parent))
                    .map(|(trace_id, _)| *trace_id)
            })
            .unwrap_or_else(Uuid::new_v4);

        let span = Span::new(trace_id, parent_span_id, operation, tags);
        if self.shared.config.enable_tracing {
            state.traces.entry(trace_id).or_default().push(span.clone());
        }
        span
    }

    /// Complete a span, stamping end time, duration and status exactly once.
    ///
    /// Side effect: records `span.duration` (ms, tagged by operation) on
    /// success or bumps `span.errors` on failure, which may in turn trip the
    /// latency threshold alert.
    pub fn end_span(&self, span: &mut Span, error: Option<&str>) {
        if span.is_finished() {
            return;
        }
        span.complete(error.map(String::from));

        if self.shared.config.enable_tracing {
            let mut state = self.shared.state();
            if let Some(spans) = state.traces.get_mut(&span.trace_id) {
                if let Some(stored) = spans.iter_mut().find(|s| s.span_id == span.span_id) {
                    *stored = span.clone();
                }
            }
        }

        let tags = HashMap::from([("operation".to_string(), span.operation.clone())]);
        match span.status {
            SpanStatus::Error => self.increment("span.errors", Some(tags)),
            SpanStatus::Ok => self.record_metric(
                "span.duration",
                span.duration_ms.unwrap_or(0) as f64,
                Some(tags),
                Some("ms"),
            ),
        }
    }

    /// All spans recorded under a trace
    pub fn get_trace(&self, trace_id: Uuid) -> Vec<Span> {
        let state = self.shared.state();
        state.traces.get(&trace_id).cloned().unwrap_or_default()
    }

    // ---- alerting ----

    /// Raise an alert; also writes a log entry at error or warn level
    /// depending on severity.
    pub fn create_alert(
        &self,
        severity: AlertSeverity,
        title: impl Into<String>,
        message: impl Into<String>,
        category: AlertCategory,
        metadata: Option<Value>,
    ) -> Alert {
        let mut alert = Alert::new(severity, title, message, category);
        if let Some(metadata) = metadata {
            alert = alert.with_metadata(metadata);
        }
        if self.shared.config.enable_alerts {
            {
                let mut state = self.shared.state();
                state.push_alert(alert.clone(), self.shared.config.enable_logging);
            }
            self.shared.persist();
        }
        alert
    }

    /// Resolve an alert. Idempotent: a second call leaves `resolved_at`
    /// unchanged. Returns true if the alert was newly resolved.
    pub fn resolve_alert(&self, id: Uuid) -> bool {
        let newly_resolved = {
            let mut state = self.shared.state();
            match state.alerts.iter_mut().find(|a| a.id == id && !a.resolved) {
                Some(alert) => {
                    alert.resolved = true;
                    alert.resolved_at = Some(Utc::now());
                    true
                }
                None => false,
            }
        };
        if newly_resolved {
            self.shared.persist();
        }
        newly_resolved
    }

    /// Unresolved alerts
    pub fn get_active_alerts(&self) -> Vec<Alert> {
        let state = self.shared.state();
        state.alerts.iter().filter(|a| !a.resolved).cloned().collect()
    }

    /// Unresolved alerts in the given category
    pub fn get_alerts_by_category(&self, category: AlertCategory) -> Vec<Alert> {
        let state = self.shared.state();
        state
            .alerts
            .iter()
            .filter(|a| !a.resolved && a.category == category)
            .cloned()
            .collect()
    }

    // ---- health ----

    /// Register a health check; it runs immediately and again on every
    /// periodic health sweep.
    pub fn register_health_check(
        &self,
        name: &str,
        check: impl Fn() -> (HealthStatus, String) + Send + Sync + 'static,
    ) {
        if !self.shared.config.enable_health_checks {
            return;
        }
        let (status, message) = check();
        {
            let mut state = self.shared.state();
            state
                .health
                .insert(name.to_string(), HealthCheck::new(name, status, message));
        }
        let mut checks = self
            .shared
            .checks
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        checks.push((name.to_string(), Box::new(check)));
    }

    /// Re-run the built-in and registered health checks now
    pub fn run_health_checks(&self) {
        self.shared.sweep_health();
    }

    /// Current timestamped results of all checks
    pub fn get_health_checks(&self) -> Vec<HealthCheck> {
        let state = self.shared.state();
        state.health.values().cloned().collect()
    }

    /// True iff every registered check is currently healthy
    pub fn is_system_healthy(&self) -> bool {
        let state = self.shared.state();
        state.health.values().all(|h| h.status == HealthStatus::Healthy)
    }

    // ---- maintenance ----

    /// Run the retention sweep now
    pub fn cleanup(&self) {
        self.shared.sweep_retention();
    }

    /// Spawn the hourly retention sweep and the five-minute health sweep.
    /// Must be called from within a tokio runtime; calling twice is a no-op.
    pub fn start_background_jobs(&self) {
        let mut jobs = self.jobs.lock().unwrap_or_else(PoisonError::into_inner);
        if jobs.is_none() {
            *jobs = Some(crate::jobs::BackgroundJobs::spawn(Arc::clone(&self.shared)));
        }
    }

    /// Stop the background jobs, finish any in-flight sweep, and flush the
    /// durable store.
    pub async fn shutdown(&self) {
        let jobs = {
            let mut guard = self.jobs.lock().unwrap_or_else(PoisonError::into_inner);
            guard.take()
        };
        if let Some(jobs) = jobs {
            jobs.stop().await;
        }
        self.shared.persist();
        if let Some(store) = &self.shared.store {
            store.flush();
        }
    }
}

fn tail<T: Clone>(items: &[T], n: usize) -> Vec<T> {
    let start = items.len().saturating_sub(n);
    items[start..].to_vec()
}
