//! Trust Layer facade
//!
//! One explicitly constructed [`TrustContext`] owns the contract registry,
//! placeholder detector, quality analyzer, safety orchestrator and
//! observability engine, wired to a single environment. Hosts call the
//! pass-through surface directly, or bracket a write path with
//! [`TrustContext::guarded`], which runs the safety gate inside a span and
//! records the outcome.
//!
//! ```
//! use trust_layer::{TrustConfig, TrustContext};
//!
//! let ctx = TrustContext::init(TrustConfig::default()).unwrap();
//! let saved = ctx
//!     .guarded("save", Some(&serde_json::json!({"title": "Q3 report"})), || "written")
//!     .unwrap();
//! assert_eq!(saved, "written");
//! ```

use std::path::PathBuf;
use std::sync::{Mutex, MutexGuard, PoisonError};

use serde_json::Value;
use thiserror::Error;

use trust_gate::{
    ContractRegistry, DataContract, DataQualityMetrics, Environment, PlaceholderDetector,
    QualityAnalyzer, QualityCheckReport, SafetyCheckResult, SafetyConfig, SafetyOrchestrator,
    Schema, ValidationError, ValidationResult,
};
use trust_telemetry::{
    AlertCategory, AlertSeverity, ObservabilityConfig, ObservabilityEngine, SnapshotStore,
};

pub use trust_gate;
pub use trust_telemetry;

/// Errors surfaced by the facade
#[derive(Error, Debug)]
pub enum TrustError {
    #[error(transparent)]
    Gate(#[from] trust_gate::GateError),

    #[error(transparent)]
    Telemetry(#[from] trust_telemetry::TelemetryError),

    /// The safety gate refused the operation. The full check result is
    /// attached so the host can show which checks failed.
    #[error("operation '{operation}' blocked by safety check")]
    Blocked {
        operation: String,
        result: SafetyCheckResult,
    },
}

pub type Result<T> = std::result::Result<T, TrustError>;

/// Top-level configuration for a [`TrustContext`]
#[derive(Debug, Clone, Default)]
pub struct TrustConfig {
    pub safety: SafetyConfig,
    pub observability: ObservabilityConfig,
    /// Directory for the durable observability snapshot; `None` keeps the
    /// engine fully in memory.
    pub storage_path: Option<PathBuf>,
}

impl TrustConfig {
    /// Default configuration pinned to the given environment
    pub fn for_environment(environment: Environment) -> Self {
        Self {
            safety: SafetyConfig {
                environment,
                ..SafetyConfig::default()
            },
            ..Self::default()
        }
    }
}

/// The wired-together trust layer
pub struct TrustContext {
    registry: Mutex<ContractRegistry>,
    detector: PlaceholderDetector,
    analyzer: QualityAnalyzer,
    orchestrator: SafetyOrchestrator,
    engine: ObservabilityEngine,
}

impl TrustContext {
    /// Construct the context and, when called inside a tokio runtime, start
    /// the engine's background maintenance jobs.
    pub fn init(config: TrustConfig) -> Result<Self> {
        let engine = match &config.storage_path {
            Some(path) => {
                let store = SnapshotStore::open(path)?;
                ObservabilityEngine::with_store(config.observability.clone(), store)
            }
            None => ObservabilityEngine::new(config.observability.clone()),
        };
        if tokio::runtime::Handle::try_current().is_ok() {
            engine.start_background_jobs();
        }

        let environment = config.safety.environment;
        tracing::info!(environment = %environment, "trust layer initialized");

        Ok(Self {
            registry: Mutex::new(ContractRegistry::new(environment)),
            detector: PlaceholderDetector::new(environment),
            analyzer: QualityAnalyzer::new(),
            orchestrator: SafetyOrchestrator::new(config.safety),
            engine,
        })
    }

    /// Stop background jobs and flush the durable snapshot
    pub async fn shutdown(&self) {
        self.engine.shutdown().await;
        tracing::info!("trust layer shut down");
    }

    pub fn environment(&self) -> Environment {
        self.detector.environment()
    }

    /// The observability engine, for metric/log/trace/alert/health access
    pub fn observability(&self) -> &ObservabilityEngine {
        &self.engine
    }

    fn registry(&self) -> MutexGuard<'_, ContractRegistry> {
        self.registry.lock().unwrap_or_else(PoisonError::into_inner)
    }

    // ---- gate pass-through ----

    /// Register (or overwrite) a data contract under a key
    pub fn register_contract(&self, key: impl Into<String>, contract: DataContract) {
        self.registry().register(key, contract);
    }

    pub fn has_contract(&self, key: &str) -> bool {
        self.registry().contains(key)
    }

    /// Validate data against a registered contract, recording the
    /// validation duration as a metric.
    pub fn validate(&self, key: &str, data: &Value) -> ValidationResult {
        let result = self.registry().validate(key, data);
        self.engine.timing(
            "validation.duration",
            result.metadata.execution_time_ms as f64,
            Some(std::collections::HashMap::from([(
                "contract".to_string(),
                key.to_string(),
            )])),
        );
        result
    }

    /// Run a contract's quality checks against a record
    pub fn run_quality_checks(&self, key: &str, data: &Value) -> Result<Vec<QualityCheckReport>> {
        Ok(self.registry().run_quality_checks(key, data)?)
    }

    /// Scan a value for placeholder and mock content, recording the finding
    /// count as the `placeholder.count` metric (which alerts when non-zero).
    ///
    /// Objects and arrays are walked recursively; findings carry field-path
    /// locations.
    pub fn detect_placeholders(&self, data: &Value) -> Vec<ValidationError> {
        let findings = self.detector.scan(data);
        self.engine
            .record_metric("placeholder.count", findings.len() as f64, None, None);
        findings
    }

    /// Analyze a dataset across the five quality dimensions, recording the
    /// overall score as the `data_quality.score` metric (which alerts when
    /// below threshold).
    pub fn analyze_quality(
        &self,
        dataset: &[Value],
        schema: Option<&dyn Schema>,
    ) -> DataQualityMetrics {
        let metrics = self.analyzer.analyze(dataset, schema);
        self.engine.record_metric(
            "data_quality.score",
            metrics.overall_score as f64,
            None,
            None,
        );
        metrics
    }

    /// Run the four-check safety ladder without instrumentation
    pub fn perform_safety_check(&self, operation: &str, data: Option<&Value>) -> SafetyCheckResult {
        self.orchestrator.perform_safety_check(operation, data)
    }

    // ---- instrumented write path ----

    /// Run `action` behind the safety gate, inside a span.
    ///
    /// The gate verdict is recorded as a `gate.allowed` / `gate.blocked`
    /// counter tagged by operation. A blocked operation raises a
    /// data-quality alert and returns [`TrustError::Blocked`] without
    /// running `action`.
    pub fn guarded<T>(
        &self,
        operation: &str,
        data: Option<&Value>,
        action: impl FnOnce() -> T,
    ) -> Result<T> {
        let mut span = self.engine.start_span(operation, None, None);
        let check = self.orchestrator.perform_safety_check(operation, data);
        let tags = std::collections::HashMap::from([(
            "operation".to_string(),
            operation.to_string(),
        )]);

        if !check.is_safe {
            self.engine.increment("gate.blocked", Some(tags));
            let failed: Vec<&str> = check
                .checks
                .iter()
                .filter(|c| !c.passed)
                .map(|c| c.name.as_str())
                .collect();
            self.engine.create_alert(
                AlertSeverity::Warning,
                "Operation blocked by safety gate",
                format!("'{}' failed checks: {}", operation, failed.join(", ")),
                AlertCategory::DataQuality,
                Some(serde_json::json!({
                    "operation": operation,
                    "blocked_actions": check.blocked_actions,
                })),
            );
            self.engine.end_span(&mut span, Some("blocked by safety gate"));
            return Err(TrustError::Blocked {
                operation: operation.to_string(),
                result: check,
            });
        }

        let output = action();
        self.engine.increment("gate.allowed", Some(tags));
        self.engine.end_span(&mut span, None);
        Ok(output)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_init_default() {
        let ctx = TrustContext::init(TrustConfig::default()).unwrap();
        assert_eq!(ctx.environment(), Environment::Development);
        assert!(!ctx.has_contract("document"));
    }

    #[test]
    fn test_for_environment() {
        let config = TrustConfig::for_environment(Environment::Production);
        assert_eq!(config.safety.environment, Environment::Production);
        assert!(config.safety.block_placeholders);
    }

    #[test]
    fn test_detect_placeholders_walks_record_graphs() {
        let ctx = TrustContext::init(TrustConfig::default()).unwrap();
        let data = serde_json::json!({
            "title": "TBD",
            "sections": [{"body": "lorem ipsum text"}],
        });

        let findings = ctx.detect_placeholders(&data);
        assert_eq!(findings.len(), 2);
        assert!(findings.iter().any(|f| f.location.as_deref() == Some("title")));
        assert!(findings
            .iter()
            .any(|f| f.location.as_deref() == Some("sections[0].body")));

        // The finding count reached the metric pipeline.
        let metrics = ctx
            .observability()
            .get_metrics(Some("placeholder.count"), None);
        assert_eq!(metrics.len(), 1);
        assert_eq!(metrics[0].value, 2.0);
    }

    #[test]
    fn test_guarded_runs_action_when_safe() {
        let ctx = TrustContext::init(TrustConfig::default()).unwrap();
        let out = ctx
            .guarded("save", Some(&serde_json::json!({"title": "ok"})), || 7)
            .unwrap();
        assert_eq!(out, 7);

        let allowed = ctx.observability().get_metrics(Some("gate.allowed"), None);
        assert_eq!(allowed.len(), 1);
    }

    #[test]
    fn test_guarded_blocks_in_production() {
        let ctx =
            TrustContext::init(TrustConfig::for_environment(Environment::Production)).unwrap();
        let data = serde_json::json!({"title": "TBD"});

        let err = ctx.guarded("save", Some(&data), || 7).unwrap_err();
        match err {
            TrustError::Blocked { operation, result } => {
                assert_eq!(operation, "save");
                assert_eq!(result.blocked_actions, vec!["save".to_string()]);
            }
            other => panic!("unexpected error: {other}"),
        }

        let alerts = ctx
            .observability()
            .get_alerts_by_category(AlertCategory::DataQuality);
        assert_eq!(alerts.len(), 1);
        let blocked = ctx.observability().get_metrics(Some("gate.blocked"), None);
        assert_eq!(blocked.len(), 1);
    }
}
