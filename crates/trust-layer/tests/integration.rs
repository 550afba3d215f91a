//! End-to-end tests wiring the gate and the observability engine together
//! through a single `TrustContext`.

use serde_json::json;
use trust_layer::{TrustConfig, TrustContext, TrustError};

use trust_gate::{
    codes, DataContract, Environment, FieldSpec, ObjectSchema, Severity, ValidationRule,
};
use trust_telemetry::{AlertCategory, AlertSeverity, HealthStatus, LogLevel};

fn init_tracing() {
    let _ = tracing_subscriber::fmt().with_test_writer().try_init();
}

fn document_schema() -> ObjectSchema {
    ObjectSchema::new()
        .field("title", FieldSpec::string().required().non_empty().max_length(500))
        .field("body", FieldSpec::string())
}

fn document_contract() -> DataContract {
    DataContract::new(document_schema(), "1.0.0").with_rule(
        ValidationRule::new(
            "title_not_placeholder",
            "Document title must not be a placeholder",
            |data| {
                data.get("title")
                    .and_then(|t| t.as_str())
                    .map(|t| t != "Untitled")
                    .unwrap_or(true)
            },
        )
        .with_severity(Severity::High),
    )
}

#[test]
fn valid_document_passes_contract() {
    init_tracing();
    let ctx = TrustContext::init(TrustConfig::default()).unwrap();
    ctx.register_contract("document", document_contract());

    let result = ctx.validate("document", &json!({"title": "Q3 report", "body": "text"}));
    assert!(result.is_valid);
    assert!(result.errors.is_empty());

    // Validation recorded its duration as a metric.
    let metrics = ctx
        .observability()
        .get_metrics(Some("validation.duration"), None);
    assert_eq!(metrics.len(), 1);
    assert_eq!(metrics[0].unit.as_deref(), Some("ms"));
}

#[test]
fn empty_title_yields_single_high_severity_error() {
    let ctx = TrustContext::init(TrustConfig::default()).unwrap();
    ctx.register_contract("document", document_contract());

    let result = ctx.validate("document", &json!({"title": ""}));
    assert!(!result.is_valid);
    assert_eq!(result.errors.len(), 1);
    assert_eq!(result.errors[0].code, codes::SCHEMA_VALIDATION_ERROR);
    assert_eq!(result.errors[0].severity, Severity::High);
    assert_eq!(result.errors[0].location.as_deref(), Some("title"));
}

#[test]
fn custom_rules_run_only_after_structure_passes() {
    let ctx = TrustContext::init(TrustConfig::default()).unwrap();
    ctx.register_contract("document", document_contract());

    // Structurally valid but breaks the custom rule.
    let result = ctx.validate("document", &json!({"title": "Untitled"}));
    assert_eq!(result.errors.len(), 1);
    assert_eq!(result.errors[0].code, codes::CUSTOM_VALIDATION_FAILED);

    // Structurally invalid: the rule is skipped.
    let result = ctx.validate("document", &json!({"title": 7}));
    assert!(result
        .errors
        .iter()
        .all(|e| e.code == codes::SCHEMA_VALIDATION_ERROR));
}

#[test]
fn missing_contract_is_a_single_critical_error() {
    let ctx = TrustContext::init(TrustConfig::default()).unwrap();
    let result = ctx.validate("unknown", &json!({}));
    assert!(!result.is_valid);
    assert_eq!(result.errors.len(), 1);
    assert_eq!(result.errors[0].code, codes::SCHEMA_NOT_FOUND);
    assert_eq!(result.errors[0].severity, Severity::Critical);
}

#[test]
fn production_tbd_blocks_save() {
    init_tracing();
    let ctx = TrustContext::init(TrustConfig::for_environment(Environment::Production)).unwrap();
    let data = json!({"title": "TBD", "body": "real content"});

    let err = ctx.guarded("save", Some(&data), || ()).unwrap_err();
    let TrustError::Blocked { operation, result } = err else {
        panic!("expected Blocked");
    };
    assert_eq!(operation, "save");
    assert!(!result.is_safe);
    assert_eq!(result.blocked_actions, vec!["save".to_string()]);
    assert!(!result.recommendations.is_empty());

    // Blocking raised exactly one data-quality alert.
    let alerts = ctx
        .observability()
        .get_alerts_by_category(AlertCategory::DataQuality);
    assert_eq!(alerts.len(), 1);
}

#[test]
fn development_tbd_is_flagged_but_not_blocked() {
    let ctx = TrustContext::init(TrustConfig::default()).unwrap();
    let data = json!({"title": "TBD"});

    // The detector still reports the finding in development.
    let findings = ctx.detect_placeholders(&data);
    assert_eq!(findings.len(), 1);
    assert_eq!(findings[0].severity, Severity::High);

    // But the gate lets the write through.
    assert!(ctx.guarded("save", Some(&data), || ()).is_ok());
}

#[test]
fn placeholder_scan_feeds_the_alerting_pipeline() {
    let ctx = TrustContext::init(TrustConfig::default()).unwrap();
    let data = json!({
        "a": "TBD", "b": "TODO", "c": "N/A",
        "d": "???", "e": "changeme", "f": "<placeholder>",
    });

    let findings = ctx.detect_placeholders(&data);
    assert!(findings.len() > 5);

    // placeholder.count above the default threshold escalates to error.
    let alerts = ctx
        .observability()
        .get_alerts_by_category(AlertCategory::DataQuality);
    assert_eq!(alerts.len(), 1);
    assert_eq!(alerts[0].severity, AlertSeverity::Error);
}

#[test]
fn slow_operation_raises_one_performance_warning() {
    let ctx = TrustContext::init(TrustConfig::default()).unwrap();
    ctx.observability().timing("save.duration", 1500.0, None);

    let alerts = ctx
        .observability()
        .get_alerts_by_category(AlertCategory::Performance);
    assert_eq!(alerts.len(), 1);
    assert_eq!(alerts[0].severity, AlertSeverity::Warning);
}

#[test]
fn percentiles_index_the_sorted_window() {
    let ctx = TrustContext::init(TrustConfig::default()).unwrap();
    for v in 1..=100 {
        ctx.observability().timing("load.duration", v as f64, None);
    }
    let stats = ctx
        .observability()
        .get_metric_stats("load.duration")
        .unwrap();
    assert_eq!(stats.p50, 51.0);
    assert_eq!(stats.p95, 96.0);
    assert_eq!(stats.p99, 100.0);
}

#[test]
fn resolve_alert_is_idempotent() {
    let ctx = TrustContext::init(TrustConfig::default()).unwrap();
    let alert = ctx.observability().create_alert(
        AlertSeverity::Info,
        "manual",
        "raised by test",
        AlertCategory::System,
        None,
    );

    assert!(ctx.observability().resolve_alert(alert.id));
    assert!(!ctx.observability().resolve_alert(alert.id));
    assert!(ctx.observability().get_active_alerts().is_empty());
}

#[test]
fn empty_dataset_scores_perfect_quality() {
    let ctx = TrustContext::init(TrustConfig::default()).unwrap();
    let metrics = ctx.analyze_quality(&[], None);

    assert_eq!(metrics.overall_score, 100);
    assert_eq!(metrics.completeness, 1.0);
    assert_eq!(metrics.uniqueness, 1.0);
    assert!(metrics.anomalies_detected.is_empty());

    // A perfect score stays below no threshold, so no alert fires.
    assert!(ctx.observability().get_active_alerts().is_empty());
}

#[test]
fn poor_quality_dataset_raises_alert() {
    let ctx = TrustContext::init(TrustConfig::default()).unwrap();
    let dataset = vec![
        json!({"id": 1, "name": null, "age": null}),
        json!({"id": 1, "name": null, "age": null}),
        json!({"id": 1, "name": null, "age": null}),
    ];

    let metrics = ctx.analyze_quality(&dataset, Some(&document_schema()));
    assert!(metrics.overall_score < 70);
    assert!(!metrics.anomalies_detected.is_empty());

    let alerts = ctx
        .observability()
        .get_alerts_by_category(AlertCategory::DataQuality);
    assert_eq!(alerts.len(), 1);
}

#[test]
fn guarded_write_leaves_a_complete_trace() {
    let ctx = TrustContext::init(TrustConfig::default()).unwrap();
    ctx.guarded("document.save", Some(&json!({"title": "ok"})), || ())
        .unwrap();

    // One finished span, one span.duration metric, one gate.allowed count.
    let durations = ctx
        .observability()
        .get_metrics(Some("span.duration"), None);
    assert_eq!(durations.len(), 1);
    assert_eq!(
        durations[0]
            .tags
            .as_ref()
            .unwrap()
            .get("operation")
            .map(String::as_str),
        Some("document.save")
    );
    assert_eq!(
        ctx.observability()
            .get_metrics(Some("gate.allowed"), None)
            .len(),
        1
    );
}

#[tokio::test]
async fn context_survives_restart_with_durable_store() {
    init_tracing();
    let dir = tempfile::tempdir().unwrap();
    let config = TrustConfig {
        storage_path: Some(dir.path().join("trust")),
        ..TrustConfig::default()
    };

    {
        let ctx = TrustContext::init(config.clone()).unwrap();
        ctx.observability().timing("save.duration", 25.0, None);
        ctx.observability().info("first run", None);
        ctx.shutdown().await;
    }

    let ctx = TrustContext::init(config).unwrap();
    assert_eq!(
        ctx.observability()
            .get_metrics(Some("save.duration"), None)
            .len(),
        1
    );
    assert!(ctx
        .observability()
        .get_logs(Some(LogLevel::Info), None)
        .iter()
        .any(|l| l.message == "first run"));
    ctx.shutdown().await;
}

#[tokio::test]
async fn health_checks_cover_storage_and_error_rate() {
    init_tracing();
    let dir = tempfile::tempdir().unwrap();
    let ctx = TrustContext::init(TrustConfig {
        storage_path: Some(dir.path().join("trust")),
        ..TrustConfig::default()
    })
    .unwrap();

    ctx.observability().run_health_checks();
    let checks = ctx.observability().get_health_checks();
    assert!(checks.iter().any(|c| c.name == "durable_storage"));
    assert!(checks
        .iter()
        .all(|c| c.status == HealthStatus::Healthy));
    assert!(ctx.observability().is_system_healthy());

    ctx.shutdown().await;
}
