//! Core data-contract types for the trust gate
//!
//! This module provides the shared vocabulary used by the registry, the
//! placeholder detector, the quality analyzer and the safety orchestrator:
//! severities, error categories, validation results and the contract
//! structure itself.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;

use crate::schema::Schema;

/// Deployment environment the gate is running against.
///
/// The environment drives severity escalation: the same defect is more
/// costly in production than in development.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Environment {
    Development,
    Staging,
    Production,
}

impl Environment {
    /// Environments where placeholder defects block writes.
    pub fn is_gated(&self) -> bool {
        matches!(self, Environment::Production | Environment::Staging)
    }
}

impl Default for Environment {
    fn default() -> Self {
        Environment::Development
    }
}

impl fmt::Display for Environment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Environment::Development => write!(f, "development"),
            Environment::Staging => write!(f, "staging"),
            Environment::Production => write!(f, "production"),
        }
    }
}

/// Severity level for validation errors and anomalies
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    /// Informational - no action required
    Low,
    /// Should be addressed but not blocking
    Medium,
    /// Must be fixed before the write proceeds
    High,
    /// Security or data-integrity risk
    Critical,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Severity::Low => write!(f, "low"),
            Severity::Medium => write!(f, "medium"),
            Severity::High => write!(f, "high"),
            Severity::Critical => write!(f, "critical"),
        }
    }
}

impl Default for Severity {
    fn default() -> Self {
        Severity::Medium
    }
}

/// Category of a validation error
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorCategory {
    /// Synthetic or incomplete value detected
    Placeholder,
    /// Mock or fixture content detected
    MockData,
    /// Structural schema or contract-rule violation
    SchemaViolation,
    /// Quality dimension below its threshold
    DataQuality,
    /// Security-relevant defect
    Security,
}

impl fmt::Display for ErrorCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ErrorCategory::Placeholder => write!(f, "placeholder"),
            ErrorCategory::MockData => write!(f, "mock_data"),
            ErrorCategory::SchemaViolation => write!(f, "schema_violation"),
            ErrorCategory::DataQuality => write!(f, "data_quality"),
            ErrorCategory::Security => write!(f, "security"),
        }
    }
}

/// Well-known validation error codes
pub mod codes {
    /// No contract registered for the requested key
    pub const SCHEMA_NOT_FOUND: &str = "SCHEMA_NOT_FOUND";
    /// Structural schema check failed for a field
    pub const SCHEMA_VALIDATION_ERROR: &str = "SCHEMA_VALIDATION_ERROR";
    /// A contract-declared validation rule failed
    pub const CUSTOM_VALIDATION_FAILED: &str = "CUSTOM_VALIDATION_FAILED";
}

/// A single validation error produced by the registry or the detector
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ValidationError {
    /// Stable machine-readable code (e.g. `SCHEMA_NOT_FOUND`)
    pub code: String,
    /// Human-readable message describing the defect
    pub message: String,
    /// Severity level of the error
    pub severity: Severity,
    /// Category of the error
    pub category: ErrorCategory,
    /// Path to the affected field (e.g. `metadata.tags[2]`)
    pub location: Option<String>,
    /// Suggested fix or remediation
    pub suggestion: Option<String>,
}

impl ValidationError {
    /// Create a new validation error
    pub fn new(
        code: impl Into<String>,
        message: impl Into<String>,
        severity: Severity,
        category: ErrorCategory,
    ) -> Self {
        Self {
            code: code.into(),
            message: message.into(),
            severity,
            category,
            location: None,
            suggestion: None,
        }
    }

    /// Set the field location
    pub fn with_location(mut self, location: impl Into<String>) -> Self {
        self.location = Some(location.into());
        self
    }

    /// Set a suggested fix
    pub fn with_suggestion(mut self, suggestion: impl Into<String>) -> Self {
        self.suggestion = Some(suggestion.into());
        self
    }

    /// Check if this error should block the pending write (high or critical)
    pub fn is_blocking(&self) -> bool {
        matches!(self.severity, Severity::High | Severity::Critical)
    }
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.location {
            Some(loc) => write!(f, "[{}] {} at '{}': {}", self.severity, self.code, loc, self.message),
            None => write!(f, "[{}] {}: {}", self.severity, self.code, self.message),
        }
    }
}

/// A non-blocking validation warning
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ValidationWarning {
    pub code: String,
    pub message: String,
    pub location: Option<String>,
}

/// Metadata attached to every validation result for observability correlation
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ValidationMetadata {
    pub timestamp: DateTime<Utc>,
    pub environment: Environment,
    pub validation_version: String,
    pub execution_time_ms: u64,
}

/// Result of validating a record against a registered contract
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ValidationResult {
    /// True iff zero errors were produced
    pub is_valid: bool,
    pub errors: Vec<ValidationError>,
    pub warnings: Vec<ValidationWarning>,
    pub metadata: ValidationMetadata,
}

impl ValidationResult {
    /// Errors at or above the given severity
    pub fn errors_at_least(&self, severity: Severity) -> impl Iterator<Item = &ValidationError> {
        self.errors.iter().filter(move |e| e.severity >= severity)
    }
}

/// A pure, contract-declared predicate over a record.
///
/// Rules never have side effects; the same input always yields the same
/// outcome.
pub struct ValidationRule {
    /// Rule name, used in error messages and metrics tags
    pub name: String,
    /// Predicate over the raw record
    pub predicate: Box<dyn Fn(&Value) -> bool + Send + Sync>,
    /// Message emitted when the predicate fails
    pub error_message: String,
    /// Severity of the resulting error
    pub severity: Severity,
}

impl ValidationRule {
    /// Create a rule with the default (medium) severity
    pub fn new(
        name: impl Into<String>,
        error_message: impl Into<String>,
        predicate: impl Fn(&Value) -> bool + Send + Sync + 'static,
    ) -> Self {
        Self {
            name: name.into(),
            predicate: Box::new(predicate),
            error_message: error_message.into(),
            severity: Severity::Medium,
        }
    }

    /// Override the declared severity
    pub fn with_severity(mut self, severity: Severity) -> Self {
        self.severity = severity;
        self
    }
}

impl fmt::Debug for ValidationRule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ValidationRule")
            .field("name", &self.name)
            .field("error_message", &self.error_message)
            .field("severity", &self.severity)
            .finish_non_exhaustive()
    }
}

/// Outcome of a single contract quality check
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QualityCheckOutcome {
    pub passed: bool,
    /// Score in 0..=100
    pub score: u8,
    pub details: String,
}

/// A named, scored quality check attached to a contract
pub struct QualityCheck {
    pub name: String,
    pub check: Box<dyn Fn(&Value) -> QualityCheckOutcome + Send + Sync>,
}

impl QualityCheck {
    pub fn new(
        name: impl Into<String>,
        check: impl Fn(&Value) -> QualityCheckOutcome + Send + Sync + 'static,
    ) -> Self {
        Self {
            name: name.into(),
            check: Box::new(check),
        }
    }
}

impl fmt::Debug for QualityCheck {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("QualityCheck")
            .field("name", &self.name)
            .finish_non_exhaustive()
    }
}

/// A versioned data contract: structural schema plus rules and quality checks.
///
/// One contract per logical entity key; the registry enforces uniqueness of
/// the key, not of the version.
pub struct DataContract {
    /// Structural validator for the entity
    pub schema: Box<dyn Schema>,
    /// Contract version, opaque to the registry
    pub version: String,
    /// Stamped by the registry on registration
    pub last_updated: DateTime<Utc>,
    /// Contract-declared rules, evaluated in registration order
    pub validation_rules: Vec<ValidationRule>,
    /// Scored quality checks for the entity
    pub quality_checks: Vec<QualityCheck>,
}

impl DataContract {
    pub fn new(schema: impl Schema + 'static, version: impl Into<String>) -> Self {
        Self {
            schema: Box::new(schema),
            version: version.into(),
            last_updated: Utc::now(),
            validation_rules: Vec::new(),
            quality_checks: Vec::new(),
        }
    }

    /// Append a validation rule (evaluation order follows insertion order)
    pub fn with_rule(mut self, rule: ValidationRule) -> Self {
        self.validation_rules.push(rule);
        self
    }

    /// Append a quality check
    pub fn with_quality_check(mut self, check: QualityCheck) -> Self {
        self.quality_checks.push(check);
        self
    }
}

impl fmt::Debug for DataContract {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DataContract")
            .field("version", &self.version)
            .field("last_updated", &self.last_updated)
            .field("validation_rules", &self.validation_rules.len())
            .field("quality_checks", &self.quality_checks.len())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_severity_ordering() {
        assert!(Severity::Low < Severity::Medium);
        assert!(Severity::Medium < Severity::High);
        assert!(Severity::High < Severity::Critical);
    }

    #[test]
    fn test_environment_gating() {
        assert!(Environment::Production.is_gated());
        assert!(Environment::Staging.is_gated());
        assert!(!Environment::Development.is_gated());
    }

    #[test]
    fn test_error_display() {
        let err = ValidationError::new(
            codes::SCHEMA_VALIDATION_ERROR,
            "title must not be empty",
            Severity::High,
            ErrorCategory::SchemaViolation,
        )
        .with_location("title");

        let display = format!("{}", err);
        assert!(display.contains("high"));
        assert!(display.contains("title"));
        assert!(display.contains(codes::SCHEMA_VALIDATION_ERROR));
    }

    #[test]
    fn test_error_is_blocking() {
        let high = ValidationError::new("X", "x", Severity::High, ErrorCategory::Placeholder);
        let medium = ValidationError::new("X", "x", Severity::Medium, ErrorCategory::Placeholder);
        assert!(high.is_blocking());
        assert!(!medium.is_blocking());
    }

    #[test]
    fn test_rule_is_pure_over_input() {
        let rule = ValidationRule::new("non-empty-title", "title is empty", |v| {
            v.get("title").and_then(Value::as_str).map(|s| !s.is_empty()).unwrap_or(false)
        });

        let record = json!({"title": "hello"});
        assert!((rule.predicate)(&record));
        assert!((rule.predicate)(&record));
        assert_eq!(rule.severity, Severity::Medium);
    }

    #[test]
    fn test_category_serde_names() {
        let cat = serde_json::to_string(&ErrorCategory::MockData).unwrap();
        assert_eq!(cat, "\"mock_data\"");
        assert_eq!(ErrorCategory::Placeholder.to_string(), "placeholder");
    }
}
