//! Placeholder and mock-data detection
//!
//! A data-driven scanner that flags synthetic or incomplete values anywhere
//! in a record graph. Detection rules form a fixed ordered table; new
//! categories are additive rather than code changes. Severity escalation by
//! environment is a pure function: the same defect is one level more severe
//! in production.

use regex::Regex;
use serde_json::{Map, Value};

use crate::contracts::{Environment, ErrorCategory, Severity, ValidationError};

/// How a detection rule matches a normalized scalar
pub enum Matcher {
    /// Compiled pattern tested against the trimmed string form
    Pattern(Regex),
    /// Case-insensitive exact match against any of the listed tokens
    ExactAny(Vec<&'static str>),
}

/// One entry of the detection rule table
pub struct DetectionRule {
    /// Rule name, used in messages
    pub name: &'static str,
    /// Stable error code emitted on a match
    pub code: &'static str,
    pub matcher: Matcher,
    /// Severity outside production; escalated one level in production
    pub base_severity: Severity,
    /// Remediation hint attached to the error
    pub suggestion: &'static str,
}

impl DetectionRule {
    fn matches(&self, normalized: &str) -> bool {
        match &self.matcher {
            Matcher::Pattern(re) => re.is_match(normalized),
            Matcher::ExactAny(tokens) => tokens.iter().any(|t| t.eq_ignore_ascii_case(normalized)),
        }
    }
}

/// Escalate a base severity for the active environment.
///
/// Pure function of (severity, environment): production bumps one level,
/// everything else passes through.
pub fn escalate(severity: Severity, environment: Environment) -> Severity {
    if environment != Environment::Production {
        return severity;
    }
    match severity {
        Severity::Low => Severity::Medium,
        Severity::Medium => Severity::High,
        Severity::High => Severity::Critical,
        Severity::Critical => Severity::Critical,
    }
}

/// Scanner for placeholder and mock values.
///
/// Null values never match: the detector only scans provided values, never
/// absence. Allow-listing by entity is a caller concern.
pub struct PlaceholderDetector {
    environment: Environment,
    rules: Vec<DetectionRule>,
}

impl PlaceholderDetector {
    /// Create a detector with the default rule table for the given environment
    pub fn new(environment: Environment) -> Self {
        Self {
            environment,
            rules: default_rules(),
        }
    }

    /// Append an additional detection rule (evaluated after the defaults)
    pub fn add_rule(&mut self, rule: DetectionRule) {
        self.rules.push(rule);
    }

    pub fn environment(&self) -> Environment {
        self.environment
    }

    /// Scan a scalar value.
    ///
    /// The value is normalized to its string form and trimmed before the
    /// rule table is applied in order. Each matching category produces one
    /// error. Nulls and containers produce nothing here; use [`scan`] for
    /// arbitrary record graphs.
    ///
    /// [`scan`]: PlaceholderDetector::scan
    pub fn detect(&self, value: &Value, context: Option<&str>) -> Vec<ValidationError> {
        let normalized = match normalize(value) {
            Some(s) => s,
            None => return Vec::new(),
        };
        let normalized = normalized.trim().to_string();

        let mut errors = Vec::new();
        for rule in &self.rules {
            if rule.matches(&normalized) {
                let mut err = ValidationError::new(
                    rule.code,
                    format!("{} detected in value \"{}\"", rule.name, truncate(&normalized, 80)),
                    escalate(rule.base_severity, self.environment),
                    ErrorCategory::Placeholder,
                )
                .with_suggestion(rule.suggestion);
                if let Some(ctx) = context {
                    err = err.with_location(ctx);
                }
                errors.push(err);
            }
        }
        errors
    }

    /// Scan every field of an object, tagging locations with the field path.
    ///
    /// Nested objects are walked with dotted paths; arrays are delegated to
    /// [`detect_in_array`].
    ///
    /// [`detect_in_array`]: PlaceholderDetector::detect_in_array
    pub fn detect_in_object(&self, obj: &Map<String, Value>) -> Vec<ValidationError> {
        self.walk_object(obj, "")
    }

    /// Scan the elements of an array under the given field name.
    ///
    /// Object elements are recursed into; everything else is scanned with an
    /// index-qualified location (`field[i]`).
    pub fn detect_in_array(&self, field: &str, items: &[Value]) -> Vec<ValidationError> {
        let mut errors = Vec::new();
        for (i, item) in items.iter().enumerate() {
            let location = format!("{}[{}]", field, i);
            match item {
                Value::Object(obj) => errors.extend(self.walk_object(obj, &location)),
                Value::Array(inner) => errors.extend(self.detect_in_array(&location, inner)),
                other => errors.extend(self.detect(other, Some(&location))),
            }
        }
        errors
    }

    /// Scan an arbitrary value: objects and arrays are walked, scalars are
    /// handed to [`detect`].
    ///
    /// [`detect`]: PlaceholderDetector::detect
    pub fn scan(&self, value: &Value) -> Vec<ValidationError> {
        match value {
            Value::Object(obj) => self.detect_in_object(obj),
            Value::Array(items) => self.detect_in_array("$", items),
            other => self.detect(other, None),
        }
    }

    fn walk_object(&self, obj: &Map<String, Value>, base_path: &str) -> Vec<ValidationError> {
        let mut errors = Vec::new();
        for (key, value) in obj {
            let path = if base_path.is_empty() {
                key.clone()
            } else {
                format!("{}.{}", base_path, key)
            };
            match value {
                Value::Object(nested) => errors.extend(self.walk_object(nested, &path)),
                Value::Array(items) => errors.extend(self.detect_in_array(&path, items)),
                other => errors.extend(self.detect(other, Some(&path))),
            }
        }
        errors
    }
}

/// String form of a scalar; containers and nulls yield nothing
fn normalize(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        Value::Null | Value::Array(_) | Value::Object(_) => None,
    }
}

fn truncate(s: &str, max: usize) -> &str {
    match s.char_indices().nth(max) {
        Some((idx, _)) => &s[..idx],
        None => s,
    }
}

/// The fixed ordered rule table: code markers, mock content markers, then
/// canonical placeholder tokens.
fn default_rules() -> Vec<DetectionRule> {
    vec![
        DetectionRule {
            name: "code marker",
            code: "PLACEHOLDER_DETECTED_CODE_MARKER",
            matcher: Matcher::Pattern(
                Regex::new(r"(?i)\b(TODO|FIXME|XXX|HACK)\b").expect("static pattern"),
            ),
            base_severity: Severity::Medium,
            suggestion: "Resolve the code marker before persisting this value",
        },
        DetectionRule {
            name: "mock content",
            code: "PLACEHOLDER_DETECTED_MOCK_CONTENT",
            matcher: Matcher::Pattern(
                Regex::new(r"(?i)\b(mock|sample|dummy|fake)\b|lorem\s+ipsum")
                    .expect("static pattern"),
            ),
            base_severity: Severity::Medium,
            suggestion: "Replace mock or sample content with real data",
        },
        DetectionRule {
            name: "placeholder token",
            code: "PLACEHOLDER_DETECTED_TOKEN",
            matcher: Matcher::ExactAny(vec![
                "N/A",
                "NA",
                "TBD",
                "TBC",
                "TODO",
                "XXX",
                "???",
                "...",
                "<placeholder>",
                "[placeholder]",
                "<todo>",
                "[todo]",
                "<tbd>",
                "[tbd]",
                "change me",
                "changeme",
                "fill me in",
            ]),
            base_severity: Severity::High,
            suggestion: "Provide a real value in place of the placeholder token",
        },
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_tbd_detected_in_any_environment() {
        for env in [Environment::Development, Environment::Staging, Environment::Production] {
            let detector = PlaceholderDetector::new(env);
            let errors = detector.detect(&json!("TBD"), None);
            assert!(
                errors.iter().any(|e| e.category == ErrorCategory::Placeholder),
                "TBD must match in {}",
                env
            );
        }
    }

    #[test]
    fn test_token_severity_escalation() {
        let dev = PlaceholderDetector::new(Environment::Development);
        let prod = PlaceholderDetector::new(Environment::Production);

        let dev_errors = dev.detect(&json!("N/A"), None);
        let prod_errors = prod.detect(&json!("N/A"), None);

        let dev_token = dev_errors.iter().find(|e| e.code == "PLACEHOLDER_DETECTED_TOKEN").unwrap();
        let prod_token = prod_errors.iter().find(|e| e.code == "PLACEHOLDER_DETECTED_TOKEN").unwrap();

        assert_eq!(dev_token.severity, Severity::High);
        assert_eq!(prod_token.severity, Severity::Critical);
    }

    #[test]
    fn test_code_marker_escalation() {
        let dev = PlaceholderDetector::new(Environment::Development);
        let prod = PlaceholderDetector::new(Environment::Production);

        let dev_errors = dev.detect(&json!("TODO: write the summary"), None);
        let prod_errors = prod.detect(&json!("TODO: write the summary"), None);

        assert_eq!(dev_errors[0].severity, Severity::Medium);
        assert_eq!(prod_errors[0].severity, Severity::High);
    }

    #[test]
    fn test_null_never_matches() {
        let detector = PlaceholderDetector::new(Environment::Production);
        assert!(detector.detect(&Value::Null, None).is_empty());
        assert!(detector.scan(&Value::Null).is_empty());
    }

    #[test]
    fn test_real_content_passes() {
        let detector = PlaceholderDetector::new(Environment::Production);
        let errors = detector.detect(&json!("Quarterly revenue grew by 12%"), None);
        assert!(errors.is_empty());
    }

    #[test]
    fn test_lorem_ipsum_matched() {
        let detector = PlaceholderDetector::new(Environment::Development);
        let errors = detector.detect(&json!("Lorem ipsum dolor sit amet"), None);
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].code, "PLACEHOLDER_DETECTED_MOCK_CONTENT");
    }

    #[test]
    fn test_object_fields_tagged_with_location() {
        let detector = PlaceholderDetector::new(Environment::Development);
        let errors = detector.detect_in_object(
            json!({"title": "TBD", "body": "real content"})
                .as_object()
                .unwrap(),
        );
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].location.as_deref(), Some("title"));
    }

    #[test]
    fn test_nested_object_dotted_path() {
        let detector = PlaceholderDetector::new(Environment::Development);
        let errors = detector.detect_in_object(
            json!({"metadata": {"author": "N/A"}}).as_object().unwrap(),
        );
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].location.as_deref(), Some("metadata.author"));
    }

    #[test]
    fn test_array_index_qualified_location() {
        let detector = PlaceholderDetector::new(Environment::Development);
        let errors = detector.detect_in_array("tags", &[json!("rust"), json!("TBD")]);
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].location.as_deref(), Some("tags[1]"));
    }

    #[test]
    fn test_array_recurses_into_objects() {
        let detector = PlaceholderDetector::new(Environment::Development);
        let errors = detector.detect_in_array("items", &[json!({"name": "FIXME later"})]);
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].location.as_deref(), Some("items[0].name"));
    }

    #[test]
    fn test_value_trimmed_before_matching() {
        let detector = PlaceholderDetector::new(Environment::Development);
        let errors = detector.detect(&json!("  TBD  "), None);
        assert!(errors.iter().any(|e| e.code == "PLACEHOLDER_DETECTED_TOKEN"));
    }

    #[test]
    fn test_multiple_categories_each_report() {
        // "TODO" matches both the code-marker pattern and the exact token list.
        let detector = PlaceholderDetector::new(Environment::Development);
        let errors = detector.detect(&json!("TODO"), None);
        assert_eq!(errors.len(), 2);
        assert_eq!(errors[0].code, "PLACEHOLDER_DETECTED_CODE_MARKER");
        assert_eq!(errors[1].code, "PLACEHOLDER_DETECTED_TOKEN");
    }

    #[test]
    fn test_additive_custom_rule() {
        let mut detector = PlaceholderDetector::new(Environment::Development);
        detector.add_rule(DetectionRule {
            name: "tenant placeholder",
            code: "PLACEHOLDER_DETECTED_TENANT",
            matcher: Matcher::ExactAny(vec!["acme-test"]),
            base_severity: Severity::Medium,
            suggestion: "Use a real tenant identifier",
        });

        let errors = detector.detect(&json!("acme-test"), None);
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].code, "PLACEHOLDER_DETECTED_TENANT");
    }

    #[test]
    fn test_escalate_is_pure() {
        assert_eq!(escalate(Severity::Medium, Environment::Development), Severity::Medium);
        assert_eq!(escalate(Severity::Medium, Environment::Staging), Severity::Medium);
        assert_eq!(escalate(Severity::Medium, Environment::Production), Severity::High);
        assert_eq!(escalate(Severity::Critical, Environment::Production), Severity::Critical);
    }
}
