//! Structural schema validation
//!
//! Contract schemas are an explicit polymorphic validator seam: anything
//! implementing [`Schema`] can act as the structural gate for a contract.
//! [`ObjectSchema`] is the built-in field-spec implementation used by most
//! contracts.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

/// A single structural defect reported by a schema
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FieldError {
    /// Path of the offending field
    pub field: String,
    /// Description of the violation
    pub message: String,
}

impl FieldError {
    pub fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
        }
    }
}

/// Structural validator for dynamically typed record data.
///
/// Implementations must be deterministic and side-effect free; an empty
/// return value means the record is structurally valid.
pub trait Schema: Send + Sync {
    fn check(&self, value: &Value) -> Vec<FieldError>;
}

/// Expected runtime type of a field
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FieldType {
    String,
    Number,
    Integer,
    Boolean,
    Array,
    Object,
    /// Any type is accepted; only presence and emptiness rules apply
    Any,
}

impl FieldType {
    fn matches(&self, value: &Value) -> bool {
        match self {
            FieldType::String => value.is_string(),
            FieldType::Number => value.is_number(),
            FieldType::Integer => value.is_i64() || value.is_u64(),
            FieldType::Boolean => value.is_boolean(),
            FieldType::Array => value.is_array(),
            FieldType::Object => value.is_object(),
            FieldType::Any => true,
        }
    }

    fn name(&self) -> &'static str {
        match self {
            FieldType::String => "string",
            FieldType::Number => "number",
            FieldType::Integer => "integer",
            FieldType::Boolean => "boolean",
            FieldType::Array => "array",
            FieldType::Object => "object",
            FieldType::Any => "any",
        }
    }
}

/// Constraints for a single field of an [`ObjectSchema`]
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FieldSpec {
    pub field_type: FieldType,
    pub required: bool,
    /// For string fields: reject the empty string after trimming
    pub non_empty: bool,
    /// For string fields: maximum length in characters
    pub max_length: Option<usize>,
    /// For string fields: minimum length in characters
    pub min_length: Option<usize>,
}

impl FieldSpec {
    pub fn new(field_type: FieldType) -> Self {
        Self {
            field_type,
            required: false,
            non_empty: false,
            max_length: None,
            min_length: None,
        }
    }

    pub fn string() -> Self {
        Self::new(FieldType::String)
    }

    pub fn number() -> Self {
        Self::new(FieldType::Number)
    }

    pub fn integer() -> Self {
        Self::new(FieldType::Integer)
    }

    pub fn boolean() -> Self {
        Self::new(FieldType::Boolean)
    }

    pub fn array() -> Self {
        Self::new(FieldType::Array)
    }

    pub fn object() -> Self {
        Self::new(FieldType::Object)
    }

    pub fn required(mut self) -> Self {
        self.required = true;
        self
    }

    pub fn non_empty(mut self) -> Self {
        self.non_empty = true;
        self
    }

    pub fn max_length(mut self, len: usize) -> Self {
        self.max_length = Some(len);
        self
    }

    pub fn min_length(mut self, len: usize) -> Self {
        self.min_length = Some(len);
        self
    }
}

/// Field-spec based schema for object-shaped records.
///
/// Fields are checked in lexicographic order so error output is
/// deterministic. Unknown fields are accepted.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ObjectSchema {
    fields: BTreeMap<String, FieldSpec>,
}

impl ObjectSchema {
    pub fn new() -> Self {
        Self::default()
    }

    /// Declare a field and its constraints
    pub fn field(mut self, name: impl Into<String>, spec: FieldSpec) -> Self {
        self.fields.insert(name.into(), spec);
        self
    }

    fn check_field(&self, name: &str, spec: &FieldSpec, value: &Value, errors: &mut Vec<FieldError>) {
        if !spec.field_type.matches(value) {
            errors.push(FieldError::new(
                name,
                format!(
                    "expected {}, got {}",
                    spec.field_type.name(),
                    type_name(value)
                ),
            ));
            return;
        }

        if let Some(s) = value.as_str() {
            if spec.non_empty && s.trim().is_empty() {
                errors.push(FieldError::new(name, "must not be empty"));
            }
            if let Some(max) = spec.max_length {
                if s.chars().count() > max {
                    errors.push(FieldError::new(
                        name,
                        format!("exceeds maximum length of {} characters", max),
                    ));
                }
            }
            if let Some(min) = spec.min_length {
                if s.chars().count() < min {
                    errors.push(FieldError::new(
                        name,
                        format!("shorter than minimum length of {} characters", min),
                    ));
                }
            }
        }
    }
}

impl Schema for ObjectSchema {
    fn check(&self, value: &Value) -> Vec<FieldError> {
        let mut errors = Vec::new();

        let obj = match value.as_object() {
            Some(obj) => obj,
            None => {
                errors.push(FieldError::new(
                    "$",
                    format!("expected object, got {}", type_name(value)),
                ));
                return errors;
            }
        };

        for (name, spec) in &self.fields {
            match obj.get(name) {
                Some(Value::Null) | None => {
                    if spec.required {
                        errors.push(FieldError::new(name, "required field is missing"));
                    }
                }
                Some(v) => self.check_field(name, spec, v, &mut errors),
            }
        }

        errors
    }
}

/// Runtime type name of a JSON value, used in error messages
pub(crate) fn type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn doc_schema() -> ObjectSchema {
        ObjectSchema::new()
            .field("title", FieldSpec::string().required().non_empty().max_length(500))
            .field("word_count", FieldSpec::integer())
    }

    #[test]
    fn test_valid_document_passes() {
        let errors = doc_schema().check(&json!({"title": "Quarterly report", "word_count": 1200}));
        assert!(errors.is_empty());
    }

    #[test]
    fn test_empty_title_rejected() {
        let errors = doc_schema().check(&json!({"title": ""}));
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].field, "title");
        assert!(errors[0].message.contains("empty"));
    }

    #[test]
    fn test_missing_required_field() {
        let errors = doc_schema().check(&json!({"word_count": 3}));
        assert_eq!(errors.len(), 1);
        assert!(errors[0].message.contains("required"));
    }

    #[test]
    fn test_null_counts_as_missing() {
        let errors = doc_schema().check(&json!({"title": null}));
        assert_eq!(errors.len(), 1);
        assert!(errors[0].message.contains("required"));
    }

    #[test]
    fn test_max_length_enforced() {
        let long_title = "x".repeat(501);
        let errors = doc_schema().check(&json!({ "title": long_title }));
        assert_eq!(errors.len(), 1);
        assert!(errors[0].message.contains("maximum length"));
    }

    #[test]
    fn test_type_mismatch() {
        let errors = doc_schema().check(&json!({"title": 42}));
        assert_eq!(errors.len(), 1);
        assert!(errors[0].message.contains("expected string"));
    }

    #[test]
    fn test_non_object_rejected() {
        let errors = doc_schema().check(&json!("not an object"));
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].field, "$");
    }

    #[test]
    fn test_optional_field_absent_is_fine() {
        let errors = doc_schema().check(&json!({"title": "ok"}));
        assert!(errors.is_empty());
    }
}
