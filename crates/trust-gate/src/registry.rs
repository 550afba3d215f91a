//! Contract registry
//!
//! Stores versioned data contracts keyed by logical entity name and runs the
//! validation ladder: structural schema first, then contract rules in
//! registration order, but only when the structure passed.

use chrono::Utc;
use serde_json::Value;
use std::collections::HashMap;
use std::time::Instant;

use crate::contracts::{
    codes, DataContract, Environment, ErrorCategory, QualityCheckOutcome, Severity,
    ValidationError, ValidationMetadata, ValidationResult,
};
use crate::error::{GateError, Result};

/// Version stamped into every [`ValidationMetadata`]
const VALIDATION_VERSION: &str = "1.0.0";

/// Named outcome of a contract quality check
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct QualityCheckReport {
    pub name: String,
    pub passed: bool,
    pub score: u8,
    pub details: String,
}

/// Registry of data contracts, one per logical entity key.
///
/// Re-registering a key overwrites the prior contract; versions are not
/// deduplicated.
pub struct ContractRegistry {
    environment: Environment,
    contracts: HashMap<String, DataContract>,
}

impl ContractRegistry {
    pub fn new(environment: Environment) -> Self {
        Self {
            environment,
            contracts: HashMap::new(),
        }
    }

    /// Register a contract, overwriting any prior contract for the key and
    /// stamping `last_updated`.
    pub fn register(&mut self, key: impl Into<String>, mut contract: DataContract) {
        contract.last_updated = Utc::now();
        let key = key.into();
        if self.contracts.insert(key.clone(), contract).is_some() {
            tracing::debug!(key = %key, "overwrote existing data contract");
        }
    }

    pub fn contains(&self, key: &str) -> bool {
        self.contracts.contains_key(key)
    }

    pub fn get(&self, key: &str) -> Option<&DataContract> {
        self.contracts.get(key)
    }

    /// Registered entity keys
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.contracts.keys().map(String::as_str)
    }

    /// Validate a record against the contract registered for `key`.
    ///
    /// Failures are reported in the result, never thrown. The execution time
    /// is measured around the full call for observability correlation.
    pub fn validate(&self, key: &str, data: &Value) -> ValidationResult {
        let start = Instant::now();
        let mut errors = Vec::new();

        match self.contracts.get(key) {
            None => {
                errors.push(ValidationError::new(
                    codes::SCHEMA_NOT_FOUND,
                    format!("no data contract registered for '{}'", key),
                    Severity::Critical,
                    ErrorCategory::SchemaViolation,
                ));
            }
            Some(contract) => {
                let field_errors = contract.schema.check(data);
                for fe in &field_errors {
                    errors.push(
                        ValidationError::new(
                            codes::SCHEMA_VALIDATION_ERROR,
                            fe.message.clone(),
                            Severity::High,
                            ErrorCategory::SchemaViolation,
                        )
                        .with_location(fe.field.clone()),
                    );
                }

                // Contract rules run only on structurally sound records.
                if field_errors.is_empty() {
                    for rule in &contract.validation_rules {
                        if !(rule.predicate)(data) {
                            errors.push(
                                ValidationError::new(
                                    codes::CUSTOM_VALIDATION_FAILED,
                                    rule.error_message.clone(),
                                    rule.severity,
                                    ErrorCategory::DataQuality,
                                )
                                .with_suggestion(format!("rule '{}' failed", rule.name)),
                            );
                        }
                    }
                }
            }
        }

        ValidationResult {
            is_valid: errors.is_empty(),
            errors,
            warnings: Vec::new(),
            metadata: ValidationMetadata {
                timestamp: Utc::now(),
                environment: self.environment,
                validation_version: VALIDATION_VERSION.to_string(),
                execution_time_ms: start.elapsed().as_millis() as u64,
            },
        }
    }

    /// Run the contract's quality checks over a record
    pub fn run_quality_checks(&self, key: &str, data: &Value) -> Result<Vec<QualityCheckReport>> {
        let contract = self
            .contracts
            .get(key)
            .ok_or_else(|| GateError::ContractNotFound(key.to_string()))?;

        Ok(contract
            .quality_checks
            .iter()
            .map(|qc| {
                let QualityCheckOutcome { passed, score, details } = (qc.check)(data);
                QualityCheckReport {
                    name: qc.name.clone(),
                    passed,
                    score,
                    details,
                }
            })
            .collect())
    }
}
