//! Trust gate: data-contract enforcement before writes
//!
//! This crate is the validation half of the Trust Layer. It enforces
//! structural and semantic correctness of record data before the host
//! persists it:
//!
//! 1. **Registry** (`registry`): versioned data contracts (schema + rules +
//!    quality checks) keyed by logical entity name.
//! 2. **Detector** (`detector`): pattern-table scanner flagging synthetic or
//!    incomplete values anywhere in a record graph.
//! 3. **Quality** (`quality`): five quality dimensions over a record
//!    collection, folded into a weighted score with anomaly detection.
//! 4. **Orchestrator** (`orchestrator`): the safety gate host write paths
//!    must pass before committing.
//!
//! All core operations are synchronous, side-effect free and safe to call
//! from any context; failures are returned as structured results, never
//! thrown.
//!
//! # Example
//!
//! ```rust
//! use trust_gate::{
//!     ContractRegistry, DataContract, Environment, FieldSpec, ObjectSchema,
//!     SafetyConfig, SafetyOrchestrator,
//! };
//! use serde_json::json;
//!
//! let mut registry = ContractRegistry::new(Environment::Production);
//! registry.register(
//!     "doc",
//!     DataContract::new(
//!         ObjectSchema::new()
//!             .field("title", FieldSpec::string().required().non_empty().max_length(500)),
//!         "1.0.0",
//!     ),
//! );
//!
//! let orchestrator = SafetyOrchestrator::new(SafetyConfig {
//!     environment: Environment::Production,
//!     ..SafetyConfig::default()
//! });
//!
//! let record = json!({"title": "Q3 launch plan"});
//! let gate = orchestrator.perform_safety_check("document.save", Some(&record));
//! assert!(gate.is_safe);
//! assert!(registry.validate("doc", &record).is_valid);
//! ```

pub mod contracts;
pub mod detector;
pub mod error;
pub mod orchestrator;
pub mod quality;
pub mod registry;
pub mod schema;

pub use contracts::{
    codes, DataContract, Environment, ErrorCategory, QualityCheck, QualityCheckOutcome,
    Severity, ValidationError, ValidationMetadata, ValidationResult, ValidationRule,
    ValidationWarning,
};
pub use detector::{escalate, DetectionRule, Matcher, PlaceholderDetector};
pub use error::{GateError, Result};
pub use orchestrator::{
    SafetyCheck, SafetyCheckResult, SafetyConfig, SafetyOrchestrator,
    PLACEHOLDER_RECOMMENDATION,
};
pub use quality::{Anomaly, AnomalyKind, DataQualityMetrics, QualityAnalyzer};
pub use registry::{ContractRegistry, QualityCheckReport};
pub use schema::{FieldError, FieldSpec, FieldType, ObjectSchema, Schema};
