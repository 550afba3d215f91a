//! Safety orchestrator
//!
//! Composes the placeholder detector and environment policy into a single
//! gate that calling code must pass before committing a write. The
//! orchestrator is a pure decision function: it never mutates data, never
//! persists, and reports failures instead of throwing. Treating
//! `is_safe == false` as a hard abort is the caller's contract.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::contracts::Environment;
use crate::detector::PlaceholderDetector;

/// Recommendation appended whenever placeholder content blocks a write
pub const PLACEHOLDER_RECOMMENDATION: &str =
    "Remove placeholder or mock values before committing this write";

/// Configuration for the safety gate
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SafetyConfig {
    /// Active environment; drives placeholder blocking and severity escalation
    pub environment: Environment,
    /// Reserved for host-side strict schema enforcement on its write paths
    pub enable_strict_validation: bool,
    /// Block writes containing placeholder content in gated environments
    pub block_placeholders: bool,
    /// Whether callers are expected to validate against a registered contract
    pub require_data_contracts: bool,
    /// Whether the host runs the observability engine alongside the gate
    pub enable_observability: bool,
}

impl Default for SafetyConfig {
    fn default() -> Self {
        Self {
            environment: Environment::Development,
            enable_strict_validation: true,
            block_placeholders: true,
            require_data_contracts: true,
            enable_observability: true,
        }
    }
}

/// One evaluated check inside a [`SafetyCheckResult`]
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SafetyCheck {
    pub name: String,
    pub passed: bool,
    pub message: String,
}

/// Outcome of [`SafetyOrchestrator::perform_safety_check`]
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SafetyCheckResult {
    /// Conjunction of all check outcomes and an empty blocked-action list
    pub is_safe: bool,
    pub environment: Environment,
    pub checks: Vec<SafetyCheck>,
    pub recommendations: Vec<String>,
    /// Operations that must not proceed
    pub blocked_actions: Vec<String>,
}

/// The safety gate composing detector and environment policy
pub struct SafetyOrchestrator {
    config: SafetyConfig,
    detector: PlaceholderDetector,
}

impl SafetyOrchestrator {
    pub fn new(config: SafetyConfig) -> Self {
        let detector = PlaceholderDetector::new(config.environment);
        Self { config, detector }
    }

    pub fn config(&self) -> &SafetyConfig {
        &self.config
    }

    pub fn detector(&self) -> &PlaceholderDetector {
        &self.detector
    }

    /// Evaluate the gate for a pending operation.
    ///
    /// Runs, in order: the informational environment check, the placeholder
    /// scan (gated environments with blocking enabled and data present), the
    /// data-contract pass-through (the schema gate is a separate explicit
    /// call so callers choose when to pay its cost), and the informational
    /// observability check.
    pub fn perform_safety_check(&self, operation: &str, data: Option<&Value>) -> SafetyCheckResult {
        let mut checks = Vec::new();
        let mut recommendations = Vec::new();
        let mut blocked_actions = Vec::new();

        checks.push(SafetyCheck {
            name: "environment".to_string(),
            passed: true,
            message: format!("running in {} environment", self.config.environment),
        });

        if self.config.environment.is_gated() && self.config.block_placeholders {
            if let Some(data) = data {
                let hits = self.detector.scan(data);
                let passed = hits.is_empty();
                if !passed {
                    blocked_actions.push(operation.to_string());
                    recommendations.push(PLACEHOLDER_RECOMMENDATION.to_string());
                }
                checks.push(SafetyCheck {
                    name: "placeholder_scan".to_string(),
                    passed,
                    message: if passed {
                        "no placeholder content detected".to_string()
                    } else {
                        format!("{} placeholder finding(s) in '{}'", hits.len(), operation)
                    },
                });
            }
        }

        if self.config.require_data_contracts && data.is_some() {
            checks.push(SafetyCheck {
                name: "data_contract".to_string(),
                passed: true,
                message: "contract validation is delegated to the caller".to_string(),
            });
        }

        checks.push(SafetyCheck {
            name: "observability".to_string(),
            passed: true,
            message: if self.config.enable_observability {
                "observability engine enabled".to_string()
            } else {
                "observability engine disabled".to_string()
            },
        });

        let is_safe = checks.iter().all(|c| c.passed) && blocked_actions.is_empty();

        SafetyCheckResult {
            is_safe,
            environment: self.config.environment,
            checks,
            recommendations,
            blocked_actions,
        }
    }
}
