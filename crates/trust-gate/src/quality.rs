//! Data quality analysis
//!
//! Computes five quality dimensions over a homogeneous collection of records
//! and folds them into a single weighted score. The weights are fixed
//! constants: reproducibility is favored over per-call tunability.
//!
//! Only completeness, uniqueness and consistency emit anomalies when below
//! their thresholds; validity and timeliness fold into the overall score
//! without independent anomalies.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::{HashMap, HashSet};

use crate::contracts::Severity;
use crate::schema::{type_name, Schema};

/// Dimension weights, summing to 1.0
const WEIGHT_COMPLETENESS: f64 = 0.30;
const WEIGHT_UNIQUENESS: f64 = 0.25;
const WEIGHT_CONSISTENCY: f64 = 0.20;
const WEIGHT_VALIDITY: f64 = 0.15;
const WEIGHT_TIMELINESS: f64 = 0.10;

/// Anomaly thresholds per dimension
const COMPLETENESS_THRESHOLD: f64 = 0.95;
const UNIQUENESS_THRESHOLD: f64 = 0.90;
const CONSISTENCY_THRESHOLD: f64 = 0.90;

/// Timestamp fields consulted for timeliness, first present wins
const TIMESTAMP_FIELDS: [&str; 4] = ["updatedAt", "createdAt", "timestamp", "date"];

/// Kind of a detected anomaly
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AnomalyKind {
    Statistical,
    Semantic,
    Structural,
    Temporal,
}

/// A detected data-quality anomaly; informational, never blocking
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Anomaly {
    pub kind: AnomalyKind,
    pub severity: Severity,
    pub description: String,
    pub field: Option<String>,
    pub value: Option<Value>,
    pub expected_value: Option<Value>,
}

/// Quality dimensions over a record collection, each in [0, 1]
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DataQualityMetrics {
    pub completeness: f64,
    pub uniqueness: f64,
    pub consistency: f64,
    pub validity: f64,
    pub timeliness: f64,
    /// Weighted aggregate in 0..=100
    pub overall_score: u8,
    pub anomalies_detected: Vec<Anomaly>,
}

/// Analyzer over homogeneous record collections.
///
/// The identifier field (default `id`) and the freshness window (default
/// 24 hours) are properties of the analyzer, not per-call options.
pub struct QualityAnalyzer {
    id_field: String,
    freshness_window: Duration,
}

impl Default for QualityAnalyzer {
    fn default() -> Self {
        Self::new()
    }
}

impl QualityAnalyzer {
    pub fn new() -> Self {
        Self {
            id_field: "id".to_string(),
            freshness_window: Duration::hours(24),
        }
    }

    /// Use a different identifier field for the uniqueness dimension
    pub fn with_id_field(mut self, field: impl Into<String>) -> Self {
        self.id_field = field.into();
        self
    }

    /// Use a different freshness window for the timeliness dimension
    pub fn with_freshness_window(mut self, window: Duration) -> Self {
        self.freshness_window = window;
        self
    }

    /// Analyze a dataset, optionally validating each record against a schema.
    ///
    /// An empty dataset scores 1.0 on every dimension (vacuous truth).
    pub fn analyze(&self, dataset: &[Value], schema: Option<&dyn Schema>) -> DataQualityMetrics {
        if dataset.is_empty() {
            return DataQualityMetrics {
                completeness: 1.0,
                uniqueness: 1.0,
                consistency: 1.0,
                validity: 1.0,
                timeliness: 1.0,
                overall_score: 100,
                anomalies_detected: Vec::new(),
            };
        }

        let completeness = self.completeness(dataset);
        let uniqueness = self.uniqueness(dataset);
        let consistency = self.consistency(dataset);
        let validity = match schema {
            Some(schema) => self.validity(dataset, schema),
            None => 1.0,
        };
        let timeliness = self.timeliness(dataset);

        let weighted = WEIGHT_COMPLETENESS * completeness
            + WEIGHT_UNIQUENESS * uniqueness
            + WEIGHT_CONSISTENCY * consistency
            + WEIGHT_VALIDITY * validity
            + WEIGHT_TIMELINESS * timeliness;
        let overall_score = (weighted * 100.0).round().clamp(0.0, 100.0) as u8;

        let mut anomalies = Vec::new();
        if completeness < COMPLETENESS_THRESHOLD {
            anomalies.push(Anomaly {
                kind: AnomalyKind::Statistical,
                severity: Severity::Medium,
                description: format!(
                    "completeness {:.3} is below the {:.2} threshold",
                    completeness, COMPLETENESS_THRESHOLD
                ),
                field: None,
                value: Some(Value::from(completeness)),
                expected_value: Some(Value::from(COMPLETENESS_THRESHOLD)),
            });
        }
        if uniqueness < UNIQUENESS_THRESHOLD {
            anomalies.push(Anomaly {
                kind: AnomalyKind::Semantic,
                severity: Severity::High,
                description: format!(
                    "uniqueness {:.3} is below the {:.2} threshold: duplicate '{}' values present",
                    uniqueness, UNIQUENESS_THRESHOLD, self.id_field
                ),
                field: Some(self.id_field.clone()),
                value: Some(Value::from(uniqueness)),
                expected_value: Some(Value::from(UNIQUENESS_THRESHOLD)),
            });
        }
        if consistency < CONSISTENCY_THRESHOLD {
            anomalies.push(Anomaly {
                kind: AnomalyKind::Structural,
                severity: Severity::Medium,
                description: format!(
                    "consistency {:.3} is below the {:.2} threshold: field types drift across records",
                    consistency, CONSISTENCY_THRESHOLD
                ),
                field: None,
                value: Some(Value::from(consistency)),
                expected_value: Some(Value::from(CONSISTENCY_THRESHOLD)),
            });
        }

        DataQualityMetrics {
            completeness,
            uniqueness,
            consistency,
            validity,
            timeliness,
            overall_score,
            anomalies_detected: anomalies,
        }
    }

    /// populated-field-count / total-field-count across all records.
    /// A field counts as populated iff not null and not the empty string.
    fn completeness(&self, dataset: &[Value]) -> f64 {
        let mut total = 0usize;
        let mut populated = 0usize;
        for record in dataset {
            if let Some(obj) = record.as_object() {
                for value in obj.values() {
                    total += 1;
                    let empty = matches!(value, Value::Null)
                        || value.as_str().map(|s| s.is_empty()).unwrap_or(false);
                    if !empty {
                        populated += 1;
                    }
                }
            }
        }
        if total == 0 {
            return 1.0;
        }
        populated as f64 / total as f64
    }

    /// |distinct identifier values| / |records|. Records without the
    /// identifier field all collapse onto a single null key.
    fn uniqueness(&self, dataset: &[Value]) -> f64 {
        let mut distinct: HashSet<String> = HashSet::new();
        for record in dataset {
            let key = record
                .get(&self.id_field)
                .cloned()
                .unwrap_or(Value::Null)
                .to_string();
            distinct.insert(key);
        }
        distinct.len() as f64 / dataset.len() as f64
    }

    /// Fraction of observed field names whose runtime type is identical
    /// across every record that has the field.
    fn consistency(&self, dataset: &[Value]) -> f64 {
        let mut field_types: HashMap<String, HashSet<&'static str>> = HashMap::new();
        for record in dataset {
            if let Some(obj) = record.as_object() {
                for (key, value) in obj {
                    field_types
                        .entry(key.clone())
                        .or_default()
                        .insert(type_name(value));
                }
            }
        }
        if field_types.is_empty() {
            return 1.0;
        }
        let consistent = field_types.values().filter(|types| types.len() == 1).count();
        consistent as f64 / field_types.len() as f64
    }

    /// Fraction of records that pass the structural schema
    fn validity(&self, dataset: &[Value], schema: &dyn Schema) -> f64 {
        let valid = dataset
            .iter()
            .filter(|record| schema.check(record).is_empty())
            .count();
        valid as f64 / dataset.len() as f64
    }

    /// Fraction of records whose most relevant timestamp falls within the
    /// freshness window. Records with no timestamp field cannot be judged
    /// and count as fresh; an unparseable timestamp counts as stale.
    fn timeliness(&self, dataset: &[Value]) -> f64 {
        let now = Utc::now();
        let fresh = dataset
            .iter()
            .filter(|record| match record_timestamp(record) {
                Some(Ok(ts)) => now.signed_duration_since(ts) <= self.freshness_window,
                Some(Err(())) => false,
                None => true,
            })
            .count();
        fresh as f64 / dataset.len() as f64
    }
}

/// First present timestamp field, parsed as RFC 3339 or epoch milliseconds
fn record_timestamp(record: &Value) -> Option<Result<DateTime<Utc>, ()>> {
    for field in TIMESTAMP_FIELDS {
        if let Some(value) = record.get(field) {
            return Some(parse_timestamp(value));
        }
    }
    None
}

fn parse_timestamp(value: &Value) -> Result<DateTime<Utc>, ()> {
    match value {
        Value::String(s) => DateTime::parse_from_rfc3339(s)
            .map(|dt| dt.with_timezone(&Utc))
            .map_err(|_| ()),
        Value::Number(n) => n
            .as_i64()
            .and_then(DateTime::from_timestamp_millis)
            .ok_or(()),
        _ => Err(()),
    }
}
