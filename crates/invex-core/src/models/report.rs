//! Reports produced by the validation, anomaly and pipeline stages.

use std::fmt;

use serde::{Deserialize, Serialize};

use super::record::InvoiceRecord;

/// Severity of a validation issue.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    Warning,
    Error,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Severity::Warning => f.write_str("warning"),
            Severity::Error => f.write_str("error"),
        }
    }
}

/// A single validation finding against a record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ValidationIssue {
    /// Error aborts acceptance (per success criteria); warning does not.
    pub severity: Severity,

    /// Field the issue concerns.
    pub field: String,

    /// Human-readable description.
    pub message: String,

    /// Stable identifier of the rule that fired.
    pub rule_id: String,
}

impl ValidationIssue {
    pub fn error(rule_id: &str, field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            severity: Severity::Error,
            field: field.into(),
            message: message.into(),
            rule_id: rule_id.to_string(),
        }
    }

    pub fn warning(rule_id: &str, field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            severity: Severity::Warning,
            field: field.into(),
            message: message.into(),
            rule_id: rule_id.to_string(),
        }
    }

    /// Promote a warning to an error (strict mode).
    pub fn promoted(mut self) -> Self {
        self.severity = Severity::Error;
        self
    }
}

/// Which sub-detector produced an anomaly finding.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AnomalyKind {
    Statistical,
    Rule,
}

/// Coarse severity of an anomaly finding.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AnomalySeverity {
    Low,
    Medium,
    High,
}

impl fmt::Display for AnomalySeverity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AnomalySeverity::Low => f.write_str("low"),
            AnomalySeverity::Medium => f.write_str("medium"),
            AnomalySeverity::High => f.write_str("high"),
        }
    }
}

/// A flagged anomaly on a scored record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnomalyFinding {
    /// Detection method family.
    pub kind: AnomalyKind,

    /// Field the finding concerns.
    pub field: String,

    /// Coarse severity.
    pub severity: AnomalySeverity,

    /// Method-dependent numeric score (z-score, fence distance, value).
    pub score: f64,

    /// Human-readable description.
    pub description: String,
}

/// Pipeline stages, in execution order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
    Started,
    Extracted,
    Validated,
    AnomalyChecked,
    Exported,
    Completed,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Stage::Started => "started",
            Stage::Extracted => "extracted",
            Stage::Validated => "validated",
            Stage::AnomalyChecked => "anomaly_checked",
            Stage::Exported => "exported",
            Stage::Completed => "completed",
        };
        f.write_str(name)
    }
}

/// External collaborator a delivery failure came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DeliveryTarget {
    Export,
    Erp,
}

/// A non-fatal failure while handing the record to a collaborator.
/// Kept distinct from validation issues.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeliveryFailure {
    pub target: DeliveryTarget,
    pub message: String,
}

/// Final report of one pipeline run. Immutable once produced.
///
/// `stage_reached` is the last stage that completed. When `error` is
/// set, the run failed fatally in the stage after `stage_reached` and
/// carries its diagnostic; validation issues and anomaly findings never
/// set it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PipelineResult {
    /// Whether the configured success criteria were met.
    pub success: bool,

    /// Resolved record, absent when extraction failed fatally.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub record: Option<InvoiceRecord>,

    /// Accumulated validation issues.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub validation_issues: Vec<ValidationIssue>,

    /// Accumulated anomaly findings.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub anomalies: Vec<AnomalyFinding>,

    /// Export/ERP push failures, distinct from validation issues.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub delivery_failures: Vec<DeliveryFailure>,

    /// Last completed stage.
    pub stage_reached: Stage,

    /// Fatal-stage diagnostic.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl PipelineResult {
    /// A run that failed fatally after completing `stage_reached`.
    pub fn failed(stage_reached: Stage, message: impl Into<String>) -> Self {
        Self {
            success: false,
            record: None,
            validation_issues: Vec::new(),
            anomalies: Vec::new(),
            delivery_failures: Vec::new(),
            stage_reached,
            error: Some(message.into()),
        }
    }

    /// Whether the run hit a fatal stage failure.
    pub fn is_fatal(&self) -> bool {
        self.error.is_some()
    }

    /// Number of error-severity validation issues.
    pub fn error_count(&self) -> usize {
        self.validation_issues
            .iter()
            .filter(|i| i.severity == Severity::Error)
            .count()
    }
}

/// Aggregated outcome of a batch run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BatchSummary {
    /// Number of inputs processed.
    pub total: usize,

    /// Runs that met the success criteria.
    pub successful: usize,

    /// Runs that did not.
    pub failed: usize,

    /// Per-input results, in input order.
    pub results: Vec<PipelineResult>,
}
