//! Configuration structures for the extraction pipeline.
//!
//! The whole surface is read-only input to the core: components read
//! their section once at construction time.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::error::Result;
use super::record::FieldName;

/// Main configuration for the invex pipeline.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct InvexConfig {
    /// OCR collaborator configuration.
    pub ocr: OcrConfig,

    /// Field extraction configuration.
    pub extraction: ExtractionConfig,

    /// Validation configuration.
    pub validation: ValidationConfig,

    /// Anomaly detection configuration.
    pub anomaly: AnomalyConfig,

    /// Orchestrator configuration.
    pub pipeline: PipelineConfig,
}

/// Configuration forwarded to the external OCR engine.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct OcrConfig {
    /// Recognition language hint.
    pub language: String,
}

impl Default for OcrConfig {
    fn default() -> Self {
        Self {
            language: "eng".to_string(),
        }
    }
}

/// Extraction strategy selection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StrategyChoice {
    /// Labeled regex rules only.
    PatternOnly,
    /// Regex rules first, NER for fields they missed.
    PatternThenNer,
    /// NER runs for every field alongside the rules; resolution picks.
    NerPrimary,
}

/// Field extraction configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ExtractionConfig {
    /// Strategy layering.
    pub strategy: StrategyChoice,

    /// Minimum confidence for a winning candidate to enter the record.
    pub min_confidence: f32,

    /// Confidence assigned to exact labeled pattern matches.
    pub labeled_confidence: f32,

    /// Confidence assigned to loose pattern matches.
    pub loose_confidence: f32,

    /// Confidence assigned to NER-derived candidates.
    pub ner_confidence: f32,
}

impl Default for ExtractionConfig {
    fn default() -> Self {
        Self {
            strategy: StrategyChoice::PatternThenNer,
            min_confidence: 0.5,
            labeled_confidence: 0.9,
            loose_confidence: 0.7,
            ner_confidence: 0.5,
        }
    }
}

/// Validation configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ValidationConfig {
    /// Fields whose absence is an error.
    pub required_fields: Vec<FieldName>,

    /// Maximum accepted magnitude for monetary fields.
    pub max_amount: Decimal,

    /// Lower bound of the plausible VAT rate range.
    pub min_vat_rate: Decimal,

    /// Upper bound of the plausible VAT rate range.
    pub max_vat_rate: Decimal,

    /// Days an invoice date may lie in the future.
    pub future_grace_days: u64,

    /// Maximum accepted invoice age in days.
    pub max_age_days: i64,

    /// Tolerance for arithmetic consistency checks, in currency units.
    pub amount_tolerance: Decimal,

    /// Promote every warning to an error.
    pub strict: bool,
}

impl Default for ValidationConfig {
    fn default() -> Self {
        Self {
            required_fields: vec![
                FieldName::Supplier,
                FieldName::Total,
                FieldName::InvoiceDate,
            ],
            max_amount: Decimal::from(1_000_000),
            min_vat_rate: Decimal::ZERO,
            max_vat_rate: Decimal::new(30, 2),
            future_grace_days: 3,
            max_age_days: 3650,
            amount_tolerance: Decimal::new(1, 2),
            strict: false,
        }
    }
}

/// Policy for folding scored invoices into the historical baseline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BaselineUpdate {
    /// Every scored invoice updates the baseline.
    Always,
    /// Invoices with a statistical finding are excluded, so outliers
    /// cannot poison the running statistics. Rule findings do not block
    /// the update; they say nothing about the value distribution.
    ExcludeAnomalous,
}

/// Anomaly detection configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AnomalyConfig {
    /// Disable to skip the detection stage entirely.
    pub enabled: bool,

    /// |z| at which a statistical finding fires.
    pub z_threshold: f64,

    /// Multiple of `z_threshold` at which severity becomes high.
    pub high_severity_factor: f64,

    /// Floor applied to the running stddev before dividing.
    pub stddev_floor: f64,

    /// IQR fence multiplier.
    pub iqr_multiplier: f64,

    /// Maximum samples kept per metric for quantile estimation.
    pub window_size: usize,

    /// Minimum total at which round numbers become suspicious.
    pub round_number_min: Decimal,

    /// Lower hard bound on the VAT rate; crossing it is a high finding.
    pub hard_min_vat_rate: Decimal,

    /// Upper hard bound on the VAT rate.
    pub hard_max_vat_rate: Decimal,

    /// Baseline update policy.
    pub baseline_update: BaselineUpdate,
}

impl Default for AnomalyConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            z_threshold: 3.0,
            high_severity_factor: 1.5,
            stddev_floor: 0.01,
            iqr_multiplier: 1.5,
            window_size: 256,
            round_number_min: Decimal::from(100),
            hard_min_vat_rate: Decimal::ZERO,
            hard_max_vat_rate: Decimal::new(50, 2),
            baseline_update: BaselineUpdate::Always,
        }
    }
}

/// Predicate deciding whether a run counts as successful. A fatal stage
/// failure always fails the run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SuccessCriteria {
    /// No error-severity validation issues.
    NoErrors,
    /// No validation issues at all.
    NoIssues,
    /// Any run that completes its stages.
    FatalOnly,
}

/// Orchestrator configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    /// Success predicate; also gates export and ERP push.
    pub success: SuccessCriteria,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            success: SuccessCriteria::NoErrors,
        }
    }
}

impl InvexConfig {
    /// Load configuration from a JSON file.
    pub fn from_file(path: &std::path::Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Ok(serde_json::from_str(&content)?)
    }

    /// Save configuration to a JSON file.
    pub fn save(&self, path: &std::path::Path) -> Result<()> {
        let content = serde_json::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        Ok(())
    }
}
