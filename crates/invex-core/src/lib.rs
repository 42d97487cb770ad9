//! Core library for invoice data extraction.
//!
//! This crate provides:
//! - Layered field extraction (labeled patterns with an NER fallback)
//! - Candidate resolution into exact-decimal invoice records
//! - Deterministic validation rules (arithmetic, ranges, dates)
//! - Statistical and rule-based anomaly detection against a shared
//!   historical baseline
//! - A stage-ordered pipeline orchestrator with export/ERP handoff

pub mod anomaly;
pub mod erp;
pub mod error;
pub mod export;
pub mod extract;
pub mod models;
pub mod pipeline;
pub mod validate;

pub use anomaly::{AnomalyDetector, HistoricalBaseline};
pub use error::{InvexError, Result};
pub use extract::{Extraction, FieldExtractor};
pub use models::config::InvexConfig;
pub use models::record::{
    CandidateField, FieldName, FieldValue, InvoiceRecord, LineItem, StrategyKind,
};
pub use models::report::{
    AnomalyFinding, AnomalyKind, AnomalySeverity, BatchSummary, PipelineResult, Severity, Stage,
    ValidationIssue,
};
pub use pipeline::Pipeline;
pub use validate::Validator;
