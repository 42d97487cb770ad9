//! Invoice data models produced by field resolution.

use std::collections::HashMap;
use std::fmt;

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Canonical invoice field names.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FieldName {
    InvoiceNumber,
    InvoiceDate,
    Supplier,
    Subtotal,
    Vat,
    Total,
}

impl FieldName {
    /// All scalar fields, in resolution order.
    pub const ALL: [FieldName; 6] = [
        FieldName::InvoiceNumber,
        FieldName::InvoiceDate,
        FieldName::Supplier,
        FieldName::Subtotal,
        FieldName::Vat,
        FieldName::Total,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            FieldName::InvoiceNumber => "invoice_number",
            FieldName::InvoiceDate => "invoice_date",
            FieldName::Supplier => "supplier",
            FieldName::Subtotal => "subtotal",
            FieldName::Vat => "vat",
            FieldName::Total => "total",
        }
    }

    /// Whether this field carries a monetary amount.
    pub fn is_amount(&self) -> bool {
        matches!(
            self,
            FieldName::Subtotal | FieldName::Vat | FieldName::Total
        )
    }
}

impl fmt::Display for FieldName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A parsed field value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FieldValue {
    Text(String),
    Amount(Decimal),
    Date(NaiveDate),
}

impl FieldValue {
    pub fn as_text(&self) -> Option<&str> {
        match self {
            FieldValue::Text(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_amount(&self) -> Option<Decimal> {
        match self {
            FieldValue::Amount(d) => Some(*d),
            _ => None,
        }
    }

    pub fn as_date(&self) -> Option<NaiveDate> {
        match self {
            FieldValue::Date(d) => Some(*d),
            _ => None,
        }
    }
}

/// Extraction strategy that produced a candidate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StrategyKind {
    /// Labeled regular-expression rules.
    Pattern,
    /// Named-entity recognition fallback.
    Ner,
}

impl StrategyKind {
    /// Tie-break priority when two candidates share a confidence score.
    pub fn priority(&self) -> u8 {
        match self {
            StrategyKind::Pattern => 1,
            StrategyKind::Ner => 0,
        }
    }
}

/// A proposed value for an invoice field, before resolution into the
/// canonical record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CandidateField {
    /// Field this candidate proposes a value for.
    pub field: FieldName,

    /// Source text the candidate was matched from.
    pub raw: String,

    /// Parsed value.
    pub value: FieldValue,

    /// Confidence score (0.0 - 1.0).
    pub confidence: f32,

    /// Strategy that produced the candidate.
    pub strategy: StrategyKind,
}

impl CandidateField {
    pub fn new(
        field: FieldName,
        raw: impl Into<String>,
        value: FieldValue,
        confidence: f32,
        strategy: StrategyKind,
    ) -> Self {
        Self {
            field,
            raw: raw.into(),
            value,
            confidence,
            strategy,
        }
    }
}

/// A single line item on the invoice.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LineItem {
    /// Product/service description.
    pub description: String,

    /// Quantity.
    pub quantity: Decimal,

    /// Price per unit.
    pub unit_price: Decimal,

    /// Total for this line. Checked against quantity * unit_price,
    /// never corrected.
    pub line_total: Decimal,
}

/// Canonical structured invoice record merged from candidates.
///
/// Every scalar field is optional: an unparsable or missing candidate
/// leaves the field absent, and validation reports it. Monetary fields
/// are exact decimals.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct InvoiceRecord {
    /// Invoice number/identifier.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub invoice_number: Option<String>,

    /// Date the invoice was issued.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub invoice_date: Option<NaiveDate>,

    /// Supplier (seller) name.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub supplier: Option<String>,

    /// Net amount before VAT.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub subtotal: Option<Decimal>,

    /// VAT amount.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub vat: Option<Decimal>,

    /// Gross amount after VAT.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub total: Option<Decimal>,

    /// Line items in document order.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub line_items: Vec<LineItem>,

    /// Metadata about the extraction run.
    #[serde(default)]
    pub meta: ExtractionMeta,
}

impl InvoiceRecord {
    /// Whether a scalar field is present.
    pub fn has(&self, field: FieldName) -> bool {
        match field {
            FieldName::InvoiceNumber => self.invoice_number.is_some(),
            FieldName::InvoiceDate => self.invoice_date.is_some(),
            FieldName::Supplier => self.supplier.is_some(),
            FieldName::Subtotal => self.subtotal.is_some(),
            FieldName::Vat => self.vat.is_some(),
            FieldName::Total => self.total.is_some(),
        }
    }

    /// Current value of a scalar field, if present.
    pub fn get(&self, field: FieldName) -> Option<FieldValue> {
        match field {
            FieldName::InvoiceNumber => {
                self.invoice_number.clone().map(FieldValue::Text)
            }
            FieldName::InvoiceDate => self.invoice_date.map(FieldValue::Date),
            FieldName::Supplier => self.supplier.clone().map(FieldValue::Text),
            FieldName::Subtotal => self.subtotal.map(FieldValue::Amount),
            FieldName::Vat => self.vat.map(FieldValue::Amount),
            FieldName::Total => self.total.map(FieldValue::Amount),
        }
    }

    /// Effective VAT rate (vat / subtotal), when both are present and
    /// the subtotal is positive.
    pub fn vat_rate(&self) -> Option<Decimal> {
        match (self.subtotal, self.vat) {
            (Some(subtotal), Some(vat)) if subtotal > Decimal::ZERO => {
                Some(vat / subtotal)
            }
            _ => None,
        }
    }

    /// Sum of all line totals.
    pub fn line_total_sum(&self) -> Decimal {
        self.line_items.iter().map(|i| i.line_total).sum()
    }
}

/// Metadata about the extraction run that produced a record.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ExtractionMeta {
    /// Field-level confidence scores of the winning candidates.
    #[serde(default, skip_serializing_if = "HashMap::is_empty")]
    pub field_confidence: HashMap<FieldName, f32>,

    /// Warnings accumulated during extraction (dropped rows,
    /// discarded unparsable candidates).
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub warnings: Vec<String>,

    /// Processing time in milliseconds.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub processing_time_ms: Option<u64>,
}
