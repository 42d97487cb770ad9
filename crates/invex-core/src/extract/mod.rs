//! Field extraction: layered strategies over recognized invoice text.
//!
//! The pattern strategy applies ordered labeled regex rules per field;
//! the NER strategy fills in fields the rules missed. Candidates carry
//! confidence scores and are resolved into the canonical record by
//! keeping the best candidate per field.

pub mod ner;
pub mod numeric;
pub mod patterns;

use std::cmp::Ordering;
use std::collections::HashMap;

use tracing::{debug, warn};

use crate::models::config::{ExtractionConfig, StrategyChoice};
use crate::models::record::{
    CandidateField, ExtractionMeta, FieldName, FieldValue, InvoiceRecord, LineItem, StrategyKind,
};

use ner::{EntityRecognizer, LexiconRecognizer, field_for};
use numeric::{parse_amount, parse_date};
use patterns::*;

/// Raw strategy output, before resolution.
#[derive(Debug, Clone, Default)]
pub struct Extraction {
    /// Candidate values, possibly several per field.
    pub candidates: Vec<CandidateField>,

    /// Fully parsed line item rows.
    pub line_items: Vec<LineItem>,

    /// Dropped rows and discarded candidates.
    pub warnings: Vec<String>,
}

/// Converts recognized text into candidate fields and resolves them
/// into a canonical record. Never fails on malformed input: the worst
/// case is an empty candidate set.
pub struct FieldExtractor {
    config: ExtractionConfig,
    /// Effective strategy after capability detection.
    strategy: StrategyChoice,
    recognizer: Option<Box<dyn EntityRecognizer>>,
}

impl FieldExtractor {
    /// Create an extractor with the built-in lexicon recognizer.
    pub fn new(config: ExtractionConfig) -> Self {
        Self::with_recognizer(config, Some(Box::new(LexiconRecognizer)))
    }

    /// Create an extractor with an explicit recognizer, or none. When
    /// the configured strategy needs NER and no recognizer is available
    /// the extractor degrades to pattern-only.
    pub fn with_recognizer(
        config: ExtractionConfig,
        recognizer: Option<Box<dyn EntityRecognizer>>,
    ) -> Self {
        let mut strategy = config.strategy;
        if recognizer.is_none() && strategy != StrategyChoice::PatternOnly {
            warn!("no entity recognizer available, using pattern-only extraction");
            strategy = StrategyChoice::PatternOnly;
        }
        Self {
            config,
            strategy,
            recognizer,
        }
    }

    /// Extract candidate fields and line items from recognized text.
    pub fn extract(&self, text: &str) -> Extraction {
        let mut out = Extraction::default();

        match self.strategy {
            StrategyChoice::PatternOnly => {
                out.candidates = self.pattern_candidates(text, &mut out.warnings);
            }
            StrategyChoice::PatternThenNer => {
                out.candidates = self.pattern_candidates(text, &mut out.warnings);
                let missing: Vec<FieldName> = FieldName::ALL
                    .iter()
                    .copied()
                    .filter(|f| !out.candidates.iter().any(|c| c.field == *f))
                    .collect();
                if !missing.is_empty() {
                    out.candidates.extend(self.ner_candidates(text, &missing));
                }
            }
            StrategyChoice::NerPrimary => {
                out.candidates = self.ner_candidates(text, &FieldName::ALL);
                out.candidates
                    .extend(self.pattern_candidates(text, &mut out.warnings));
            }
        }

        self.extract_line_items(text, &mut out);

        debug!(
            "extracted {} candidates and {} line items",
            out.candidates.len(),
            out.line_items.len()
        );
        out
    }

    /// Resolve candidates into the canonical record: highest confidence
    /// wins per field, exact ties prefer pattern candidates over NER.
    pub fn resolve(&self, extraction: Extraction) -> InvoiceRecord {
        let Extraction {
            candidates,
            line_items,
            warnings,
        } = extraction;

        let mut best: HashMap<FieldName, CandidateField> = HashMap::new();
        for candidate in candidates {
            match best.get(&candidate.field) {
                Some(incumbent) if !beats(&candidate, incumbent) => {}
                _ => {
                    best.insert(candidate.field, candidate);
                }
            }
        }

        let mut record = InvoiceRecord::default();
        let mut field_confidence = HashMap::new();

        for (field, candidate) in best {
            if candidate.confidence < self.config.min_confidence {
                debug!(
                    "dropping low-confidence candidate for {field} ({:.2})",
                    candidate.confidence
                );
                continue;
            }
            field_confidence.insert(field, candidate.confidence);
            match (field, candidate.value) {
                (FieldName::InvoiceNumber, FieldValue::Text(s)) => record.invoice_number = Some(s),
                (FieldName::Supplier, FieldValue::Text(s)) => record.supplier = Some(s),
                (FieldName::InvoiceDate, FieldValue::Date(d)) => record.invoice_date = Some(d),
                (FieldName::Subtotal, FieldValue::Amount(a)) => record.subtotal = Some(a),
                (FieldName::Vat, FieldValue::Amount(a)) => record.vat = Some(a),
                (FieldName::Total, FieldValue::Amount(a)) => record.total = Some(a),
                _ => {}
            }
        }

        record.line_items = line_items;
        record.meta = ExtractionMeta {
            field_confidence,
            warnings,
            processing_time_ms: None,
        };
        record
    }

    fn pattern_candidates(
        &self,
        text: &str,
        warnings: &mut Vec<String>,
    ) -> Vec<CandidateField> {
        let mut candidates = Vec::new();

        for (field, rules) in pattern_rules(&self.config) {
            for (regex, confidence) in rules {
                let Some(caps) = regex.captures(text) else { continue };
                let raw = caps.get(1).map(|m| m.as_str().trim()).unwrap_or("");
                if raw.is_empty() {
                    continue;
                }
                match self.parse_candidate(field, raw, confidence, StrategyKind::Pattern) {
                    Some(candidate) => candidates.push(candidate),
                    None => {
                        warnings.push(format!("discarded unparsable {field} candidate: {raw}"));
                    }
                }
                // First rule with a non-empty match wins for this field.
                break;
            }
        }

        candidates
    }

    fn ner_candidates(&self, text: &str, wanted: &[FieldName]) -> Vec<CandidateField> {
        let Some(recognizer) = &self.recognizer else {
            return Vec::new();
        };

        let mut candidates: Vec<CandidateField> = Vec::new();
        for entity in recognizer.recognize(text) {
            let field = field_for(entity.kind);
            if !wanted.contains(&field) {
                continue;
            }
            // First recognized entity per field.
            if candidates.iter().any(|c| c.field == field) {
                continue;
            }
            if let Some(candidate) = self.parse_candidate(
                field,
                entity.text.trim(),
                self.config.ner_confidence,
                StrategyKind::Ner,
            ) {
                candidates.push(candidate);
            } else {
                debug!("discarded unparsable {field} entity: {}", entity.text);
            }
        }
        candidates
    }

    fn parse_candidate(
        &self,
        field: FieldName,
        raw: &str,
        confidence: f32,
        strategy: StrategyKind,
    ) -> Option<CandidateField> {
        let value = if field.is_amount() {
            FieldValue::Amount(parse_amount(raw)?)
        } else if field == FieldName::InvoiceDate {
            FieldValue::Date(parse_date(raw)?)
        } else {
            FieldValue::Text(raw.to_string())
        };
        Some(CandidateField::new(field, raw, value, confidence, strategy))
    }

    fn extract_line_items(&self, text: &str, out: &mut Extraction) {
        for caps in LINE_ITEM.captures_iter(text) {
            let description = caps[1].trim().to_string();
            let parsed = (
                parse_amount(&caps[2]),
                parse_amount(&caps[3]),
                parse_amount(&caps[4]),
            );
            match parsed {
                (Some(quantity), Some(unit_price), Some(line_total)) => {
                    out.line_items.push(LineItem {
                        description,
                        quantity,
                        unit_price,
                        line_total,
                    });
                }
                _ => {
                    out.warnings.push(format!(
                        "dropped line item row with unparsable fields: {}",
                        caps[0].trim()
                    ));
                }
            }
        }

        // Rows that look tabular but are missing a column are dropped
        // loudly rather than kept as partial records.
        for m in LINE_ITEM_PROBE.find_iter(text) {
            let row = m.as_str().trim();
            if !LINE_ITEM.is_match(row) {
                out.warnings
                    .push(format!("dropped incomplete line item row: {row}"));
            }
        }
    }
}

/// Whether `challenger` replaces `incumbent` during resolution.
fn beats(challenger: &CandidateField, incumbent: &CandidateField) -> bool {
    match challenger.confidence.total_cmp(&incumbent.confidence) {
        Ordering::Greater => true,
        Ordering::Equal => challenger.strategy.priority() > incumbent.strategy.priority(),
        Ordering::Less => false,
    }
}

/// Ordered rule table: first matching rule per field wins.
fn pattern_rules(config: &ExtractionConfig) -> [(FieldName, Vec<(&'static regex::Regex, f32)>); 6] {
    let labeled = config.labeled_confidence;
    let loose = config.loose_confidence;
    [
        (
            FieldName::InvoiceNumber,
            vec![
                (&*INVOICE_NUMBER_LABELED, labeled),
                (&*INVOICE_NUMBER_LOOSE, loose),
            ],
        ),
        (
            FieldName::InvoiceDate,
            vec![(&*DATE_LABELED, labeled), (&*DATE_LOOSE, loose)],
        ),
        (FieldName::Supplier, vec![(&*SUPPLIER_LABELED, labeled)]),
        (FieldName::Subtotal, vec![(&*SUBTOTAL_LABELED, labeled)]),
        (
            FieldName::Vat,
            vec![(&*VAT_LABELED, labeled), (&*VAT_LOOSE, loose)],
        ),
        (
            FieldName::Total,
            vec![(&*TOTAL_LABELED, labeled), (&*TOTAL_LOOSE, loose)],
        ),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use rust_decimal::Decimal;
    use std::str::FromStr;

    const SAMPLE_INVOICE: &str = "\
Acme Widgets Ltd.
123 Industrial Way

Invoice Number: INV-2024-001
Invoice Date: 15/01/2024
From: Acme Widgets Ltd.

Widget assembly    5   $100.00   $500.00
Premium support    1   $500.00   $500.00

Subtotal: $1,000.00
VAT (20%): $200.00
Total Due: $1,200.00
";

    fn extractor() -> FieldExtractor {
        FieldExtractor::new(ExtractionConfig::default())
    }

    #[test]
    fn test_extract_full_invoice() {
        let record = {
            let e = extractor();
            let extraction = e.extract(SAMPLE_INVOICE);
            e.resolve(extraction)
        };

        assert_eq!(record.invoice_number.as_deref(), Some("INV-2024-001"));
        assert_eq!(
            record.invoice_date,
            chrono::NaiveDate::from_ymd_opt(2024, 1, 15)
        );
        assert_eq!(record.supplier.as_deref(), Some("Acme Widgets Ltd."));
        assert_eq!(record.subtotal, Some(Decimal::from(1000)));
        assert_eq!(record.vat, Some(Decimal::from(200)));
        assert_eq!(record.total, Some(Decimal::from(1200)));
        assert_eq!(record.line_items.len(), 2);
        assert_eq!(record.line_items[0].description, "Widget assembly");
        assert_eq!(record.line_items[0].quantity, Decimal::from(5));
        assert_eq!(
            record.line_items[0].unit_price,
            Decimal::from_str("100.00").unwrap()
        );
    }

    #[test]
    fn test_empty_input_yields_empty_candidates() {
        let extraction = extractor().extract("completely unrelated text");
        assert!(extraction.candidates.is_empty());
        assert!(extraction.line_items.is_empty());
    }

    #[test]
    fn test_resolution_prefers_higher_confidence() {
        let e = extractor();
        let extraction = Extraction {
            candidates: vec![
                CandidateField::new(
                    FieldName::Total,
                    "100.00",
                    FieldValue::Amount(Decimal::from(100)),
                    0.7,
                    StrategyKind::Ner,
                ),
                CandidateField::new(
                    FieldName::Total,
                    "120.00",
                    FieldValue::Amount(Decimal::from(120)),
                    0.9,
                    StrategyKind::Pattern,
                ),
            ],
            ..Default::default()
        };
        let record = e.resolve(extraction);
        assert_eq!(record.total, Some(Decimal::from(120)));
    }

    #[test]
    fn test_resolution_tie_prefers_pattern() {
        let e = extractor();
        let extraction = Extraction {
            candidates: vec![
                CandidateField::new(
                    FieldName::Supplier,
                    "Ner Corp",
                    FieldValue::Text("Ner Corp".to_string()),
                    0.8,
                    StrategyKind::Ner,
                ),
                CandidateField::new(
                    FieldName::Supplier,
                    "Pattern Corp",
                    FieldValue::Text("Pattern Corp".to_string()),
                    0.8,
                    StrategyKind::Pattern,
                ),
            ],
            ..Default::default()
        };
        let record = e.resolve(extraction);
        assert_eq!(record.supplier.as_deref(), Some("Pattern Corp"));
    }

    #[test]
    fn test_min_confidence_drops_weak_candidates() {
        let e = extractor();
        let extraction = Extraction {
            candidates: vec![CandidateField::new(
                FieldName::Total,
                "100.00",
                FieldValue::Amount(Decimal::from(100)),
                0.2,
                StrategyKind::Ner,
            )],
            ..Default::default()
        };
        let record = e.resolve(extraction);
        assert_eq!(record.total, None);
    }

    #[test]
    fn test_ner_fallback_fills_missing_supplier() {
        let e = extractor();

        // No "From:" label and no legal suffix: supplier stays absent.
        let text = "\
Globex Headquarters
Invoice Number: INV-7
Total: $50.00
";
        let record = {
            let extraction = e.extract(text);
            e.resolve(extraction)
        };
        assert_eq!(record.invoice_number.as_deref(), Some("INV-7"));
        assert_eq!(record.supplier, None);

        // An org-shaped header line is picked up by the recognizer.
        let text_with_suffix = "\
Globex Widgets Inc.
Invoice Number: INV-7
Total: $50.00
";
        let record = {
            let extraction = e.extract(text_with_suffix);
            e.resolve(extraction)
        };
        assert_eq!(record.supplier.as_deref(), Some("Globex Widgets Inc."));
        assert_eq!(
            record.meta.field_confidence.get(&FieldName::Supplier),
            Some(&0.5)
        );
    }

    #[test]
    fn test_incomplete_line_item_row_dropped_with_warning() {
        let text = "\
Invoice Number: INV-9
Widget assembly    5   $100.00
Total: $500.00
";
        let extraction = extractor().extract(text);
        assert!(extraction.line_items.is_empty());
        assert!(
            extraction
                .warnings
                .iter()
                .any(|w| w.contains("incomplete line item row")),
            "warnings: {:?}",
            extraction.warnings
        );
    }

    #[test]
    fn test_pattern_only_without_recognizer() {
        let config = ExtractionConfig {
            strategy: StrategyChoice::PatternThenNer,
            ..Default::default()
        };
        let e = FieldExtractor::with_recognizer(config, None);
        let extraction = e.extract("Total: $10.00");
        assert!(extraction.candidates.iter().all(|c| c.strategy == StrategyKind::Pattern));
    }
}
