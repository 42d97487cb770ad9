//! Business-rule heuristics, independent of the baseline.

use std::collections::BTreeMap;

use rust_decimal::Decimal;
use rust_decimal::prelude::ToPrimitive;

use crate::models::config::AnomalyConfig;
use crate::models::record::InvoiceRecord;
use crate::models::report::{AnomalyFinding, AnomalyKind, AnomalySeverity};

pub(super) fn detect(record: &InvoiceRecord, config: &AnomalyConfig) -> Vec<AnomalyFinding> {
    let mut findings = Vec::new();
    round_number(record, config, &mut findings);
    duplicate_line_items(record, &mut findings);
    hard_vat_bound(record, config, &mut findings);
    missing_identity(record, &mut findings);
    findings
}

fn round_number(record: &InvoiceRecord, config: &AnomalyConfig, findings: &mut Vec<AnomalyFinding>) {
    let Some(total) = record.total else { return };

    if total >= config.round_number_min
        && total > Decimal::ZERO
        && (total % Decimal::ONE_HUNDRED).is_zero()
    {
        findings.push(AnomalyFinding {
            kind: AnomalyKind::Rule,
            field: "total".to_string(),
            severity: AnomalySeverity::Low,
            score: total.to_f64().unwrap_or_default(),
            description: format!("total {total} is a suspiciously round number"),
        });
    }
}

fn duplicate_line_items(record: &InvoiceRecord, findings: &mut Vec<AnomalyFinding>) {
    // One finding per duplicate group, however many rows it has.
    let mut groups: BTreeMap<(String, Decimal, Decimal), usize> = BTreeMap::new();
    for item in &record.line_items {
        *groups
            .entry((
                item.description.to_lowercase(),
                item.quantity,
                item.unit_price,
            ))
            .or_insert(0) += 1;
    }

    for ((description, quantity, _), count) in groups {
        if count > 1 {
            findings.push(AnomalyFinding {
                kind: AnomalyKind::Rule,
                field: "line_items".to_string(),
                severity: AnomalySeverity::Medium,
                score: count as f64,
                description: format!(
                    "line item '{description}' (quantity {quantity}) appears {count} times"
                ),
            });
        }
    }
}

fn hard_vat_bound(record: &InvoiceRecord, config: &AnomalyConfig, findings: &mut Vec<AnomalyFinding>) {
    let Some(rate) = record.vat_rate() else { return };

    if rate < config.hard_min_vat_rate || rate > config.hard_max_vat_rate {
        let percent = rate * Decimal::ONE_HUNDRED;
        findings.push(AnomalyFinding {
            kind: AnomalyKind::Rule,
            field: "vat".to_string(),
            severity: AnomalySeverity::High,
            score: rate.to_f64().unwrap_or_default(),
            description: format!("VAT rate {percent:.1}% is outside the hard bounds"),
        });
    }
}

fn missing_identity(record: &InvoiceRecord, findings: &mut Vec<AnomalyFinding>) {
    // Monetary triple present but identity fields absent: likely an
    // extraction failure masquerading as a valid record.
    let amounts_complete =
        record.subtotal.is_some() && record.vat.is_some() && record.total.is_some();
    if !amounts_complete {
        return;
    }

    if record.supplier.is_none() {
        findings.push(AnomalyFinding {
            kind: AnomalyKind::Rule,
            field: "supplier".to_string(),
            severity: AnomalySeverity::Medium,
            score: 0.0,
            description: "supplier is missing from an otherwise complete record".to_string(),
        });
    }
    if record.invoice_number.is_none() {
        findings.push(AnomalyFinding {
            kind: AnomalyKind::Rule,
            field: "invoice_number".to_string(),
            severity: AnomalySeverity::Medium,
            score: 0.0,
            description: "invoice number is missing from an otherwise complete record".to_string(),
        });
    }
}
