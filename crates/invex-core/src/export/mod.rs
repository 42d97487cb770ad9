//! Read-only export views over resolved records, plus the exporter
//! capability contract. Concrete format writers live with the callers.

use std::collections::BTreeMap;

use crate::error::ExportError;
use crate::models::record::InvoiceRecord;

/// Capability contract for export collaborators. Implementations
/// receive a read-only view of the record.
pub trait Exporter {
    fn export(&self, record: &InvoiceRecord) -> Result<(), ExportError>;
}

/// Flattened key/value view for tabular formats. Line items are
/// summarized by count; use [`line_item_rows`] for the rows themselves.
pub fn flatten(record: &InvoiceRecord) -> BTreeMap<String, String> {
    let mut flat = BTreeMap::new();

    if let Some(v) = &record.invoice_number {
        flat.insert("invoice_number".to_string(), v.clone());
    }
    if let Some(v) = record.invoice_date {
        flat.insert("invoice_date".to_string(), v.to_string());
    }
    if let Some(v) = &record.supplier {
        flat.insert("supplier".to_string(), v.clone());
    }
    if let Some(v) = record.subtotal {
        flat.insert("subtotal".to_string(), v.to_string());
    }
    if let Some(v) = record.vat {
        flat.insert("vat".to_string(), v.to_string());
    }
    if let Some(v) = record.total {
        flat.insert("total".to_string(), v.to_string());
    }

    flat.insert(
        "line_items_count".to_string(),
        record.line_items.len().to_string(),
    );
    for (field, confidence) in &record.meta.field_confidence {
        flat.insert(format!("confidence_{field}"), format!("{confidence:.2}"));
    }

    flat
}

/// Line items as ordered description/quantity/unit price/line total
/// rows, for formats that denormalize them.
pub fn line_item_rows(record: &InvoiceRecord) -> Vec<[String; 4]> {
    record
        .line_items
        .iter()
        .map(|item| {
            [
                item.description.clone(),
                item.quantity.to_string(),
                item.unit_price.to_string(),
                item.line_total.to_string(),
            ]
        })
        .collect()
}

/// Nested structure for hierarchical formats.
pub fn to_nested(record: &InvoiceRecord) -> Result<serde_json::Value, ExportError> {
    Ok(serde_json::to_value(record)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::record::{FieldName, LineItem};
    use rust_decimal::Decimal;

    fn sample_record() -> InvoiceRecord {
        let mut record = InvoiceRecord {
            invoice_number: Some("INV-1".to_string()),
            supplier: Some("Acme Ltd.".to_string()),
            total: Some(Decimal::from(120)),
            line_items: vec![LineItem {
                description: "Widget".to_string(),
                quantity: Decimal::from(2),
                unit_price: Decimal::from(60),
                line_total: Decimal::from(120),
            }],
            ..Default::default()
        };
        record.meta.field_confidence.insert(FieldName::Total, 0.9);
        record
    }

    #[test]
    fn test_flatten() {
        let flat = flatten(&sample_record());
        assert_eq!(flat.get("invoice_number").map(String::as_str), Some("INV-1"));
        assert_eq!(flat.get("line_items_count").map(String::as_str), Some("1"));
        assert_eq!(flat.get("confidence_total").map(String::as_str), Some("0.90"));
        // Absent fields stay absent rather than defaulting.
        assert!(!flat.contains_key("subtotal"));
    }

    #[test]
    fn test_line_item_rows() {
        let rows = line_item_rows(&sample_record());
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0][0], "Widget");
        assert_eq!(rows[0][1], "2");
    }

    #[test]
    fn test_nested_round_trips() {
        let nested = to_nested(&sample_record()).unwrap();
        assert_eq!(nested["invoice_number"], "INV-1");
        assert_eq!(nested["line_items"][0]["description"], "Widget");
    }
}
