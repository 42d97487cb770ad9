//! Labeled regex patterns for invoice field extraction.

use lazy_static::lazy_static;
use regex::Regex;

lazy_static! {
    // Invoice number
    pub static ref INVOICE_NUMBER_LABELED: Regex = Regex::new(
        r"(?i)(?:invoice\s*(?:number|no\.?|#)|inv\.?\s*#)\s*:?\s*([A-Za-z0-9][A-Za-z0-9/_\-]*)"
    ).unwrap();

    pub static ref INVOICE_NUMBER_LOOSE: Regex = Regex::new(
        r"\b(INV[-/]?[0-9][A-Z0-9/\-]*)\b"
    ).unwrap();

    // Dates. The labeled pattern captures the rest of the line; the
    // shape patterns pull the actual date out of it.
    pub static ref DATE_LABELED: Regex = Regex::new(
        r"(?im)(?:invoice\s+date|date\s+of\s+issue|issue\s+date|dated?)\s*:?\s*(.+)$"
    ).unwrap();

    pub static ref DATE_LOOSE: Regex = Regex::new(
        r"\b(\d{4}[/.\-]\d{1,2}[/.\-]\d{1,2}|\d{1,2}[/.\-]\d{1,2}[/.\-]\d{2,4})\b"
    ).unwrap();

    pub static ref DATE_ISO: Regex = Regex::new(
        r"\b(\d{4})[/.\-](\d{1,2})[/.\-](\d{1,2})\b"
    ).unwrap();

    pub static ref DATE_NUMERIC: Regex = Regex::new(
        r"\b(\d{1,2})[/.\-](\d{1,2})[/.\-](\d{2,4})\b"
    ).unwrap();

    pub static ref DATE_MONTH_NAME: Regex = Regex::new(
        r"(?i)\b(\d{1,2})\s+(jan|feb|mar|apr|may|jun|jul|aug|sep|oct|nov|dec)[a-z]*\.?,?\s+(\d{2,4})\b"
    ).unwrap();

    // Supplier
    pub static ref SUPPLIER_LABELED: Regex = Regex::new(
        r"(?im)^(?:from|vendor|supplier|sold\s+by|bill\s+from)\s*:?\s*([A-Za-z][^\n]*?)\s*$"
    ).unwrap();

    // Amounts. "1,234.56", "1 234,56" and bare integers all match; the
    // numeric parser decides what they mean.
    pub static ref TOTAL_LABELED: Regex = Regex::new(
        r"(?i)\b(?:grand\s+total|total\s+due|amount\s+due|balance\s+due)\s*:?\s*(?:USD|EUR|GBP)?\s*[$€£]?\s*(\d[\d .,\u{00a0}]*\d|\d)"
    ).unwrap();

    pub static ref TOTAL_LOOSE: Regex = Regex::new(
        r"(?i)\btotal\s*:?\s*(?:USD|EUR|GBP)?\s*[$€£]?\s*(\d[\d .,\u{00a0}]*\d|\d)"
    ).unwrap();

    pub static ref VAT_LABELED: Regex = Regex::new(
        r"(?i)\b(?:vat|sales\s+tax|tax)\s*:\s*[$€£]?\s*(\d[\d .,\u{00a0}]*\d|\d)"
    ).unwrap();

    pub static ref VAT_LOOSE: Regex = Regex::new(
        r"(?i)\b(?:vat|tax)\b[^\n:]*:\s*[$€£]?\s*(\d[\d .,\u{00a0}]*\d|\d)"
    ).unwrap();

    pub static ref SUBTOTAL_LABELED: Regex = Regex::new(
        r"(?i)\bsub[\s\-]?total\s*:?\s*[$€£]?\s*(\d[\d .,\u{00a0}]*\d|\d)"
    ).unwrap();

    // Line item rows: description, quantity, unit price, line total.
    pub static ref LINE_ITEM: Regex = Regex::new(
        r"(?m)^\s*([A-Za-z][A-Za-z .,&'()/\-]*?)\s+(\d+(?:[.,]\d+)?)\s+[$€£]?(\d[\d,]*(?:\.\d+)?)\s+[$€£]?(\d[\d,]*(?:\.\d+)?)\s*$"
    ).unwrap();

    // Rows with a description but only two numeric columns: tabular in
    // shape, but missing a sub-field.
    pub static ref LINE_ITEM_PROBE: Regex = Regex::new(
        r"(?m)^\s*([A-Za-z][A-Za-z .,&'()/\-]*?)\s+\d+(?:[.,]\d+)?\s+[$€£]?\d[\d,]*(?:\.\d+)?\s*$"
    ).unwrap();

    // Entity shapes for the NER fallback
    pub static ref ORG_NAME: Regex = Regex::new(
        r"(?m)^\s*([A-Z][A-Za-z0-9&.,' \-]+?\s(?:Inc\.?|LLC|Ltd\.?|Corp\.?|Co\.|GmbH|S\.A\.|Limited|Company))\s*$"
    ).unwrap();

    pub static ref MONEY_ENTITY: Regex = Regex::new(
        r"[$€£]\s?(\d[\d ,]*(?:\.\d{1,2})?)|(\d[\d ,]*\.\d{2})\s?(?:USD|EUR|GBP)\b"
    ).unwrap();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_invoice_number_labeled() {
        let caps = INVOICE_NUMBER_LABELED
            .captures("Invoice Number: INV-2024-001")
            .unwrap();
        assert_eq!(&caps[1], "INV-2024-001");

        let caps = INVOICE_NUMBER_LABELED.captures("Invoice #: A-17").unwrap();
        assert_eq!(&caps[1], "A-17");
    }

    #[test]
    fn test_total_does_not_match_subtotal() {
        let text = "Subtotal: 100.00";
        assert!(TOTAL_LOOSE.captures(text).is_none());
        assert!(SUBTOTAL_LABELED.captures(text).is_some());
    }

    #[test]
    fn test_total_labeled_variants() {
        for text in [
            "Grand Total: $1,230.00",
            "Amount Due: 1230.00",
            "Balance due  $1,230.00",
        ] {
            assert!(TOTAL_LABELED.captures(text).is_some(), "no match: {text}");
        }
    }

    #[test]
    fn test_vat_with_rate_annotation() {
        let caps = VAT_LOOSE.captures("VAT (20%): $220.00").unwrap();
        assert_eq!(&caps[1], "220.00");
    }

    #[test]
    fn test_line_item_row() {
        let caps = LINE_ITEM
            .captures("Consulting services    5   $100.00   $500.00")
            .unwrap();
        assert_eq!(caps[1].trim(), "Consulting services");
        assert_eq!(&caps[2], "5");
        assert_eq!(&caps[3], "100.00");
        assert_eq!(&caps[4], "500.00");
    }

    #[test]
    fn test_org_name_requires_legal_suffix() {
        assert!(ORG_NAME.captures("Acme Widgets Ltd.").is_some());
        assert!(ORG_NAME.captures("Random header line").is_none());
    }
}
