//! Deterministic consistency rules over resolved invoice records.

use chrono::{Days, NaiveDate, Utc};
use rust_decimal::Decimal;
use tracing::debug;

use crate::models::config::ValidationConfig;
use crate::models::record::{FieldName, InvoiceRecord};
use crate::models::report::ValidationIssue;

/// Stateless rule engine. The strict/lenient flag is read once at
/// construction; no state is carried between invoices.
pub struct Validator {
    config: ValidationConfig,
}

impl Validator {
    pub fn new(config: ValidationConfig) -> Self {
        Self { config }
    }

    /// Run every rule against the record. Rules are independent; none
    /// short-circuits another. Values are reported, never corrected.
    pub fn validate(&self, record: &InvoiceRecord) -> Vec<ValidationIssue> {
        self.validate_at(record, Utc::now().date_naive())
    }

    fn validate_at(&self, record: &InvoiceRecord, today: NaiveDate) -> Vec<ValidationIssue> {
        let mut issues = Vec::new();

        self.check_required(record, &mut issues);
        self.check_numeric(record, &mut issues);
        self.check_vat_rate(record, &mut issues);
        self.check_date(record, today, &mut issues);
        self.check_arithmetic(record, &mut issues);
        self.check_line_items(record, &mut issues);

        if self.config.strict {
            issues = issues.into_iter().map(ValidationIssue::promoted).collect();
        }

        debug!("validation produced {} issues", issues.len());
        issues
    }

    fn check_required(&self, record: &InvoiceRecord, issues: &mut Vec<ValidationIssue>) {
        for field in &self.config.required_fields {
            if !record.has(*field) {
                issues.push(ValidationIssue::error(
                    "required_field",
                    field.as_str(),
                    format!("required field '{field}' is missing"),
                ));
            }
        }
    }

    fn check_numeric(&self, record: &InvoiceRecord, issues: &mut Vec<ValidationIssue>) {
        let amounts = [
            (FieldName::Subtotal, record.subtotal),
            (FieldName::Vat, record.vat),
            (FieldName::Total, record.total),
        ];

        for (field, value) in amounts {
            let Some(value) = value else { continue };
            if value < Decimal::ZERO {
                issues.push(ValidationIssue::error(
                    "numeric_range",
                    field.as_str(),
                    format!("'{field}' cannot be negative (got {value})"),
                ));
            } else if value >= self.config.max_amount {
                issues.push(ValidationIssue::error(
                    "numeric_range",
                    field.as_str(),
                    format!(
                        "'{field}' {value} exceeds the maximum magnitude {}",
                        self.config.max_amount
                    ),
                ));
            }
        }
    }

    fn check_vat_rate(&self, record: &InvoiceRecord, issues: &mut Vec<ValidationIssue>) {
        let Some(rate) = record.vat_rate() else { return };

        if rate < self.config.min_vat_rate || rate > self.config.max_vat_rate {
            let percent = rate * Decimal::ONE_HUNDRED;
            issues.push(ValidationIssue::warning(
                "vat_rate",
                "vat",
                format!(
                    "VAT rate {percent:.2}% outside the plausible range {:.0}%-{:.0}%",
                    self.config.min_vat_rate * Decimal::ONE_HUNDRED,
                    self.config.max_vat_rate * Decimal::ONE_HUNDRED
                ),
            ));
        }
    }

    fn check_date(
        &self,
        record: &InvoiceRecord,
        today: NaiveDate,
        issues: &mut Vec<ValidationIssue>,
    ) {
        let Some(date) = record.invoice_date else { return };

        let future_limit = today + Days::new(self.config.future_grace_days);
        if date > future_limit {
            issues.push(ValidationIssue::warning(
                "date_range",
                "invoice_date",
                format!("invoice date {date} is in the future"),
            ));
        } else if (today - date).num_days() > self.config.max_age_days {
            issues.push(ValidationIssue::warning(
                "date_range",
                "invoice_date",
                format!(
                    "invoice date {date} is older than {} days",
                    self.config.max_age_days
                ),
            ));
        }
    }

    fn check_arithmetic(&self, record: &InvoiceRecord, issues: &mut Vec<ValidationIssue>) {
        let (Some(subtotal), Some(vat), Some(total)) =
            (record.subtotal, record.vat, record.total)
        else {
            return;
        };

        if (subtotal + vat - total).abs() > self.config.amount_tolerance {
            issues.push(ValidationIssue::error(
                "arithmetic",
                "total",
                format!(
                    "subtotal ({subtotal}) + VAT ({vat}) = {} but total is {total}",
                    subtotal + vat
                ),
            ));
        }
    }

    fn check_line_items(&self, record: &InvoiceRecord, issues: &mut Vec<ValidationIssue>) {
        for (i, item) in record.line_items.iter().enumerate() {
            let expected = item.quantity * item.unit_price;
            if (expected - item.line_total).abs() > self.config.amount_tolerance {
                issues.push(ValidationIssue::warning(
                    "line_item_math",
                    format!("line_items[{i}]"),
                    format!(
                        "{} x {} = {expected} but line total is {}",
                        item.quantity, item.unit_price, item.line_total
                    ),
                ));
            }
        }

        if !record.line_items.is_empty() {
            if let Some(subtotal) = record.subtotal {
                let sum = record.line_total_sum();
                if (sum - subtotal).abs() > self.config.amount_tolerance {
                    issues.push(ValidationIssue::warning(
                        "line_item_sum",
                        "subtotal",
                        format!("line totals sum to {sum} but subtotal is {subtotal}"),
                    ));
                }
            }
        }
    }
}
