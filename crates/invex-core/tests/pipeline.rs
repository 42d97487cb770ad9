//! End-to-end pipeline tests over recognized invoice text.

use std::sync::{Arc, Mutex};

use rust_decimal::Decimal;

use invex_core::error::ExportError;
use invex_core::erp::{ErpAdapter, ErpConfig, GenericAdapter};
use invex_core::export::Exporter;
use invex_core::models::config::{BaselineUpdate, InvexConfig};
use invex_core::{AnomalyKind, InvoiceRecord, Pipeline, Stage};

const VALID_INVOICE: &str = "\
From: Acme Widgets Ltd.
Invoice Number: INV-2024-0042
Invoice Date: 2024-06-01

Widget assembly    5   $100.00   $500.00
Premium support    1   $700.00   $700.00

Subtotal: $1,200.00
VAT: $240.00
Total Due: $1,440.00
";

struct RecordingExporter {
    exported: Arc<Mutex<Vec<InvoiceRecord>>>,
}

impl Exporter for RecordingExporter {
    fn export(&self, record: &InvoiceRecord) -> Result<(), ExportError> {
        self.exported.lock().unwrap().push(record.clone());
        Ok(())
    }
}

struct FailingExporter;

impl Exporter for FailingExporter {
    fn export(&self, _record: &InvoiceRecord) -> Result<(), ExportError> {
        Err(ExportError::UnsupportedFormat("parquet".to_string()))
    }
}

#[test]
fn full_pipeline_on_consistent_invoice() {
    let pipeline = Pipeline::new(InvexConfig::default());
    let result = pipeline.process(VALID_INVOICE);

    assert!(result.success, "issues: {:?}", result.validation_issues);
    assert!(!result.is_fatal());
    assert_eq!(result.stage_reached, Stage::Completed);

    let record = result.record.unwrap();
    assert_eq!(record.invoice_number.as_deref(), Some("INV-2024-0042"));
    assert_eq!(record.supplier.as_deref(), Some("Acme Widgets Ltd."));
    assert_eq!(record.subtotal, Some(Decimal::from(1200)));
    assert_eq!(record.vat, Some(Decimal::from(240)));
    assert_eq!(record.total, Some(Decimal::from(1440)));
    assert_eq!(record.line_items.len(), 2);
    assert!(record.meta.processing_time_ms.is_some());
}

#[test]
fn repeated_runs_are_deterministic_modulo_baseline_drift() {
    let pipeline = Pipeline::new(InvexConfig::default());

    let first = pipeline.process(VALID_INVOICE);
    let second = pipeline.process(VALID_INVOICE);

    assert_eq!(first.validation_issues, second.validation_issues);
    assert_eq!(first.record, {
        let mut r = second.record.clone().unwrap();
        r.meta.processing_time_ms = first.record.as_ref().unwrap().meta.processing_time_ms;
        Some(r)
    });

    // Rule-based findings do not depend on history.
    let rules = |result: &invex_core::PipelineResult| {
        result
            .anomalies
            .iter()
            .filter(|f| f.kind == AnomalyKind::Rule)
            .cloned()
            .collect::<Vec<_>>()
    };
    assert_eq!(rules(&first), rules(&second));
}

#[test]
fn batch_isolates_fatal_failures() {
    let pipeline = Pipeline::new(InvexConfig::default());
    let inputs = [
        VALID_INVOICE,
        VALID_INVOICE,
        "", // unreadable input: fatal for this invoice only
        VALID_INVOICE,
        VALID_INVOICE,
    ];

    let summary = pipeline.process_batch(&inputs);

    assert_eq!(summary.total, 5);
    assert_eq!(summary.successful, 4);
    assert_eq!(summary.failed, 1);
    assert!(summary.results[2].is_fatal());
    for i in [0, 1, 3, 4] {
        assert!(summary.results[i].success, "invoice {i} should succeed");
    }
}

#[test]
fn batch_updates_shared_baseline() {
    let pipeline = Pipeline::new(InvexConfig::default());
    let inputs = [VALID_INVOICE, VALID_INVOICE, VALID_INVOICE];
    pipeline.process_batch(&inputs);

    let baseline = pipeline.baseline();
    let guard = baseline.lock().unwrap();
    let stats = guard.stats(invex_core::anomaly::Metric::Total).unwrap();
    assert_eq!(stats.count(), 3);
    assert_eq!(stats.mean(), 1440.0);
}

#[test]
fn exporter_receives_successful_records() {
    let exported = Arc::new(Mutex::new(Vec::new()));
    let pipeline = Pipeline::new(InvexConfig::default()).with_exporter(Box::new(
        RecordingExporter {
            exported: Arc::clone(&exported),
        },
    ));

    let result = pipeline.process(VALID_INVOICE);
    assert!(result.success);
    assert!(result.delivery_failures.is_empty());
    assert_eq!(exported.lock().unwrap().len(), 1);
}

#[test]
fn export_is_skipped_when_criteria_fail() {
    let exported = Arc::new(Mutex::new(Vec::new()));
    let pipeline = Pipeline::new(InvexConfig::default()).with_exporter(Box::new(
        RecordingExporter {
            exported: Arc::clone(&exported),
        },
    ));

    // Missing required fields: run completes but is not successful.
    let result = pipeline.process("Total: $100.00");
    assert!(!result.success);
    assert!(!result.is_fatal());
    assert!(exported.lock().unwrap().is_empty());
}

#[test]
fn export_failure_is_recorded_not_raised() {
    let pipeline = Pipeline::new(InvexConfig::default()).with_exporter(Box::new(FailingExporter));

    let result = pipeline.process(VALID_INVOICE);
    assert!(result.success, "delivery failures must not fail the run");
    assert_eq!(result.delivery_failures.len(), 1);
    assert!(result.delivery_failures[0].message.contains("parquet"));
}

#[test]
fn erp_push_failure_is_recorded_not_raised() {
    // Adapter never connected: every push is refused.
    let adapter = GenericAdapter::new("Test");
    let pipeline = Pipeline::new(InvexConfig::default()).with_erp_adapter(Box::new(adapter));

    let result = pipeline.process(VALID_INVOICE);
    assert!(result.success);
    assert_eq!(result.delivery_failures.len(), 1);
    assert!(result.delivery_failures[0].message.contains("not connected"));
}

#[test]
fn erp_push_succeeds_when_connected() {
    let mut adapter = GenericAdapter::new("Test");
    adapter
        .connect(&ErpConfig {
            endpoint: "https://erp.example.com".to_string(),
            api_key: "key".to_string(),
            company_code: None,
        })
        .unwrap();
    let pipeline = Pipeline::new(InvexConfig::default()).with_erp_adapter(Box::new(adapter));

    let result = pipeline.process(VALID_INVOICE);
    assert!(result.success);
    assert!(result.delivery_failures.is_empty());
}

#[test]
fn records_with_validation_errors_do_not_update_baseline() {
    let pipeline = Pipeline::new(InvexConfig::default());

    // Missing required fields: scored, but never folded in.
    let result = pipeline.process("Total: $100.00");
    assert!(result.error_count() > 0);

    let baseline = pipeline.baseline();
    let guard = baseline.lock().unwrap();
    assert!(guard.stats(invex_core::anomaly::Metric::Total).is_none());
}

#[test]
fn disabled_detector_yields_no_findings() {
    let mut config = InvexConfig::default();
    config.anomaly.enabled = false;
    let pipeline = Pipeline::new(config);

    let result = pipeline.process(VALID_INVOICE);
    assert!(result.anomalies.is_empty());
    assert_eq!(result.stage_reached, Stage::Completed);
}

#[test]
fn exclude_anomalous_policy_holds_across_runs() {
    let mut config = InvexConfig::default();
    config.anomaly.baseline_update = BaselineUpdate::ExcludeAnomalous;
    let pipeline = Pipeline::new(config);

    // Build up a stable history.
    for _ in 0..5 {
        pipeline.process(VALID_INVOICE);
    }
    let baseline = pipeline.baseline();
    let before = baseline
        .lock()
        .unwrap()
        .stats(invex_core::anomaly::Metric::Total)
        .unwrap()
        .count();

    // A consistent but wildly different invoice is flagged and
    // excluded from the fold.
    let outlier = VALID_INVOICE
        .replace("Subtotal: $1,200.00", "Subtotal: $825,000.00")
        .replace("VAT: $240.00", "VAT: $165,000.00")
        .replace("Total Due: $1,440.00", "Total Due: $990,000.00");
    let result = pipeline.process(&outlier);
    assert!(
        result
            .anomalies
            .iter()
            .any(|f| f.kind == AnomalyKind::Statistical)
    );

    let after = baseline
        .lock()
        .unwrap()
        .stats(invex_core::anomaly::Metric::Total)
        .unwrap()
        .count();
    assert_eq!(before, after);
}
