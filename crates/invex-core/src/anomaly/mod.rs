//! Anomaly detection: statistical scoring plus business heuristics.

pub mod baseline;
mod rules;
mod statistical;

pub use baseline::{FieldStats, HistoricalBaseline, Metric};

use std::sync::Mutex;

use tracing::debug;

use crate::models::config::{AnomalyConfig, BaselineUpdate};
use crate::models::record::InvoiceRecord;
use crate::models::report::{AnomalyFinding, AnomalyKind};

/// Scores records against the shared baseline and business rules.
/// Stateless apart from configuration; all history lives in the
/// explicitly passed baseline.
pub struct AnomalyDetector {
    config: AnomalyConfig,
}

impl AnomalyDetector {
    pub fn new(config: AnomalyConfig) -> Self {
        Self { config }
    }

    /// Pure scoring: statistical and rule findings, concatenated and
    /// never deduplicated.
    pub fn detect(
        &self,
        record: &InvoiceRecord,
        baseline: &HistoricalBaseline,
    ) -> Vec<AnomalyFinding> {
        let mut findings = statistical::detect(record, baseline, &self.config);
        findings.extend(rules::detect(record, &self.config));
        debug!("anomaly detection produced {} findings", findings.len());
        findings
    }

    /// Fold the record's metric values into the baseline.
    pub fn observe(&self, record: &InvoiceRecord, baseline: &mut HistoricalBaseline) {
        for (metric, value) in statistical::metric_values(record) {
            baseline.observe(metric, value);
        }
    }

    /// Score and update as one logically atomic step: the lock is held
    /// across both so concurrent runs see a history consistent with a
    /// global ordering of processed invoices.
    pub fn detect_and_update(
        &self,
        record: &InvoiceRecord,
        baseline: &Mutex<HistoricalBaseline>,
    ) -> Vec<AnomalyFinding> {
        let mut guard = match baseline.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };

        let findings = self.detect(record, &guard);

        let skip_update = self.config.baseline_update == BaselineUpdate::ExcludeAnomalous
            && findings.iter().any(|f| f.kind == AnomalyKind::Statistical);
        if skip_update {
            debug!("skipping baseline update for statistically anomalous invoice");
        } else {
            self.observe(record, &mut guard);
        }

        findings
    }
}
