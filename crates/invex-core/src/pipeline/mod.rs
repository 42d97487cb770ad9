//! Stage-ordered pipeline orchestrator.
//!
//! One run walks Started -> Extracted -> Validated -> AnomalyChecked ->
//! (Exported) -> Completed. Only infrastructure failures (no text, zero
//! candidates) are fatal; validation issues and anomaly findings are
//! accumulated and the run always yields a [`PipelineResult`].

use std::sync::{Arc, Mutex};
use std::thread;
use std::time::Instant;

use tracing::{debug, info, warn};

use crate::anomaly::{AnomalyDetector, HistoricalBaseline};
use crate::erp::ErpAdapter;
use crate::export::Exporter;
use crate::extract::FieldExtractor;
use crate::models::config::{InvexConfig, SuccessCriteria};
use crate::models::report::{
    BatchSummary, DeliveryFailure, DeliveryTarget, PipelineResult, Severity, Stage,
    ValidationIssue,
};
use crate::validate::Validator;

/// Sequences extraction, validation, anomaly detection and the optional
/// export/ERP handoff over recognized invoice text.
pub struct Pipeline {
    config: InvexConfig,
    extractor: FieldExtractor,
    validator: Validator,
    detector: AnomalyDetector,
    baseline: Arc<Mutex<HistoricalBaseline>>,
    exporter: Option<Box<dyn Exporter + Send + Sync>>,
    erp: Option<Mutex<Box<dyn ErpAdapter + Send>>>,
}

impl Pipeline {
    pub fn new(config: InvexConfig) -> Self {
        let extractor = FieldExtractor::new(config.extraction.clone());
        let validator = Validator::new(config.validation.clone());
        let detector = AnomalyDetector::new(config.anomaly.clone());
        let baseline = Arc::new(Mutex::new(HistoricalBaseline::new(
            config.anomaly.window_size,
        )));
        info!("invoice pipeline initialized");
        Self {
            config,
            extractor,
            validator,
            detector,
            baseline,
            exporter: None,
            erp: None,
        }
    }

    /// Attach an export collaborator. It receives a read-only view of
    /// each record that met the success criteria.
    pub fn with_exporter(mut self, exporter: Box<dyn Exporter + Send + Sync>) -> Self {
        self.exporter = Some(exporter);
        self
    }

    /// Attach an ERP adapter, invoked under the same gating as export.
    pub fn with_erp_adapter(mut self, adapter: Box<dyn ErpAdapter + Send>) -> Self {
        self.erp = Some(Mutex::new(adapter));
        self
    }

    /// Handle to the shared historical baseline.
    pub fn baseline(&self) -> Arc<Mutex<HistoricalBaseline>> {
        Arc::clone(&self.baseline)
    }

    /// Process one invoice text through every stage. Fatal conditions
    /// are captured in the result, never raised to the caller.
    pub fn process(&self, raw_text: &str) -> PipelineResult {
        let start = Instant::now();

        if raw_text.trim().is_empty() {
            warn!("no recognized text supplied");
            return PipelineResult::failed(Stage::Started, "extraction failed: no recognized text");
        }

        let extraction = self.extractor.extract(raw_text);
        if extraction.candidates.is_empty() {
            warn!("extractor produced zero candidates");
            return PipelineResult::failed(
                Stage::Started,
                "extraction failed: no recognizable invoice fields",
            );
        }
        let mut record = self.extractor.resolve(extraction);
        debug!("stage reached: {}", Stage::Extracted);

        let validation_issues = self.validator.validate(&record);
        debug!("stage reached: {}", Stage::Validated);

        let anomalies = if self.config.anomaly.enabled {
            let has_errors = validation_issues
                .iter()
                .any(|i| i.severity == Severity::Error);
            if has_errors {
                // Invoices that failed validation are scored but never
                // folded into the baseline.
                let guard = match self.baseline.lock() {
                    Ok(guard) => guard,
                    Err(poisoned) => poisoned.into_inner(),
                };
                self.detector.detect(&record, &guard)
            } else {
                self.detector.detect_and_update(&record, &self.baseline)
            }
        } else {
            Vec::new()
        };
        debug!("stage reached: {}", Stage::AnomalyChecked);

        let success = self.meets_success_criteria(&validation_issues);

        let mut delivery_failures = Vec::new();
        if success {
            if let Some(exporter) = &self.exporter {
                if let Err(e) = exporter.export(&record) {
                    warn!("export failed: {e}");
                    delivery_failures.push(DeliveryFailure {
                        target: DeliveryTarget::Export,
                        message: e.to_string(),
                    });
                }
            }
            if let Some(erp) = &self.erp {
                let mut adapter = match erp.lock() {
                    Ok(guard) => guard,
                    Err(poisoned) => poisoned.into_inner(),
                };
                match adapter.push(&record) {
                    Ok(outcome) => debug!("pushed to ERP as {}", outcome.reference),
                    Err(e) => {
                        warn!("ERP push failed: {e}");
                        delivery_failures.push(DeliveryFailure {
                            target: DeliveryTarget::Erp,
                            message: e.to_string(),
                        });
                    }
                }
            }
        }

        record.meta.processing_time_ms = Some(start.elapsed().as_millis() as u64);
        info!(
            "invoice processed: success={success} issues={} anomalies={}",
            validation_issues.len(),
            anomalies.len()
        );

        PipelineResult {
            success,
            record: Some(record),
            validation_issues,
            anomalies,
            delivery_failures,
            stage_reached: Stage::Completed,
            error: None,
        }
    }

    /// Process a batch, one worker per invoice. Results keep input
    /// order, and one input's failure cannot affect another's result.
    pub fn process_batch<S>(&self, inputs: &[S]) -> BatchSummary
    where
        S: AsRef<str> + Sync,
    {
        info!("processing batch of {} invoices", inputs.len());

        let results: Vec<PipelineResult> = thread::scope(|scope| {
            let handles: Vec<_> = inputs
                .iter()
                .map(|input| scope.spawn(move || self.process(input.as_ref())))
                .collect();
            handles
                .into_iter()
                .map(|handle| {
                    handle.join().unwrap_or_else(|_| {
                        PipelineResult::failed(Stage::Started, "pipeline worker panicked")
                    })
                })
                .collect()
        });

        let successful = results.iter().filter(|r| r.success).count();
        let summary = BatchSummary {
            total: results.len(),
            successful,
            failed: results.len() - successful,
            results,
        };
        info!(
            "batch completed: {}/{} successful",
            summary.successful, summary.total
        );
        summary
    }

    fn meets_success_criteria(&self, issues: &[ValidationIssue]) -> bool {
        match self.config.pipeline.success {
            SuccessCriteria::NoErrors => issues.iter().all(|i| i.severity != Severity::Error),
            SuccessCriteria::NoIssues => issues.is_empty(),
            SuccessCriteria::FatalOnly => true,
        }
    }
}
