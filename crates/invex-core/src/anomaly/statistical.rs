//! Statistical scoring against the historical baseline.

use rust_decimal::prelude::ToPrimitive;

use crate::models::config::AnomalyConfig;
use crate::models::record::InvoiceRecord;
use crate::models::report::{AnomalyFinding, AnomalyKind, AnomalySeverity};

use super::baseline::{FieldStats, HistoricalBaseline, Metric};

/// Current values of the tracked metrics for one record.
pub(super) fn metric_values(record: &InvoiceRecord) -> Vec<(Metric, f64)> {
    let mut values = Vec::new();
    if let Some(total) = record.total.and_then(|d| d.to_f64()) {
        values.push((Metric::Total, total));
    }
    if let Some(rate) = record.vat_rate().and_then(|d| d.to_f64()) {
        values.push((Metric::VatRate, rate));
    }
    values
}

pub(super) fn detect(
    record: &InvoiceRecord,
    baseline: &HistoricalBaseline,
    config: &AnomalyConfig,
) -> Vec<AnomalyFinding> {
    let mut findings = Vec::new();
    for (metric, value) in metric_values(record) {
        if let Some(stats) = baseline.stats(metric) {
            score_metric(metric, value, stats, config, &mut findings);
        }
    }
    findings
}

fn score_metric(
    metric: Metric,
    value: f64,
    stats: &FieldStats,
    config: &AnomalyConfig,
    findings: &mut Vec<AnomalyFinding>,
) {
    // Z-score needs at least two historical samples.
    if stats.count() >= 2 {
        let stddev = stats.stddev().max(config.stddev_floor);
        let z = (value - stats.mean()) / stddev;
        if z.abs() >= config.z_threshold {
            let severity = if z.abs() >= config.z_threshold * config.high_severity_factor {
                AnomalySeverity::High
            } else {
                AnomalySeverity::Medium
            };
            findings.push(AnomalyFinding {
                kind: AnomalyKind::Statistical,
                field: metric.as_str().to_string(),
                severity,
                score: z,
                description: format!(
                    "{} {value:.2} deviates from the historical mean {:.2} (z = {z:.2})",
                    metric.as_str(),
                    stats.mean()
                ),
            });
        }
    }

    // IQR fences need a few window samples.
    if stats.window_len() >= 4 {
        let (Some(q1), Some(q3)) = (stats.quantile(0.25), stats.quantile(0.75)) else {
            return;
        };
        let iqr = q3 - q1;
        let lower = q1 - config.iqr_multiplier * iqr;
        let upper = q3 + config.iqr_multiplier * iqr;

        if value < lower || value > upper {
            let distance = if value < lower { lower - value } else { value - upper };
            findings.push(AnomalyFinding {
                kind: AnomalyKind::Statistical,
                field: metric.as_str().to_string(),
                severity: AnomalySeverity::Medium,
                score: distance,
                description: format!(
                    "{} {value:.2} lies outside the interquartile fences [{lower:.2}, {upper:.2}]",
                    metric.as_str()
                ),
            });
        }
    }
}
