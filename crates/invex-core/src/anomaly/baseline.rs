//! Historical baseline: append-only running statistics per tracked
//! metric, plus a bounded sample window for quantile estimation.

use std::collections::{HashMap, VecDeque};

/// Metric tracked by the statistical detector.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Metric {
    /// Gross invoice total.
    Total,
    /// Effective VAT rate (vat / subtotal).
    VatRate,
}

impl Metric {
    pub fn as_str(&self) -> &'static str {
        match self {
            Metric::Total => "total",
            Metric::VatRate => "vat_rate",
        }
    }
}

/// Running statistics for one metric.
///
/// The count/mean/variance accumulators cover the whole history and are
/// never rolled back; only the quantile window evicts (oldest first)
/// once it reaches capacity.
#[derive(Debug, Clone)]
pub struct FieldStats {
    count: u64,
    mean: f64,
    m2: f64,
    window: VecDeque<f64>,
    cap: usize,
}

impl FieldStats {
    fn new(cap: usize) -> Self {
        Self {
            count: 0,
            mean: 0.0,
            m2: 0.0,
            window: VecDeque::with_capacity(cap),
            cap,
        }
    }

    /// Fold one observation in (Welford update).
    pub fn observe(&mut self, value: f64) {
        self.count += 1;
        let delta = value - self.mean;
        self.mean += delta / self.count as f64;
        self.m2 += delta * (value - self.mean);

        if self.window.len() == self.cap {
            self.window.pop_front();
        }
        self.window.push_back(value);
    }

    pub fn count(&self) -> u64 {
        self.count
    }

    pub fn mean(&self) -> f64 {
        self.mean
    }

    /// Population standard deviation over the full history.
    pub fn stddev(&self) -> f64 {
        if self.count == 0 {
            0.0
        } else {
            (self.m2 / self.count as f64).sqrt()
        }
    }

    pub fn window_len(&self) -> usize {
        self.window.len()
    }

    /// Linearly interpolated quantile over the sample window.
    pub fn quantile(&self, q: f64) -> Option<f64> {
        if self.window.is_empty() {
            return None;
        }

        let mut sorted: Vec<f64> = self.window.iter().copied().collect();
        sorted.sort_by(f64::total_cmp);

        let pos = q.clamp(0.0, 1.0) * (sorted.len() - 1) as f64;
        let lo = pos.floor() as usize;
        let hi = pos.ceil() as usize;
        if lo == hi {
            Some(sorted[lo])
        } else {
            let frac = pos - lo as f64;
            Some(sorted[lo] + (sorted[hi] - sorted[lo]) * frac)
        }
    }
}

/// Per-metric history shared by all pipeline runs.
///
/// Created empty at detector initialization and never rolled back;
/// `reset` starts a fresh history. Callers share it behind a mutex so
/// the score-then-update sequence stays consistent with a global
/// ordering of processed invoices.
#[derive(Debug)]
pub struct HistoricalBaseline {
    cap: usize,
    metrics: HashMap<Metric, FieldStats>,
}

impl HistoricalBaseline {
    pub fn new(window: usize) -> Self {
        Self {
            cap: window.max(1),
            metrics: HashMap::new(),
        }
    }

    pub fn observe(&mut self, metric: Metric, value: f64) {
        self.metrics
            .entry(metric)
            .or_insert_with(|| FieldStats::new(self.cap))
            .observe(value);
    }

    pub fn stats(&self, metric: Metric) -> Option<&FieldStats> {
        self.metrics.get(&metric)
    }

    pub fn reset(&mut self) {
        self.metrics.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_welford_mean_and_stddev() {
        let mut stats = FieldStats::new(16);
        stats.observe(90.0);
        stats.observe(110.0);
        assert_eq!(stats.mean(), 100.0);
        assert_eq!(stats.stddev(), 10.0);
        assert_eq!(stats.count(), 2);
    }

    #[test]
    fn test_window_eviction_keeps_moments() {
        let mut stats = FieldStats::new(4);
        for v in [1.0, 2.0, 3.0, 4.0, 5.0, 6.0] {
            stats.observe(v);
        }
        // Window holds the newest four samples; moments keep counting.
        assert_eq!(stats.window_len(), 4);
        assert_eq!(stats.count(), 6);
        assert_eq!(stats.mean(), 3.5);
        assert_eq!(stats.quantile(0.0), Some(3.0));
        assert_eq!(stats.quantile(1.0), Some(6.0));
    }

    #[test]
    fn test_interpolated_quantiles() {
        let mut stats = FieldStats::new(16);
        for v in [1.0, 2.0, 3.0, 4.0] {
            stats.observe(v);
        }
        assert_eq!(stats.quantile(0.25), Some(1.75));
        assert_eq!(stats.quantile(0.5), Some(2.5));
        assert_eq!(stats.quantile(0.75), Some(3.25));
    }

    #[test]
    fn test_empty_quantile() {
        let stats = FieldStats::new(16);
        assert_eq!(stats.quantile(0.5), None);
    }

    #[test]
    fn test_baseline_lifecycle() {
        let mut baseline = HistoricalBaseline::new(8);
        assert!(baseline.stats(Metric::Total).is_none());

        baseline.observe(Metric::Total, 100.0);
        baseline.observe(Metric::VatRate, 0.2);
        assert_eq!(baseline.stats(Metric::Total).unwrap().count(), 1);

        baseline.reset();
        assert!(baseline.stats(Metric::Total).is_none());
    }
}
