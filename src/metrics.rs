//! In-process request metrics.
//!
//! Named counters and latency samples, summarized on demand for the
//! `/metrics` endpoint.

use serde::Serialize;
use std::collections::{BTreeMap, HashMap};
use std::sync::{Mutex, PoisonError};

/// Thread-safe registry of named counters and latency histograms.
#[derive(Debug, Default)]
pub struct Metrics {
    counters: Mutex<HashMap<String, u64>>,
    histograms: Mutex<HashMap<String, Vec<f64>>>,
}

impl Metrics {
    pub fn new() -> Self {
        Self::default()
    }

    /// Increment a counter by one.
    pub fn inc_counter(&self, name: &str) {
        let mut counters = self.counters.lock().unwrap_or_else(PoisonError::into_inner);
        *counters.entry(name.to_string()).or_insert(0) += 1;
    }

    /// Record a latency sample in milliseconds.
    pub fn observe(&self, name: &str, ms: f64) {
        let mut histograms = self.histograms.lock().unwrap_or_else(PoisonError::into_inner);
        histograms.entry(name.to_string()).or_default().push(ms);
    }

    /// Point-in-time copy of every counter and histogram summary.
    pub fn snapshot(&self) -> MetricsSnapshot {
        let counters = self
            .counters
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .map(|(name, value)| (name.clone(), *value))
            .collect();

        let histograms = self
            .histograms
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .map(|(name, values)| (name.clone(), LatencySummary::from_values(values)))
            .collect();

        MetricsSnapshot { counters, histograms }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct MetricsSnapshot {
    pub counters: BTreeMap<String, u64>,
    pub histograms: BTreeMap<String, LatencySummary>,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct LatencySummary {
    pub count: u64,
    pub p50: f64,
    pub p95: f64,
    pub max: f64,
}

impl LatencySummary {
    /// Summarize samples. An empty slice yields all zeros.
    pub fn from_values(values: &[f64]) -> Self {
        if values.is_empty() {
            return Self {
                count: 0,
                p50: 0.0,
                p95: 0.0,
                max: 0.0,
            };
        }

        let mut sorted = values.to_vec();
        sorted.sort_by(|a, b| a.total_cmp(b));

        Self {
            count: sorted.len() as u64,
            p50: nearest_rank(&sorted, 0.50),
            p95: nearest_rank(&sorted, 0.95),
            max: sorted[sorted.len() - 1],
        }
    }
}

// Nearest-rank percentile over a sorted, non-empty slice.
fn nearest_rank(sorted: &[f64], p: f64) -> f64 {
    let rank = (p * sorted.len() as f64) as usize;
    sorted[rank.saturating_sub(1).min(sorted.len() - 1)]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_counters_accumulate_per_name() {
        let metrics = Metrics::new();
        metrics.inc_counter("requests_total:/health");
        metrics.inc_counter("requests_total:/health");
        metrics.inc_counter("requests_total:/api/sources");

        let snapshot = metrics.snapshot();
        assert_eq!(snapshot.counters["requests_total:/health"], 2);
        assert_eq!(snapshot.counters["requests_total:/api/sources"], 1);
        assert!(snapshot.histograms.is_empty());
    }

    #[test]
    fn test_summary_percentiles() {
        let values: Vec<f64> = (1..=10).rev().map(f64::from).collect();
        let summary = LatencySummary::from_values(&values);

        assert_eq!(summary.count, 10);
        assert_eq!(summary.p50, 5.0);
        assert_eq!(summary.p95, 9.0);
        assert_eq!(summary.max, 10.0);
    }

    #[test]
    fn test_summary_of_single_and_empty() {
        let single = LatencySummary::from_values(&[42.5]);
        assert_eq!(single.count, 1);
        assert_eq!(single.p50, 42.5);
        assert_eq!(single.p95, 42.5);
        assert_eq!(single.max, 42.5);

        let empty = LatencySummary::from_values(&[]);
        assert_eq!(empty.count, 0);
        assert_eq!(empty.max, 0.0);
    }

    #[test]
    fn test_snapshot_serializes_nested_shape() {
        let metrics = Metrics::new();
        metrics.inc_counter("requests_total:/health");
        metrics.observe("latency_ms:/health", 3.0);

        let json = serde_json::to_value(metrics.snapshot()).unwrap();
        assert_eq!(json["counters"]["requests_total:/health"], 1);
        assert_eq!(json["histograms"]["latency_ms:/health"]["count"], 1);
        assert_eq!(json["histograms"]["latency_ms:/health"]["p95"], 3.0);
    }
}
