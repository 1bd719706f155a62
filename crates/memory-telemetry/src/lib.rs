// SPDX-License-Identifier: MIT OR Apache-2.0
//! Structured telemetry and metrics collection for the memory store.
#![deny(unsafe_code)]
#![warn(missing_docs)]

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::sync::{Arc, Mutex};

/// `tracing` target used by the write workflow (C5).
pub const TARGET_WRITE: &str = "memory.write";
/// `tracing` target used by the short-term layer (C6).
pub const TARGET_SHORTTERM: &str = "memory.shortterm";
/// `tracing` target used by the checkpoint engine (C7).
pub const TARGET_CHECKPOINT: &str = "memory.checkpoint";
/// `tracing` target used by the retrieval pipeline (C8).
pub const TARGET_RETRIEVAL: &str = "memory.retrieval";

/// Metrics captured for a single retrieval query.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct QueryMetrics {
    /// Query id assigned at admission.
    pub query_id: String,
    /// Search mode (`"semantic"`, `"keyword"`, or `"hybrid"`).
    pub search_type: String,
    /// Wall-clock duration in milliseconds.
    pub duration_ms: u64,
    /// Seed hits produced by stage 3.
    pub seeds_count: u64,
    /// Focus nodes lifted from seeds (stage 5).
    pub focus_nodes: u64,
    /// Distinct neighbor nodes reached by expansion (stage 6).
    pub expanded_nodes: u64,
    /// Sources in the assembled context (stage 7).
    pub sources_count: u64,
    /// Whether the query degraded to keyword-only search.
    pub degraded_to_keyword: bool,
    /// Error kind name, if the query failed (`memory_error::MemoryErrorKind`
    /// as a string, to avoid a dependency cycle).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error_kind: Option<String>,
}

/// Aggregated statistics across multiple queries.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct MetricsSummary {
    /// Number of queries recorded.
    pub count: usize,
    /// Mean duration in milliseconds.
    pub mean_duration_ms: f64,
    /// Median (p50) duration in milliseconds.
    pub p50_duration_ms: f64,
    /// 99th-percentile duration in milliseconds.
    pub p99_duration_ms: f64,
    /// Fraction of queries that degraded to keyword-only search.
    pub degraded_rate: f64,
    /// Fraction of queries that failed.
    pub error_rate: f64,
    /// Per-search-type query counts (deterministic ordering).
    pub search_type_counts: BTreeMap<String, usize>,
}

impl Default for MetricsSummary {
    fn default() -> Self {
        Self {
            count: 0,
            mean_duration_ms: 0.0,
            p50_duration_ms: 0.0,
            p99_duration_ms: 0.0,
            degraded_rate: 0.0,
            error_rate: 0.0,
            search_type_counts: BTreeMap::new(),
        }
    }
}

/// Compute a percentile value from a **sorted** slice.
fn percentile(sorted: &[u64], pct: f64) -> f64 {
    if sorted.is_empty() {
        return 0.0;
    }
    if sorted.len() == 1 {
        return sorted[0] as f64;
    }
    let rank = pct / 100.0 * (sorted.len() - 1) as f64;
    let lower = rank.floor() as usize;
    let upper = rank.ceil() as usize;
    let frac = rank - lower as f64;
    sorted[lower] as f64 * (1.0 - frac) + sorted[upper] as f64 * frac
}

/// Thread-safe collector for query metrics.
///
/// Wrap in an `Arc` to share across the retrieval pipeline's concurrent
/// queries (the inner storage is already behind a `Mutex`).
#[derive(Debug, Clone)]
pub struct MetricsCollector {
    inner: Arc<Mutex<Vec<QueryMetrics>>>,
}

impl Default for MetricsCollector {
    fn default() -> Self {
        Self::new()
    }
}

impl MetricsCollector {
    /// Create a new, empty collector.
    #[must_use]
    pub fn new() -> Self {
        Self {
            inner: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// Record a completed query's metrics.
    pub fn record(&self, metrics: QueryMetrics) {
        let mut data = self.inner.lock().expect("metrics lock poisoned");
        data.push(metrics);
    }

    /// Return all recorded query metrics.
    #[must_use]
    pub fn queries(&self) -> Vec<QueryMetrics> {
        let data = self.inner.lock().expect("metrics lock poisoned");
        data.clone()
    }

    /// Number of queries recorded so far.
    #[must_use]
    pub fn len(&self) -> usize {
        let data = self.inner.lock().expect("metrics lock poisoned");
        data.len()
    }

    /// Whether the collector has no recorded queries.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Compute an aggregated summary of all recorded queries.
    #[must_use]
    pub fn summary(&self) -> MetricsSummary {
        let data = self.inner.lock().expect("metrics lock poisoned");
        if data.is_empty() {
            return MetricsSummary::default();
        }

        let count = data.len();
        let mut durations: Vec<u64> = data.iter().map(|m| m.duration_ms).collect();
        durations.sort_unstable();

        let total_duration: u64 = durations.iter().sum();
        let mean_duration_ms = total_duration as f64 / count as f64;
        let p50_duration_ms = percentile(&durations, 50.0);
        let p99_duration_ms = percentile(&durations, 99.0);

        let degraded: u64 = data.iter().filter(|m| m.degraded_to_keyword).count() as u64;
        let degraded_rate = degraded as f64 / count as f64;

        let errors: u64 = data.iter().filter(|m| m.error_kind.is_some()).count() as u64;
        let error_rate = errors as f64 / count as f64;

        let mut search_type_counts: BTreeMap<String, usize> = BTreeMap::new();
        for m in data.iter() {
            *search_type_counts.entry(m.search_type.clone()).or_insert(0) += 1;
        }

        MetricsSummary {
            count,
            mean_duration_ms,
            p50_duration_ms,
            p99_duration_ms,
            degraded_rate,
            error_rate,
            search_type_counts,
        }
    }

    /// Clear all recorded metrics.
    pub fn clear(&self) {
        let mut data = self.inner.lock().expect("metrics lock poisoned");
        data.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn metrics(duration_ms: u64, degraded: bool, search_type: &str) -> QueryMetrics {
        QueryMetrics {
            query_id: "q1".to_string(),
            search_type: search_type.to_string(),
            duration_ms,
            seeds_count: 3,
            focus_nodes: 2,
            expanded_nodes: 1,
            sources_count: 4,
            degraded_to_keyword: degraded,
            error_kind: None,
        }
    }

    #[test]
    fn empty_collector_has_zeroed_summary() {
        let collector = MetricsCollector::new();
        let summary = collector.summary();
        assert_eq!(summary.count, 0);
        assert_eq!(summary.mean_duration_ms, 0.0);
    }

    #[test]
    fn summary_computes_percentiles_and_rates() {
        let collector = MetricsCollector::new();
        collector.record(metrics(10, false, "hybrid"));
        collector.record(metrics(20, true, "hybrid"));
        collector.record(metrics(30, false, "semantic"));

        let summary = collector.summary();
        assert_eq!(summary.count, 3);
        assert_eq!(summary.mean_duration_ms, 20.0);
        assert_eq!(summary.p50_duration_ms, 20.0);
        assert!((summary.degraded_rate - (1.0 / 3.0)).abs() < 1e-9);
        assert_eq!(summary.search_type_counts.get("hybrid"), Some(&2));
    }

    #[test]
    fn error_rate_reflects_recorded_failures() {
        let collector = MetricsCollector::new();
        let mut failed = metrics(15, false, "semantic");
        failed.error_kind = Some("Timeout".to_string());
        collector.record(failed);
        collector.record(metrics(5, false, "semantic"));

        let summary = collector.summary();
        assert_eq!(summary.error_rate, 0.5);
    }

    #[test]
    fn clear_resets_the_collector() {
        let collector = MetricsCollector::new();
        collector.record(metrics(1, false, "hybrid"));
        assert!(!collector.is_empty());
        collector.clear();
        assert!(collector.is_empty());
    }
}
