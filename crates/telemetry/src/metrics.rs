//! In-process counters and latency histograms for the dashboard.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Instant;

/// A monotonically increasing counter.
#[derive(Debug, Default)]
pub struct Counter(AtomicU64);

impl Counter {
    pub fn new() -> Self {
        Self(AtomicU64::new(0))
    }

    pub fn inc(&self) {
        self.0.fetch_add(1, Ordering::Relaxed);
    }

    pub fn inc_by(&self, n: u64) {
        self.0.fetch_add(n, Ordering::Relaxed);
    }

    pub fn get(&self) -> u64 {
        self.0.load(Ordering::Relaxed)
    }
}

/// Latency histogram with fixed millisecond buckets.
#[derive(Debug)]
pub struct Histogram {
    /// Buckets: 1ms, 5ms, 10ms, 25ms, 50ms, 100ms, 250ms, 500ms, 1s, 5s, 10s
    buckets: [AtomicU64; 11],
    sum: AtomicU64,
    count: AtomicU64,
}

impl Default for Histogram {
    fn default() -> Self {
        Self::new()
    }
}

impl Histogram {
    const BUCKET_BOUNDS: [u64; 11] = [1, 5, 10, 25, 50, 100, 250, 500, 1000, 5000, 10000];

    pub fn new() -> Self {
        Self {
            buckets: Default::default(),
            sum: AtomicU64::new(0),
            count: AtomicU64::new(0),
        }
    }

    pub fn observe(&self, ms: u64) {
        self.sum.fetch_add(ms, Ordering::Relaxed);
        self.count.fetch_add(1, Ordering::Relaxed);

        let idx = Self::BUCKET_BOUNDS
            .iter()
            .position(|&bound| ms <= bound)
            .unwrap_or(Self::BUCKET_BOUNDS.len() - 1);
        self.buckets[idx].fetch_add(1, Ordering::Relaxed);
    }

    /// Record the time elapsed since `start`.
    pub fn observe_since(&self, start: Instant) {
        self.observe(start.elapsed().as_millis() as u64);
    }

    pub fn count(&self) -> u64 {
        self.count.load(Ordering::Relaxed)
    }

    pub fn sum(&self) -> u64 {
        self.sum.load(Ordering::Relaxed)
    }

    pub fn mean(&self) -> f64 {
        let count = self.count();
        if count == 0 {
            0.0
        } else {
            self.sum() as f64 / count as f64
        }
    }

    pub fn buckets(&self) -> Vec<(u64, u64)> {
        Self::BUCKET_BOUNDS
            .iter()
            .zip(self.buckets.iter())
            .map(|(&bound, count)| (bound, count.load(Ordering::Relaxed)))
            .collect()
    }
}

/// Dashboard metrics.
#[derive(Debug, Default)]
pub struct Metrics {
    // Rollups
    pub rollups_built: Counter,
    pub rollup_nodes_emitted: Counter,

    // Overrides
    pub overrides_applied: Counter,
    pub overrides_reverted: Counter,
    pub override_conflicts: Counter,
    pub noop_overrides_rejected: Counter,

    // Fact store
    pub fact_queries: Counter,
    pub fact_query_errors: Counter,

    // Classification store
    pub classification_queries: Counter,
    pub classification_query_errors: Counter,

    // Latency histograms
    pub rollup_latency_ms: Histogram,
    pub fact_query_latency_ms: Histogram,
    pub classification_latency_ms: Histogram,
}

impl Metrics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            timestamp: Utc::now(),
            rollups_built: self.rollups_built.get(),
            rollup_nodes_emitted: self.rollup_nodes_emitted.get(),
            overrides_applied: self.overrides_applied.get(),
            overrides_reverted: self.overrides_reverted.get(),
            override_conflicts: self.override_conflicts.get(),
            noop_overrides_rejected: self.noop_overrides_rejected.get(),
            fact_queries: self.fact_queries.get(),
            fact_query_errors: self.fact_query_errors.get(),
            classification_queries: self.classification_queries.get(),
            classification_query_errors: self.classification_query_errors.get(),
            rollup_latency_mean_ms: self.rollup_latency_ms.mean(),
            fact_query_latency_mean_ms: self.fact_query_latency_ms.mean(),
            classification_latency_mean_ms: self.classification_latency_ms.mean(),
        }
    }
}

/// A point-in-time copy of [`Metrics`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MetricsSnapshot {
    pub timestamp: DateTime<Utc>,
    pub rollups_built: u64,
    pub rollup_nodes_emitted: u64,
    pub overrides_applied: u64,
    pub overrides_reverted: u64,
    pub override_conflicts: u64,
    pub noop_overrides_rejected: u64,
    pub fact_queries: u64,
    pub fact_query_errors: u64,
    pub classification_queries: u64,
    pub classification_query_errors: u64,
    pub rollup_latency_mean_ms: f64,
    pub fact_query_latency_mean_ms: f64,
    pub classification_latency_mean_ms: f64,
}

/// Global metrics registry.
pub static METRICS: std::sync::LazyLock<Metrics> = std::sync::LazyLock::new(Metrics::new);

pub fn metrics() -> &'static Metrics {
    &METRICS
}
