//! Cache observability counters.
//!
//! Owned by a single [`super::TranslationCache`]; there is no process-wide
//! instance.

use serde::Serialize;
use std::sync::atomic::{AtomicUsize, Ordering};

#[derive(Debug, Default)]
pub struct CacheMetrics {
    /// Reads answered from the mirror
    hits: AtomicUsize,

    /// Reads that fell through to the store
    misses: AtomicUsize,

    /// Single-key writes or removals applied to the mirror
    patches: AtomicUsize,

    /// Whole-locale loads
    loads: AtomicUsize,
}

impl CacheMetrics {
    pub fn record_hit(&self) {
        self.hits.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_miss(&self) {
        self.misses.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_patch(&self) {
        self.patches.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_load(&self) {
        self.loads.fetch_add(1, Ordering::Relaxed);
    }

    pub fn hits(&self) -> usize {
        self.hits.load(Ordering::Relaxed)
    }

    pub fn misses(&self) -> usize {
        self.misses.load(Ordering::Relaxed)
    }

    pub fn patches(&self) -> usize {
        self.patches.load(Ordering::Relaxed)
    }

    pub fn loads(&self) -> usize {
        self.loads.load(Ordering::Relaxed)
    }

    pub fn report(&self) -> MetricsReport {
        let hits = self.hits();
        let misses = self.misses();
        let total = hits + misses;
        let hit_rate = if total > 0 {
            (hits as f64 / total as f64) * 100.0
        } else {
            0.0
        };

        MetricsReport {
            hits,
            misses,
            hit_rate,
            patches: self.patches(),
            loads: self.loads(),
        }
    }

    pub fn reset(&self) {
        self.hits.store(0, Ordering::Relaxed);
        self.misses.store(0, Ordering::Relaxed);
        self.patches.store(0, Ordering::Relaxed);
        self.loads.store(0, Ordering::Relaxed);
    }
}

/// Snapshot of cache statistics.
#[derive(Debug, Clone, Serialize)]
pub struct MetricsReport {
    pub hits: usize,
    pub misses: usize,

    /// Hit rate as a percentage (0-100)
    pub hit_rate: f64,

    pub patches: usize,
    pub loads: usize,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_report_empty() {
        let report = CacheMetrics::default().report();
        assert_eq!(report.hits, 0);
        assert_eq!(report.misses, 0);
        assert_eq!(report.hit_rate, 0.0);
    }

    #[test]
    fn test_report_hit_rate() {
        let metrics = CacheMetrics::default();

        // 3 hits, 1 miss = 75% hit rate
        metrics.record_hit();
        metrics.record_hit();
        metrics.record_hit();
        metrics.record_miss();

        let report = metrics.report();
        assert_eq!(report.hits, 3);
        assert_eq!(report.misses, 1);
        assert_eq!(report.hit_rate, 75.0);
    }

    #[test]
    fn test_patches_and_loads() {
        let metrics = CacheMetrics::default();
        metrics.record_patch();
        metrics.record_patch();
        metrics.record_load();

        let report = metrics.report();
        assert_eq!(report.patches, 2);
        assert_eq!(report.loads, 1);
    }

    #[test]
    fn test_reset() {
        let metrics = CacheMetrics::default();
        metrics.record_hit();
        metrics.record_load();
        metrics.reset();
        assert_eq!(metrics.hits(), 0);
        assert_eq!(metrics.loads(), 0);
    }

    #[test]
    fn test_report_serializes() {
        let json = serde_json::to_string(&CacheMetrics::default().report()).unwrap();
        assert!(json.contains("\"hit_rate\":0.0"));
    }
}
