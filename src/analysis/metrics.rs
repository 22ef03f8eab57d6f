use serde::Serialize;
use std::sync::atomic::{AtomicU64, Ordering};

/// Process-local analyzer counters. Cheap relaxed atomics; read via
/// `snapshot` for reporting.
#[derive(Debug, Default)]
pub struct AnalyzerMetrics {
    analyses_performed: AtomicU64,
    cache_hits: AtomicU64,
    cache_misses: AtomicU64,
    batches_run: AtomicU64,
    batch_items_failed: AtomicU64,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct MetricsSnapshot {
    pub analyses_performed: u64,
    pub cache_hits: u64,
    pub cache_misses: u64,
    pub cache_hit_rate: f64,
    pub batches_run: u64,
    pub batch_items_failed: u64,
}

impl AnalyzerMetrics {
    pub fn record_hit(&self) {
        self.cache_hits.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_miss(&self) {
        self.cache_misses.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_analysis(&self) {
        self.analyses_performed.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_batch(&self, failed_items: u64) {
        self.batches_run.fetch_add(1, Ordering::Relaxed);
        self.batch_items_failed.fetch_add(failed_items, Ordering::Relaxed);
    }

    pub fn snapshot(&self) -> MetricsSnapshot {
        let hits = self.cache_hits.load(Ordering::Relaxed);
        let misses = self.cache_misses.load(Ordering::Relaxed);
        let lookups = hits + misses;
        let cache_hit_rate = if lookups > 0 {
            hits as f64 / lookups as f64
        } else {
            0.0
        };

        MetricsSnapshot {
            analyses_performed: self.analyses_performed.load(Ordering::Relaxed),
            cache_hits: hits,
            cache_misses: misses,
            cache_hit_rate,
            batches_run: self.batches_run.load(Ordering::Relaxed),
            batch_items_failed: self.batch_items_failed.load(Ordering::Relaxed),
        }
    }
}
