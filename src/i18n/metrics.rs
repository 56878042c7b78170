//! Translation metrics and observability module.
//!
//! Tracks cache hit rates and per-key translation calls for one
//! `LanguageManager`.

use serde::Serialize;
use std::sync::atomic::{AtomicUsize, Ordering};

#[derive(Debug, Default)]
pub struct TranslationMetrics {
    /// Number of switches served from the table cache
    cache_hits: AtomicUsize,

    /// Number of switches that had to build a table
    cache_misses: AtomicUsize,

    /// Number of per-key translation calls
    key_translations: AtomicUsize,

    /// Number of per-key translations replaced by English
    key_failures: AtomicUsize,

    /// Number of switches that fell back to English entirely
    total_failures: AtomicUsize,
}

impl TranslationMetrics {
    /// Create a new metrics tracker
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a switch served from the table cache
    pub fn record_cache_hit(&self) {
        self.cache_hits.fetch_add(1, Ordering::Relaxed);
    }

    /// Record a switch that had to build a table
    pub fn record_cache_miss(&self) {
        self.cache_misses.fetch_add(1, Ordering::Relaxed);
    }

    /// Record one per-key translation call
    pub fn record_key_translation(&self) {
        self.key_translations.fetch_add(1, Ordering::Relaxed);
    }

    /// Record a key that kept its English text
    pub fn record_key_failure(&self) {
        self.key_failures.fetch_add(1, Ordering::Relaxed);
    }

    /// Record a switch that fell back to English
    pub fn record_total_failure(&self) {
        self.total_failures.fetch_add(1, Ordering::Relaxed);
    }

    /// Get total cache hits
    pub fn cache_hits(&self) -> usize {
        self.cache_hits.load(Ordering::Relaxed)
    }

    /// Get total cache misses
    pub fn cache_misses(&self) -> usize {
        self.cache_misses.load(Ordering::Relaxed)
    }

    /// Get total per-key translation calls
    pub fn key_translations(&self) -> usize {
        self.key_translations.load(Ordering::Relaxed)
    }

    /// Get total per-key failures
    pub fn key_failures(&self) -> usize {
        self.key_failures.load(Ordering::Relaxed)
    }

    /// Get total fallbacks to English
    pub fn total_failures(&self) -> usize {
        self.total_failures.load(Ordering::Relaxed)
    }

    /// Generate a metrics report.
    pub fn report(&self) -> MetricsReport {
        let hits = self.cache_hits();
        let misses = self.cache_misses();
        let total_cache_queries = hits + misses;
        let cache_hit_rate = if total_cache_queries > 0 {
            (hits as f64 / total_cache_queries as f64) * 100.0
        } else {
            0.0
        };

        let calls = self.key_translations();
        let failures = self.key_failures();
        let key_success_rate = if calls > 0 {
            (calls.saturating_sub(failures) as f64 / calls as f64) * 100.0
        } else {
            0.0
        };

        MetricsReport {
            cache_hits: hits,
            cache_misses: misses,
            cache_hit_rate,
            key_translations: calls,
            key_failures: failures,
            key_success_rate,
            total_failures: self.total_failures(),
        }
    }
}

/// Metrics report containing current translation statistics.
#[derive(Debug, Clone, Serialize)]
pub struct MetricsReport {
    pub cache_hits: usize,
    pub cache_misses: usize,
    /// Cache hit rate as a percentage (0-100)
    pub cache_hit_rate: f64,
    pub key_translations: usize,
    pub key_failures: usize,
    /// Per-key success rate as a percentage (0-100)
    pub key_success_rate: f64,
    pub total_failures: usize,
}
