//! Cache Statistics Module
//!
//! Tracks cache performance metrics including hits, misses, evictions and
//! expirations. Counters live in an internal lock-free collector; callers
//! receive point-in-time `CacheStats` snapshots.

use std::sync::atomic::{AtomicU64, Ordering};

use serde::Serialize;

// == Cache Stats ==
/// Point-in-time snapshot of cache performance metrics.
///
/// All counters are lifetime counters: `clear()` on a cache empties its
/// entries but does not reset its statistics.
#[derive(Debug, Clone, Default, Serialize)]
pub struct CacheStats {
    /// Number of successful cache retrievals
    pub hits: u64,
    /// Number of failed cache retrievals (key not found or expired)
    pub misses: u64,
    /// Number of values stored (puts and supplier results)
    pub inserts: u64,
    /// Number of entries evicted by the eviction policy
    pub evictions: u64,
    /// Number of entries removed because their TTL elapsed
    pub expirations: u64,
    /// Number of entries at snapshot time
    pub entries: usize,
    /// Configured capacity bound
    pub max_entries: usize,
}

impl CacheStats {
    // == Hit Rate ==
    /// Calculates the cache hit rate.
    ///
    /// Returns hits / (hits + misses), or 0.0 if no requests have been made.
    pub fn hit_rate(&self) -> f64 {
        let total = self.hits + self.misses;
        if total == 0 {
            0.0
        } else {
            self.hits as f64 / total as f64
        }
    }
}

// == Stats Collector ==
/// Internal counter set shared by cache handles and their background tasks.
///
/// Recording is gated on the `record_stats` configuration flag; a disabled
/// collector never touches its atomics.
#[derive(Debug, Default)]
pub(crate) struct StatsCollector {
    enabled: bool,
    hits: AtomicU64,
    misses: AtomicU64,
    inserts: AtomicU64,
    evictions: AtomicU64,
    expirations: AtomicU64,
}

impl StatsCollector {
    /// Creates a collector; `enabled` mirrors `CacheConfig::record_stats`.
    pub(crate) fn new(enabled: bool) -> Self {
        Self {
            enabled,
            ..Self::default()
        }
    }

    pub(crate) fn record_hit(&self) {
        if self.enabled {
            self.hits.fetch_add(1, Ordering::Relaxed);
        }
    }

    pub(crate) fn record_miss(&self) {
        if self.enabled {
            self.misses.fetch_add(1, Ordering::Relaxed);
        }
    }

    pub(crate) fn record_insert(&self) {
        if self.enabled {
            self.inserts.fetch_add(1, Ordering::Relaxed);
        }
    }

    pub(crate) fn record_eviction(&self) {
        if self.enabled {
            self.evictions.fetch_add(1, Ordering::Relaxed);
        }
    }

    pub(crate) fn record_expiration(&self) {
        if self.enabled {
            self.expirations.fetch_add(1, Ordering::Relaxed);
        }
    }

    /// Produces a snapshot combining the counters with the caller-supplied
    /// live entry count and capacity bound.
    pub(crate) fn snapshot(&self, entries: usize, max_entries: usize) -> CacheStats {
        CacheStats {
            hits: self.hits.load(Ordering::Relaxed),
            misses: self.misses.load(Ordering::Relaxed),
            inserts: self.inserts.load(Ordering::Relaxed),
            evictions: self.evictions.load(Ordering::Relaxed),
            expirations: self.expirations.load(Ordering::Relaxed),
            entries,
            max_entries,
        }
    }
}
