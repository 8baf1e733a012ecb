//! Local Cache Module
//!
//! In-process cache backend: a key/value map with policy-driven eviction,
//! lazy TTL expiration and a background expiration sweep.
//!
//! The entry map and its eviction tracker live under one short-hold lock,
//! taken per operation and never across an await. Suppliers run outside the
//! storage lock, guarded only by their key's flight lock.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use parking_lot::Mutex;
use tokio::task::JoinHandle;
use tracing::debug;

use crate::cache::{
    Cache, CacheEntry, CacheKey, CacheStats, CacheValue, FlightTable, StatsCollector, Supplier,
};
use crate::config::{BackendKind, CacheConfig};
use crate::error::{CacheError, Result};
use crate::local::eviction::{tracker_for, EvictionTracker};
use crate::tasks::spawn_sweep_task;

// == Shared State ==
/// State shared between cache handles and the background sweep task.
#[derive(Debug)]
pub(crate) struct LocalShared<K, V> {
    slots: Mutex<Slots<K, V>>,
    stats: StatsCollector,
    flights: FlightTable<K>,
}

/// Entry map plus eviction bookkeeping, mutated together under one guard.
#[derive(Debug)]
struct Slots<K, V> {
    entries: HashMap<K, CacheEntry<V>>,
    tracker: Box<dyn EvictionTracker<K>>,
}

impl<K: CacheKey, V: CacheValue> LocalShared<K, V> {
    pub(crate) fn new(config: &CacheConfig) -> Self {
        Self {
            slots: Mutex::new(Slots {
                entries: HashMap::with_capacity(config.initial_capacity),
                tracker: tracker_for(config.eviction_policy),
            }),
            stats: StatsCollector::new(config.record_stats),
            flights: FlightTable::new(),
        }
    }

    /// Removes expired entries, re-acquiring the lock per key so the scan
    /// never blocks concurrent operations for its full duration.
    pub(crate) fn sweep_expired(&self) -> usize {
        let keys: Vec<K> = {
            let slots = self.slots.lock();
            slots.entries.keys().cloned().collect()
        };

        let mut removed = 0;
        for key in keys {
            let mut guard = self.slots.lock();
            let slots = &mut *guard;

            let expired = slots
                .entries
                .get(&key)
                .is_some_and(|entry| entry.is_expired());
            if expired {
                slots.entries.remove(&key);
                slots.tracker.on_remove(&key);
                self.stats.record_expiration();
                removed += 1;
            }
        }

        removed
    }

    /// Drops completed single-flight slots.
    pub(crate) fn prune_flights(&self) {
        self.flights.prune();
    }

    /// Current entry count, expired entries included.
    pub(crate) fn len(&self) -> usize {
        self.slots.lock().entries.len()
    }
}

// == Local Cache ==
/// In-process [`Cache`] implementation.
///
/// Dropping the last handle aborts the cache's background sweep task.
pub struct LocalCache<K, V> {
    name: String,
    config: CacheConfig,
    shared: Arc<LocalShared<K, V>>,
    sweep: Option<JoinHandle<()>>,
}

impl<K: CacheKey, V: CacheValue> LocalCache<K, V> {
    // == Constructor ==
    /// Creates a named local cache.
    ///
    /// When `config.sweep_interval` is set (the default), a background sweep
    /// task is spawned; construction must then happen inside a Tokio
    /// runtime.
    ///
    /// # Arguments
    /// * `name` - The cache's name, reported by `name()` and in log events
    /// * `config` - Validated against the local-backend invariants
    pub fn new(name: impl Into<String>, config: CacheConfig) -> Result<Self> {
        let name = name.into();
        config.validate(BackendKind::Local)?;

        let shared = Arc::new(LocalShared::new(&config));
        let sweep = config
            .sweep_interval
            .map(|interval| spawn_sweep_task(&name, Arc::downgrade(&shared), interval));

        Ok(Self {
            name,
            config,
            shared,
            sweep,
        })
    }

    #[cfg(test)]
    pub(crate) fn sweep_handle(&self) -> Option<&JoinHandle<()>> {
        self.sweep.as_ref()
    }

    /// Looks up `key`, lazily removing it when expired. Records the access
    /// with the eviction tracker but leaves hit/miss accounting to callers.
    fn lookup(&self, key: &K) -> Option<V> {
        let mut guard = self.shared.slots.lock();
        let slots = &mut *guard;

        match slots.entries.get(key) {
            Some(entry) if entry.is_expired() => {
                slots.entries.remove(key);
                slots.tracker.on_remove(key);
                self.shared.stats.record_expiration();
                None
            }
            Some(entry) => {
                let value = entry.value.clone();
                slots.tracker.on_access(key);
                Some(value)
            }
            None => None,
        }
    }

    /// Stores an entry, evicting one policy victim if the insertion would
    /// exceed capacity.
    fn insert(&self, key: K, value: V, ttl: Option<Duration>) -> Result<()> {
        let entry = CacheEntry::new(value, ttl);

        let mut guard = self.shared.slots.lock();
        let slots = &mut *guard;

        // Overwrites never trigger eviction
        if !slots.entries.contains_key(&key) && slots.entries.len() >= self.config.max_entries {
            let Some(victim) = slots.tracker.victim() else {
                return Err(CacheError::CapacityExceeded(format!(
                    "cache '{}' is full and no eviction victim was selected",
                    self.name
                )));
            };

            slots.entries.remove(&victim);
            slots.tracker.on_remove(&victim);
            self.shared.stats.record_eviction();
            debug!(cache = %self.name, victim = ?victim, "evicted entry to make room");
        }

        slots.entries.insert(key.clone(), entry);
        slots.tracker.on_insert(&key);
        self.shared.stats.record_insert();

        Ok(())
    }
}

#[async_trait]
impl<K: CacheKey, V: CacheValue> Cache<K, V> for LocalCache<K, V> {
    async fn get(&self, key: &K) -> Result<Option<V>> {
        match self.lookup(key) {
            Some(value) => {
                self.shared.stats.record_hit();
                Ok(Some(value))
            }
            None => {
                self.shared.stats.record_miss();
                Ok(None)
            }
        }
    }

    async fn put(&self, key: K, value: V) -> Result<()> {
        let ttl = self.config.effective_ttl(None)?;
        self.insert(key, value, ttl)
    }

    async fn put_with_ttl(&self, key: K, value: V, ttl: Duration) -> Result<()> {
        let ttl = self.config.effective_ttl(Some(ttl))?;
        self.insert(key, value, ttl)
    }

    async fn get_or_put_with(
        &self,
        key: K,
        supplier: Supplier<V>,
        ttl: Option<Duration>,
    ) -> Result<V> {
        // Fail fast, before the supplier can run
        let ttl = self.config.effective_ttl(ttl)?;

        if let Some(value) = self.lookup(&key) {
            self.shared.stats.record_hit();
            return Ok(value);
        }
        self.shared.stats.record_miss();

        let flight = self.shared.flights.checkout(&key);
        let _guard = flight.lock().await;

        // A racer may have stored the value while we waited for the flight
        if let Some(value) = self.lookup(&key) {
            return Ok(value);
        }

        let value = supplier().await;
        self.insert(key, value.clone(), ttl)?;
        Ok(value)
    }

    async fn contains_key(&self, key: &K) -> Result<bool> {
        let mut guard = self.shared.slots.lock();
        let slots = &mut *guard;

        match slots.entries.get(key) {
            Some(entry) if entry.is_expired() => {
                slots.entries.remove(key);
                slots.tracker.on_remove(key);
                self.shared.stats.record_expiration();
                Ok(false)
            }
            Some(_) => Ok(true),
            None => Ok(false),
        }
    }

    async fn remove(&self, key: &K) -> Result<bool> {
        let mut guard = self.shared.slots.lock();
        let slots = &mut *guard;

        match slots.entries.remove(key) {
            Some(entry) if entry.is_expired() => {
                // Expired entries are already gone as far as callers know
                slots.tracker.on_remove(key);
                self.shared.stats.record_expiration();
                Ok(false)
            }
            Some(_) => {
                slots.tracker.on_remove(key);
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn clear(&self) -> Result<()> {
        {
            let mut guard = self.shared.slots.lock();
            let slots = &mut *guard;
            slots.entries.clear();
            slots.tracker.reset();
        }
        self.shared.prune_flights();

        Ok(())
    }

    async fn size(&self) -> Result<usize> {
        self.shared.sweep_expired();
        Ok(self.shared.len())
    }

    fn name(&self) -> &str {
        &self.name
    }

    fn stats(&self) -> CacheStats {
        self.shared
            .stats
            .snapshot(self.shared.len(), self.config.max_entries)
    }
}

impl<K, V> Drop for LocalCache<K, V> {
    fn drop(&mut self) {
        if let Some(sweep) = &self.sweep {
            sweep.abort();
        }
    }
}
