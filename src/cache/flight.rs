//! Single-Flight Module
//!
//! Per-key lock table used by the get-or-put path. Concurrent misses on one
//! key serialize around a single supplier invocation; operations on other
//! keys never touch the same lock.
//!
//! Slots hold only `Weak` references, so a flight's lock disappears with its
//! last participant and a panicked supplier can never wedge a key.

use std::collections::HashMap;
use std::sync::{Arc, Weak};

use parking_lot::Mutex;
use tokio::sync::Mutex as AsyncMutex;

use crate::cache::CacheKey;

/// Dead slots are compacted once the table grows past this many keys; the
/// expiration sweep also prunes on its own cadence.
const PRUNE_WATERMARK: usize = 1024;

// == Flight Table ==
/// Per-key flight locks for single-flight get-or-put.
#[derive(Debug, Default)]
pub(crate) struct FlightTable<K> {
    slots: Mutex<HashMap<K, Weak<AsyncMutex<()>>>>,
}

impl<K: CacheKey> FlightTable<K> {
    pub(crate) fn new() -> Self {
        Self {
            slots: Mutex::new(HashMap::new()),
        }
    }

    /// Returns the live flight lock for `key`, creating one if none exists.
    ///
    /// Callers lock the returned mutex for the duration of their
    /// re-check/supply/store sequence and simply drop it afterwards.
    pub(crate) fn checkout(&self, key: &K) -> Arc<AsyncMutex<()>> {
        let mut slots = self.slots.lock();

        if let Some(flight) = slots.get(key).and_then(Weak::upgrade) {
            return flight;
        }

        if slots.len() >= PRUNE_WATERMARK {
            slots.retain(|_, slot| slot.strong_count() > 0);
        }

        let flight = Arc::new(AsyncMutex::new(()));
        slots.insert(key.clone(), Arc::downgrade(&flight));
        flight
    }

    /// Drops slots whose flights have completed.
    pub(crate) fn prune(&self) {
        self.slots.lock().retain(|_, slot| slot.strong_count() > 0);
    }

    #[cfg(test)]
    fn len(&self) -> usize {
        self.slots.lock().len()
    }
}
