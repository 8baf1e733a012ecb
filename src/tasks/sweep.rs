//! Expiration Sweep Task
//!
//! Background task that periodically removes expired entries from a local
//! cache, bounding memory growth of entries that are written once and never
//! read again. Each pass also prunes completed single-flight slots.

use std::sync::Weak;
use std::time::Duration;

use tokio::task::JoinHandle;
use tracing::{debug, info, trace};

use crate::cache::{CacheKey, CacheValue};
use crate::local::LocalShared;

/// Spawns the sweep loop for one local cache.
///
/// The task holds only a `Weak` reference to the cache's storage, so it ends
/// on its own once the cache is dropped; the cache additionally aborts the
/// returned handle in its `Drop`. Sweep passes lock per entry, never across
/// the whole scan.
///
/// # Arguments
/// * `name` - Cache name used in log events
/// * `shared` - Weak handle to the storage to sweep
/// * `interval` - Pause between sweep passes
pub(crate) fn spawn_sweep_task<K, V>(
    name: &str,
    shared: Weak<LocalShared<K, V>>,
    interval: Duration,
) -> JoinHandle<()>
where
    K: CacheKey,
    V: CacheValue,
{
    let name = name.to_string();

    tokio::spawn(async move {
        info!(cache = %name, ?interval, "starting expiration sweep task");

        loop {
            tokio::time::sleep(interval).await;

            let Some(shared) = shared.upgrade() else {
                debug!(cache = %name, "cache dropped, ending sweep task");
                break;
            };

            let removed = shared.sweep_expired();
            shared.prune_flights();

            if removed > 0 {
                debug!(cache = %name, removed, "sweep removed expired entries");
            } else {
                trace!(cache = %name, "sweep found no expired entries");
            }
        }
    })
}
