//! Cache Contract Module
//!
//! The backend-agnostic operation contract every cache implements, plus the
//! generic convenience layer built on top of it.
//!
//! `Cache` is object safe so callers can hold `Arc<dyn Cache<K, V>>` handles
//! regardless of the backend behind them. Operations that need caller-side
//! generics (closure suppliers, typed reads) live on the blanket extension
//! trait [`CacheExt`] and delegate to the object-safe core.

use std::fmt;
use std::future::Future;
use std::hash::Hash;
use std::time::Duration;

use async_trait::async_trait;
use futures::future::BoxFuture;
use futures::FutureExt;
use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::cache::CacheStats;
use crate::error::{CacheError, Result};

// == Capability Markers ==
/// Capabilities a cache key must provide.
///
/// Blanket-implemented for every qualifying type; `Serialize` is what lets a
/// key cross the remote-store boundary, `Debug` is what lets eviction and
/// sweep logging name it.
pub trait CacheKey: Eq + Hash + Clone + fmt::Debug + Serialize + Send + Sync + 'static {}

impl<T> CacheKey for T where T: Eq + Hash + Clone + fmt::Debug + Serialize + Send + Sync + 'static {}

/// Capabilities a cached value must provide.
///
/// Values round-trip through the serde codec for remote storage and typed
/// reads, so both `Serialize` and `DeserializeOwned` are required.
pub trait CacheValue: Clone + Serialize + DeserializeOwned + Send + Sync + 'static {}

impl<T> CacheValue for T where T: Clone + Serialize + DeserializeOwned + Send + Sync + 'static {}

// == Supplier ==
/// Boxed value producer consumed by [`Cache::get_or_put_with`].
///
/// Invoked at most once; the future it returns runs outside any cache-wide
/// lock.
pub type Supplier<V> = Box<dyn FnOnce() -> BoxFuture<'static, V> + Send>;

// == Cache Trait ==
/// The core operation contract shared by all backends.
///
/// Semantics every implementation upholds:
/// - a missing key is not an error: `get` returns `Ok(None)`, `remove`
///   returns `Ok(false)`
/// - an expired entry behaves exactly like a missing one (lazy expiration)
/// - under concurrent `get_or_put_with` misses on one key, at most one
///   supplier runs and every caller observes its value (single-flight)
#[async_trait]
pub trait Cache<K: CacheKey, V: CacheValue>: Send + Sync {
    /// Retrieves the value stored under `key`, if present and unexpired.
    ///
    /// A found-but-expired entry is removed as a side effect and reported as
    /// not-found.
    async fn get(&self, key: &K) -> Result<Option<V>>;

    /// Stores `value` under `key`, applying the configured `default_ttl`
    /// when one is set.
    ///
    /// Overwrites silently; the previous entry (and its TTL) is discarded.
    async fn put(&self, key: K, value: V) -> Result<()>;

    /// Stores `value` under `key` with an explicit TTL.
    ///
    /// # Arguments
    /// * `ttl` - Entry lifetime; must be strictly positive or the call fails
    ///   with `InvalidArgument`
    async fn put_with_ttl(&self, key: K, value: V, ttl: Duration) -> Result<()>;

    /// Returns the cached value for `key`, or invokes `supplier` to produce
    /// and store one.
    ///
    /// Object-safe core of the get-or-put family; most callers use the
    /// closure-taking wrappers on [`CacheExt`] instead.
    ///
    /// # Arguments
    /// * `supplier` - Invoked at most once, only on a miss
    /// * `ttl` - TTL for a freshly stored value; None applies `default_ttl`
    async fn get_or_put_with(&self, key: K, supplier: Supplier<V>, ttl: Option<Duration>)
        -> Result<V>;

    /// Checks whether `key` holds an unexpired entry, with the same lazy
    /// expiration side effect as `get`.
    async fn contains_key(&self, key: &K) -> Result<bool>;

    /// Removes the entry under `key`.
    ///
    /// # Returns
    /// `true` iff an entry was present and removed.
    async fn remove(&self, key: &K) -> Result<bool>;

    /// Removes all entries and resets policy bookkeeping.
    ///
    /// Statistics counters are lifetime counters and survive a clear.
    async fn clear(&self) -> Result<()>;

    /// Returns the number of live entries, purging expired ones it finds.
    async fn size(&self) -> Result<usize>;

    /// The cache's registered name.
    fn name(&self) -> &str;

    /// Snapshot of this handle's statistics counters.
    ///
    /// Counters are all zero unless `record_stats` is enabled. For remote
    /// backends the snapshot covers only what this handle observed locally;
    /// the live entry count is served by `size()`.
    fn stats(&self) -> CacheStats;
}

// Callers hold `Arc<dyn Cache>` handles, so the trait object itself must be
// printable; values need no `Debug` bound, only the name is shown.
impl<K: CacheKey, V: CacheValue> fmt::Debug for dyn Cache<K, V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Cache")
            .field("name", &self.name())
            .finish_non_exhaustive()
    }
}

// == Cache Ext ==
/// Generic conveniences available on every [`Cache`], including trait
/// objects.
#[async_trait]
pub trait CacheExt<K: CacheKey, V: CacheValue>: Cache<K, V> {
    /// Returns the cached value for `key`, or runs `supplier` and stores its
    /// result with the configured `default_ttl`.
    async fn get_or_put<F, Fut>(&self, key: K, supplier: F) -> Result<V>
    where
        F: FnOnce() -> Fut + Send + 'static,
        Fut: Future<Output = V> + Send + 'static,
    {
        self.get_or_put_with(key, Box::new(move || supplier().boxed()), None)
            .await
    }

    /// Returns the cached value for `key`, or runs `supplier` and stores its
    /// result with an explicit TTL.
    async fn get_or_put_with_ttl<F, Fut>(&self, key: K, supplier: F, ttl: Duration) -> Result<V>
    where
        F: FnOnce() -> Fut + Send + 'static,
        Fut: Future<Output = V> + Send + 'static,
    {
        self.get_or_put_with(key, Box::new(move || supplier().boxed()), Some(ttl))
            .await
    }

    /// Retrieves the value stored under `key` re-interpreted as `T` through
    /// the codec.
    ///
    /// # Returns
    /// - `Ok(None)` when the key is absent or expired
    /// - `Err(TypeMismatch)` when the stored value does not decode as `T`
    async fn get_typed<T>(&self, key: &K) -> Result<Option<T>>
    where
        T: DeserializeOwned + Send + 'static,
    {
        match self.get(key).await? {
            None => Ok(None),
            Some(value) => {
                let raw = serde_json::to_value(&value).map_err(|err| {
                    CacheError::Serialization(format!(
                        "stored value under {key:?} cannot be re-encoded: {err}"
                    ))
                })?;

                match serde_json::from_value(raw) {
                    Ok(typed) => Ok(Some(typed)),
                    Err(err) => Err(CacheError::TypeMismatch(format!(
                        "stored value under {key:?} cannot be read as the requested type: {err}"
                    ))),
                }
            }
        }
    }
}

impl<K: CacheKey, V: CacheValue, C> CacheExt<K, V> for C where C: Cache<K, V> + ?Sized {}
