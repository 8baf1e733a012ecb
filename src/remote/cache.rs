//! Remote Cache Module
//!
//! Cache backend over an external key/value store. Keys and values are
//! serialized to JSON bytes on the way in and values deserialized on the way
//! out; TTLs are forwarded for the server to enforce. Every store call is
//! bounded by the configured operation timeout, and failures surface to the
//! caller without retries.

use std::fmt;
use std::future::Future;
use std::marker::PhantomData;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tokio::time::timeout;
use tracing::debug;

use crate::cache::{
    Cache, CacheKey, CacheStats, CacheValue, FlightTable, StatsCollector, Supplier,
};
use crate::config::{BackendKind, CacheConfig};
use crate::error::{CacheError, Result};
use crate::remote::store::{RemoteStore, StoreResult};

// == Remote Cache ==
/// [`Cache`] implementation backed by a [`RemoteStore`].
///
/// The store owns the data; this type owns the codec, the per-call timeout,
/// the client-side statistics and the in-process single-flight table. TTL
/// expiration is delegated to the backend entirely, so entries never expire
/// lazily on the client.
pub struct RemoteCache<K, V> {
    name: String,
    config: CacheConfig,
    store: Arc<dyn RemoteStore>,
    flights: FlightTable<K>,
    stats: StatsCollector,
    _value: PhantomData<fn() -> V>,
}

impl<K: CacheKey, V: CacheValue> RemoteCache<K, V> {
    // == Constructor ==
    /// Creates a named cache over an already-opened store client.
    ///
    /// # Arguments
    /// * `name` - The cache's name, reported by `name()` and in log events
    /// * `config` - Validated against the remote-backend invariants
    /// * `store` - Client for the external backend holding the data
    pub fn new(
        name: impl Into<String>,
        config: CacheConfig,
        store: Arc<dyn RemoteStore>,
    ) -> Result<Self> {
        let name = name.into();
        config.validate(BackendKind::Remote)?;

        let stats = StatsCollector::new(config.record_stats);
        Ok(Self {
            name,
            config,
            store,
            flights: FlightTable::new(),
            stats,
            _value: PhantomData,
        })
    }

    /// Awaits a store call, converting both its failures and an elapsed
    /// operation timeout into cache errors.
    async fn bounded<T, F>(&self, op: &str, call: F) -> Result<T>
    where
        F: Future<Output = StoreResult<T>>,
    {
        match timeout(self.config.operation_timeout, call).await {
            Ok(result) => result.map_err(CacheError::from),
            Err(_) => {
                debug!(cache = %self.name, op, "store call exceeded the operation timeout");
                Err(CacheError::Timeout(format!(
                    "{op} on '{}' exceeded {:?}",
                    self.name, self.config.operation_timeout
                )))
            }
        }
    }

    fn encode_key(&self, key: &K) -> Result<Vec<u8>> {
        serde_json::to_vec(key)
            .map_err(|err| CacheError::Serialization(format!("failed to encode key: {err}")))
    }

    fn encode_value(&self, value: &V) -> Result<Vec<u8>> {
        serde_json::to_vec(value)
            .map_err(|err| CacheError::Serialization(format!("failed to encode value: {err}")))
    }

    fn decode_value(&self, bytes: &[u8]) -> Result<V> {
        serde_json::from_slice(bytes).map_err(|err| {
            CacheError::Serialization(format!("failed to decode stored value: {err}"))
        })
    }

    /// Fetches and decodes `key`, leaving hit/miss accounting to callers.
    async fn fetch(&self, key: &K) -> Result<Option<V>> {
        let encoded = self.encode_key(key)?;
        match self.bounded("get", self.store.get(&encoded)).await? {
            Some(bytes) => Ok(Some(self.decode_value(&bytes)?)),
            None => Ok(None),
        }
    }

    /// Encodes and stores an entry, forwarding the TTL to the backend.
    async fn store_value(&self, key: &K, value: &V, ttl: Option<Duration>) -> Result<()> {
        let encoded_key = self.encode_key(key)?;
        let encoded_value = self.encode_value(value)?;
        self.bounded("put", self.store.put(&encoded_key, &encoded_value, ttl))
            .await?;
        self.stats.record_insert();

        Ok(())
    }
}

// The store client is a trait object without a `Debug` bound, so Debug is
// written by hand over the remaining fields.
impl<K, V> fmt::Debug for RemoteCache<K, V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RemoteCache")
            .field("name", &self.name)
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

#[async_trait]
impl<K: CacheKey, V: CacheValue> Cache<K, V> for RemoteCache<K, V> {
    async fn get(&self, key: &K) -> Result<Option<V>> {
        match self.fetch(key).await? {
            Some(value) => {
                self.stats.record_hit();
                Ok(Some(value))
            }
            None => {
                self.stats.record_miss();
                Ok(None)
            }
        }
    }

    async fn put(&self, key: K, value: V) -> Result<()> {
        let ttl = self.config.effective_ttl(None)?;
        self.store_value(&key, &value, ttl).await
    }

    async fn put_with_ttl(&self, key: K, value: V, ttl: Duration) -> Result<()> {
        let ttl = self.config.effective_ttl(Some(ttl))?;
        self.store_value(&key, &value, ttl).await
    }

    async fn get_or_put_with(
        &self,
        key: K,
        supplier: Supplier<V>,
        ttl: Option<Duration>,
    ) -> Result<V> {
        // Fail fast, before the supplier can run
        let ttl = self.config.effective_ttl(ttl)?;

        if let Some(value) = self.fetch(&key).await? {
            self.stats.record_hit();
            return Ok(value);
        }
        self.stats.record_miss();

        let flight = self.flights.checkout(&key);
        let _guard = flight.lock().await;

        // A racer may have stored the value while we waited for the flight
        if let Some(value) = self.fetch(&key).await? {
            return Ok(value);
        }

        let value = supplier().await;
        self.store_value(&key, &value, ttl).await?;
        Ok(value)
    }

    async fn contains_key(&self, key: &K) -> Result<bool> {
        // Presence only; the payload is not decoded
        let encoded = self.encode_key(key)?;
        let payload = self.bounded("get", self.store.get(&encoded)).await?;
        Ok(payload.is_some())
    }

    async fn remove(&self, key: &K) -> Result<bool> {
        let encoded = self.encode_key(key)?;
        self.bounded("remove", self.store.remove(&encoded)).await
    }

    async fn clear(&self) -> Result<()> {
        self.bounded("clear", self.store.clear()).await
    }

    async fn size(&self) -> Result<usize> {
        let len = self.bounded("len", self.store.len()).await?;
        Ok(len as usize)
    }

    fn name(&self) -> &str {
        &self.name
    }

    fn stats(&self) -> CacheStats {
        // Entry count lives on the server and is not tracked client-side
        self.stats.snapshot(0, self.config.max_entries)
    }
}
