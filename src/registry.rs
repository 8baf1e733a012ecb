//! Cache Registry Module
//!
//! Factory and lifecycle owner for named caches. The registry maps unique
//! names to cache instances, builds the right backend for a requested kind
//! and tears every cache down at shutdown.
//!
//! Handles are stored type-erased and recovered by downcast, so one registry
//! can hold caches of differing key/value types side by side.

use std::any::Any;
use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use parking_lot::Mutex;
use tracing::{debug, info, warn};

use crate::cache::{Cache, CacheKey, CacheValue};
use crate::config::{BackendKind, CacheConfig};
use crate::error::{CacheError, Result};
use crate::local::LocalCache;
use crate::remote::{RemoteCache, RemoteStore};

// == Remote Connector ==
/// Opens [`RemoteStore`] clients for the registry's remote caches.
///
/// `open` constructs a client handle from the remote fields of the config;
/// it must not block on the network. Stores are expected to establish and
/// pool their actual connections lazily.
pub trait RemoteConnector: Send + Sync {
    /// Opens a store client for `config`'s endpoint.
    fn open(&self, config: &CacheConfig) -> Result<Arc<dyn RemoteStore>>;
}

// == Registered Entry ==
/// Shutdown-facing view of a registered cache, independent of key/value
/// types.
#[async_trait]
trait ErasedCache: Send + Sync {
    async fn clear(&self) -> Result<()>;
}

/// Newtype carrying the typed handle across the erased trait boundary.
struct ErasedHandle<K: CacheKey, V: CacheValue>(Arc<dyn Cache<K, V>>);

#[async_trait]
impl<K: CacheKey, V: CacheValue> ErasedCache for ErasedHandle<K, V> {
    async fn clear(&self) -> Result<()> {
        self.0.clear().await
    }
}

/// A cache held by the registry: one handle for teardown, one for typed
/// retrieval.
struct Registered {
    erased: Box<dyn ErasedCache>,
    typed: Box<dyn Any + Send + Sync>,
}

impl Registered {
    fn new<K: CacheKey, V: CacheValue>(handle: Arc<dyn Cache<K, V>>) -> Self {
        Self {
            erased: Box::new(ErasedHandle(Arc::clone(&handle))),
            typed: Box::new(handle),
        }
    }

    fn handle<K: CacheKey, V: CacheValue>(&self, name: &str) -> Result<Arc<dyn Cache<K, V>>> {
        match self.typed.downcast_ref::<Arc<dyn Cache<K, V>>>() {
            Some(handle) => Ok(Arc::clone(handle)),
            None => Err(CacheError::TypeMismatch(format!(
                "cache '{name}' is registered with different key/value types"
            ))),
        }
    }
}

// == Cache Registry ==
/// Factory for named [`Cache`] instances, local or remote.
///
/// Names are unique within a registry; a second `create_cache` under an
/// existing name fails rather than silently overwriting. Construction is
/// synchronous and runs under the registry lock, so two racing
/// `get_or_create_cache` calls can never build the same cache twice.
pub struct CacheRegistry {
    caches: Mutex<HashMap<String, Registered>>,
    connector: Option<Arc<dyn RemoteConnector>>,
}

impl CacheRegistry {
    /// Creates a registry that can build local caches only.
    pub fn new() -> Self {
        Self {
            caches: Mutex::new(HashMap::new()),
            connector: None,
        }
    }

    /// Creates a registry that builds remote caches through `connector`.
    pub fn with_connector(connector: Arc<dyn RemoteConnector>) -> Self {
        Self {
            caches: Mutex::new(HashMap::new()),
            connector: Some(connector),
        }
    }

    // == Creation ==
    /// Creates and registers a cache under a unique name.
    ///
    /// # Arguments
    /// * `name` - Registry-unique cache name; must not be empty
    /// * `kind` - Backend to instantiate
    /// * `config` - Validated against the chosen backend's invariants
    ///
    /// # Returns
    /// A shared handle to the new cache, or `AlreadyExists` when the name is
    /// taken, or `InvalidArgument` when the name is empty, the config is
    /// invalid for `kind`, or a remote kind is requested without a connector.
    pub fn create_cache<K: CacheKey, V: CacheValue>(
        &self,
        name: &str,
        kind: BackendKind,
        config: CacheConfig,
    ) -> Result<Arc<dyn Cache<K, V>>> {
        let mut caches = self.caches.lock();
        if caches.contains_key(name) {
            return Err(CacheError::AlreadyExists(format!(
                "cache '{name}' is already registered"
            )));
        }

        let handle = self.build_cache::<K, V>(name, kind, config)?;
        caches.insert(name.to_string(), Registered::new(Arc::clone(&handle)));
        Ok(handle)
    }

    /// Returns the cache registered under `name`, creating it when absent.
    ///
    /// When the name exists, the supplied kind and config are ignored and
    /// the existing handle is returned; requesting it under different
    /// key/value types fails with `TypeMismatch`.
    pub fn get_or_create_cache<K: CacheKey, V: CacheValue>(
        &self,
        name: &str,
        kind: BackendKind,
        config: CacheConfig,
    ) -> Result<Arc<dyn Cache<K, V>>> {
        let mut caches = self.caches.lock();
        if let Some(registered) = caches.get(name) {
            return registered.handle::<K, V>(name);
        }

        let handle = self.build_cache::<K, V>(name, kind, config)?;
        caches.insert(name.to_string(), Registered::new(Arc::clone(&handle)));
        Ok(handle)
    }

    fn build_cache<K: CacheKey, V: CacheValue>(
        &self,
        name: &str,
        kind: BackendKind,
        config: CacheConfig,
    ) -> Result<Arc<dyn Cache<K, V>>> {
        if name.is_empty() {
            return Err(CacheError::InvalidArgument(
                "cache name must not be empty".to_string(),
            ));
        }

        let handle: Arc<dyn Cache<K, V>> = match kind {
            BackendKind::Local => Arc::new(LocalCache::new(name, config)?),
            BackendKind::Remote => {
                let Some(connector) = &self.connector else {
                    return Err(CacheError::InvalidArgument(format!(
                        "cache '{name}' needs a remote connector, none is installed"
                    )));
                };
                config.validate(BackendKind::Remote)?;
                let store = connector.open(&config)?;
                Arc::new(RemoteCache::new(name, config, store)?)
            }
        };

        info!(cache = name, kind = ?kind, "created cache");
        Ok(handle)
    }

    // == Lookup ==
    /// Whether a cache is registered under `name`.
    pub fn cache_exists(&self, name: &str) -> bool {
        self.caches.lock().contains_key(name)
    }

    /// Names of all registered caches, sorted.
    pub fn cache_names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.caches.lock().keys().cloned().collect();
        names.sort();
        names
    }

    // == Teardown ==
    /// Clears and unregisters the cache under `name`.
    ///
    /// The cache is unregistered even when the final clear fails; the clear
    /// failure is returned so callers see the backend error.
    ///
    /// # Returns
    /// `false` when no cache was registered under `name`.
    pub async fn remove_cache(&self, name: &str) -> Result<bool> {
        let registered = { self.caches.lock().remove(name) };
        let Some(registered) = registered else {
            return Ok(false);
        };

        registered.erased.clear().await?;
        debug!(cache = name, "removed cache");
        Ok(true)
    }

    /// Clears and unregisters every cache, for process shutdown.
    ///
    /// Cleanup continues past individual failures; each failed cache is
    /// logged and reported in the returned list.
    pub async fn close_all(&self) -> Vec<(String, CacheError)> {
        let drained: Vec<(String, Registered)> = {
            let mut caches = self.caches.lock();
            caches.drain().collect()
        };

        let mut failures = Vec::new();
        for (name, registered) in drained {
            if let Err(err) = registered.erased.clear().await {
                warn!(cache = %name, error = %err, "failed to clear cache during shutdown");
                failures.push((name, err));
            }
        }
        failures
    }
}

impl Default for CacheRegistry {
    fn default() -> Self {
        Self::new()
    }
}
