//! Shared fixtures for integration tests.

#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use parking_lot::Mutex;
use tracing_subscriber::EnvFilter;

use cachehub::{CacheConfig, RemoteConnector, RemoteStore, Result, StoreError, StoreResult};

/// Installs a log subscriber so `RUST_LOG=debug cargo test` shows cache
/// events. Safe to call from every test; only the first call wins.
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

struct StoredEntry {
    payload: Vec<u8>,
    expires_at: Option<Instant>,
}

impl StoredEntry {
    fn is_expired(&self) -> bool {
        self.expires_at.is_some_and(|at| Instant::now() >= at)
    }
}

/// In-memory [`RemoteStore`] that enforces TTLs server-side, the way a real
/// backend would.
#[derive(Default)]
pub struct MemoryStore {
    entries: Mutex<HashMap<Vec<u8>, StoredEntry>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl RemoteStore for MemoryStore {
    async fn get(&self, key: &[u8]) -> StoreResult<Option<Vec<u8>>> {
        let mut entries = self.entries.lock();
        match entries.get(key) {
            Some(entry) if entry.is_expired() => {
                entries.remove(key);
                Ok(None)
            }
            Some(entry) => Ok(Some(entry.payload.clone())),
            None => Ok(None),
        }
    }

    async fn put(&self, key: &[u8], value: &[u8], ttl: Option<Duration>) -> StoreResult<()> {
        let entry = StoredEntry {
            payload: value.to_vec(),
            expires_at: ttl.map(|ttl| Instant::now() + ttl),
        };
        self.entries.lock().insert(key.to_vec(), entry);
        Ok(())
    }

    async fn remove(&self, key: &[u8]) -> StoreResult<bool> {
        let mut entries = self.entries.lock();
        match entries.remove(key) {
            Some(entry) if entry.is_expired() => Ok(false),
            Some(_) => Ok(true),
            None => Ok(false),
        }
    }

    async fn clear(&self) -> StoreResult<()> {
        self.entries.lock().clear();
        Ok(())
    }

    async fn len(&self) -> StoreResult<u64> {
        let mut entries = self.entries.lock();
        entries.retain(|_, entry| !entry.is_expired());
        Ok(entries.len() as u64)
    }
}

/// Store standing in for a backend that dropped off the network.
pub struct UnreachableStore;

#[async_trait]
impl RemoteStore for UnreachableStore {
    async fn get(&self, _key: &[u8]) -> StoreResult<Option<Vec<u8>>> {
        Err(StoreError::Connection("endpoint unreachable".to_string()))
    }

    async fn put(&self, _key: &[u8], _value: &[u8], _ttl: Option<Duration>) -> StoreResult<()> {
        Err(StoreError::Connection("endpoint unreachable".to_string()))
    }

    async fn remove(&self, _key: &[u8]) -> StoreResult<bool> {
        Err(StoreError::Connection("endpoint unreachable".to_string()))
    }

    async fn clear(&self) -> StoreResult<()> {
        Err(StoreError::Connection("endpoint unreachable".to_string()))
    }

    async fn len(&self) -> StoreResult<u64> {
        Err(StoreError::Connection("endpoint unreachable".to_string()))
    }
}

/// Endpoint for which [`MemoryConnector`] hands out unreachable stores.
pub const DOWN_ENDPOINT: &str = "down.internal:6379";

/// Connector opening a fresh [`MemoryStore`] per cache, or an
/// [`UnreachableStore`] for [`DOWN_ENDPOINT`].
pub struct MemoryConnector;

impl RemoteConnector for MemoryConnector {
    fn open(&self, config: &CacheConfig) -> Result<Arc<dyn RemoteStore>> {
        match config.endpoint.as_deref() {
            Some(DOWN_ENDPOINT) => Ok(Arc::new(UnreachableStore)),
            _ => Ok(Arc::new(MemoryStore::new())),
        }
    }
}
