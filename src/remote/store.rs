//! Remote Store Boundary
//!
//! The interface the caching core expects from an external key/value store
//! client. Connection pooling, the wire protocol and server-side TTL
//! enforcement all live behind this trait; the core sees only byte payloads
//! and a uniform failure taxonomy.

use std::time::Duration;

use async_trait::async_trait;
use thiserror::Error;

use crate::error::CacheError;

// == Store Error ==
/// Failure taxonomy reported by remote store clients.
#[derive(Error, Debug)]
pub enum StoreError {
    /// The backend could not be reached or the connection dropped
    #[error("connection failed: {0}")]
    Connection(String),

    /// The backend did not answer in time
    #[error("request timed out: {0}")]
    Timeout(String),

    /// The backend rejected the configured credentials
    #[error("authentication rejected: {0}")]
    Authentication(String),
}

/// Convenience Result type for store operations.
pub type StoreResult<T> = std::result::Result<T, StoreError>;

// Store failures surface to callers through the cache taxonomy unchanged in
// category, so retry decisions can key off the variant alone.
impl From<StoreError> for CacheError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::Connection(msg) => CacheError::Connection(msg),
            StoreError::Timeout(msg) => CacheError::Timeout(msg),
            StoreError::Authentication(msg) => CacheError::Authentication(msg),
        }
    }
}

// == Remote Store Trait ==
/// Byte-level operations a remote backend must provide.
///
/// TTLs are forwarded for the server to enforce; the core keeps no
/// client-side expiration bookkeeping for remote entries.
#[async_trait]
pub trait RemoteStore: Send + Sync {
    /// Fetches the payload stored under `key`.
    async fn get(&self, key: &[u8]) -> StoreResult<Option<Vec<u8>>>;

    /// Stores `value` under `key` with an optional server-enforced TTL.
    async fn put(&self, key: &[u8], value: &[u8], ttl: Option<Duration>) -> StoreResult<()>;

    /// Removes the payload under `key`, reporting whether one existed.
    async fn remove(&self, key: &[u8]) -> StoreResult<bool>;

    /// Removes every payload in this store's namespace.
    async fn clear(&self) -> StoreResult<()>;

    /// Number of live entries in this store's namespace.
    async fn len(&self) -> StoreResult<u64>;
}
