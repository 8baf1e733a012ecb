//! CacheHub - An embeddable multi-backend caching library
//!
//! Provides named local and remote caches with TTL expiration, policy-driven
//! eviction and single-flight loading behind one [`Cache`] contract.

pub mod cache;
pub mod config;
pub mod error;
pub mod local;
pub mod registry;
pub mod remote;

mod tasks;

pub use cache::{Cache, CacheEntry, CacheExt, CacheKey, CacheStats, CacheValue, Supplier};
pub use config::{BackendKind, CacheConfig, CacheConfigBuilder, EvictionPolicy};
pub use error::{CacheError, Result};
pub use local::LocalCache;
pub use registry::{CacheRegistry, RemoteConnector};
pub use remote::{RemoteCache, RemoteStore, StoreError, StoreResult};
