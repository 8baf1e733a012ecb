//! Configuration Module
//!
//! Declarative per-cache settings: capacity bounds, TTL defaults, eviction
//! policy selection, statistics recording, sweep cadence and remote
//! connection parameters. A config is plain data; it is validated when a
//! cache is constructed, not when the config is built.

use std::fmt;
use std::time::Duration;

use crate::error::{CacheError, Result};

// == Eviction Policy ==
/// Strategy used to select a victim entry when a bounded cache is full.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum EvictionPolicy {
    /// Evict the least recently used entry (get, get_or_put hit and put all
    /// count as use)
    #[default]
    Lru,
    /// Evict the entry with the lowest access count, ties broken by oldest
    /// access
    Lfu,
    /// Evict the entry with the oldest insertion time, ignoring accesses
    Fifo,
    /// Evict an entry chosen uniformly at random
    Random,
}

// == Backend Kind ==
/// Which concrete storage implementation underlies a named cache.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BackendKind {
    /// In-process map with local eviction and expiration
    Local,
    /// Thin client forwarding to an external key/value store
    Remote,
}

// == Cache Config ==
/// Settings for one cache instance.
///
/// The remote fields (`endpoint`, credentials, `use_tls` and the timeouts)
/// are only consulted by remote backends; local caches ignore them.
#[derive(Clone, PartialEq, Eq)]
pub struct CacheConfig {
    /// Pre-allocation hint for the underlying map
    pub initial_capacity: usize,
    /// Maximum number of entries the cache can hold; must be positive
    pub max_entries: usize,
    /// TTL applied to entries stored without an explicit TTL; None = entries
    /// never expire passively
    pub default_ttl: Option<Duration>,
    /// Victim selection strategy for over-capacity insertions
    pub eviction_policy: EvictionPolicy,
    /// Whether hit/miss/eviction counters are collected
    pub record_stats: bool,
    /// Cadence of the background expiration sweep; None disables the sweep
    pub sweep_interval: Option<Duration>,
    /// Remote store address, e.g. "redis://cache.internal:6379"
    pub endpoint: Option<String>,
    /// Remote username, if the backend requires authentication
    pub username: Option<String>,
    /// Remote password, if the backend requires authentication
    pub password: Option<String>,
    /// Whether the remote transport is encrypted
    pub use_tls: bool,
    /// Deadline for establishing a remote connection
    pub connect_timeout: Duration,
    /// Deadline for a single remote operation
    pub operation_timeout: Duration,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            initial_capacity: 100,
            max_entries: 1000,
            default_ttl: None,
            eviction_policy: EvictionPolicy::default(),
            record_stats: false,
            sweep_interval: Some(Duration::from_secs(30)),
            endpoint: None,
            username: None,
            password: None,
            use_tls: false,
            connect_timeout: Duration::from_secs(2),
            operation_timeout: Duration::from_secs(2),
        }
    }
}

impl CacheConfig {
    /// Starts a builder pre-populated with the defaults.
    pub fn builder() -> CacheConfigBuilder {
        CacheConfigBuilder {
            config: Self::default(),
        }
    }

    /// Resolves the TTL for one store operation: an explicit zero TTL is
    /// rejected, an absent one falls back to `default_ttl`.
    pub(crate) fn effective_ttl(&self, explicit: Option<Duration>) -> Result<Option<Duration>> {
        match explicit {
            Some(ttl) if ttl.is_zero() => Err(CacheError::InvalidArgument(
                "ttl must be strictly positive".to_string(),
            )),
            Some(ttl) => Ok(Some(ttl)),
            None => Ok(self.default_ttl),
        }
    }

    /// Checks the invariants this config must satisfy for the given backend
    /// kind.
    ///
    /// # Arguments
    /// * `kind` - The backend the config is about to be used for
    pub(crate) fn validate(&self, kind: BackendKind) -> Result<()> {
        if self.max_entries == 0 {
            return Err(CacheError::InvalidArgument(
                "max_entries must be greater than zero".to_string(),
            ));
        }

        if self.default_ttl.is_some_and(|ttl| ttl.is_zero()) {
            return Err(CacheError::InvalidArgument(
                "default_ttl must be strictly positive".to_string(),
            ));
        }

        if self.sweep_interval.is_some_and(|interval| interval.is_zero()) {
            return Err(CacheError::InvalidArgument(
                "sweep_interval must be strictly positive".to_string(),
            ));
        }

        if kind == BackendKind::Remote {
            match self.endpoint.as_deref() {
                None | Some("") => {
                    return Err(CacheError::InvalidArgument(
                        "remote cache requires a non-empty endpoint".to_string(),
                    ));
                }
                Some(_) => {}
            }

            if self.connect_timeout.is_zero() || self.operation_timeout.is_zero() {
                return Err(CacheError::InvalidArgument(
                    "remote timeouts must be strictly positive".to_string(),
                ));
            }
        }

        Ok(())
    }
}

// Credentials must not leak into logs, so Debug is written by hand.
impl fmt::Debug for CacheConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CacheConfig")
            .field("initial_capacity", &self.initial_capacity)
            .field("max_entries", &self.max_entries)
            .field("default_ttl", &self.default_ttl)
            .field("eviction_policy", &self.eviction_policy)
            .field("record_stats", &self.record_stats)
            .field("sweep_interval", &self.sweep_interval)
            .field("endpoint", &self.endpoint)
            .field("username", &self.username)
            .field("password", &self.password.as_ref().map(|_| "<redacted>"))
            .field("use_tls", &self.use_tls)
            .field("connect_timeout", &self.connect_timeout)
            .field("operation_timeout", &self.operation_timeout)
            .finish()
    }
}

// == Config Builder ==
/// Fluent builder for [`CacheConfig`].
///
/// Building never fails; invariants are enforced when the config is handed
/// to a cache constructor or the registry.
#[derive(Debug, Clone)]
pub struct CacheConfigBuilder {
    config: CacheConfig,
}

impl CacheConfigBuilder {
    /// Sets the pre-allocation hint for the underlying map.
    pub fn initial_capacity(mut self, capacity: usize) -> Self {
        self.config.initial_capacity = capacity;
        self
    }

    /// Sets the maximum number of entries.
    pub fn max_entries(mut self, max_entries: usize) -> Self {
        self.config.max_entries = max_entries;
        self
    }

    /// Sets the TTL applied when a put carries no explicit TTL.
    pub fn default_ttl(mut self, ttl: Duration) -> Self {
        self.config.default_ttl = Some(ttl);
        self
    }

    /// Sets the eviction policy.
    pub fn eviction_policy(mut self, policy: EvictionPolicy) -> Self {
        self.config.eviction_policy = policy;
        self
    }

    /// Enables or disables statistics collection.
    pub fn record_stats(mut self, enabled: bool) -> Self {
        self.config.record_stats = enabled;
        self
    }

    /// Sets the background sweep cadence.
    pub fn sweep_interval(mut self, interval: Duration) -> Self {
        self.config.sweep_interval = Some(interval);
        self
    }

    /// Disables the background sweep; expired entries are then reclaimed
    /// only lazily.
    pub fn no_sweep(mut self) -> Self {
        self.config.sweep_interval = None;
        self
    }

    /// Sets the remote store address.
    pub fn endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.config.endpoint = Some(endpoint.into());
        self
    }

    /// Sets the remote credentials.
    pub fn credentials(mut self, username: impl Into<String>, password: impl Into<String>) -> Self {
        self.config.username = Some(username.into());
        self.config.password = Some(password.into());
        self
    }

    /// Enables or disables transport encryption for the remote backend.
    pub fn use_tls(mut self, enabled: bool) -> Self {
        self.config.use_tls = enabled;
        self
    }

    /// Sets the remote connection deadline.
    pub fn connect_timeout(mut self, timeout: Duration) -> Self {
        self.config.connect_timeout = timeout;
        self
    }

    /// Sets the per-operation remote deadline.
    pub fn operation_timeout(mut self, timeout: Duration) -> Self {
        self.config.operation_timeout = timeout;
        self
    }

    /// Finishes the builder.
    pub fn build(self) -> CacheConfig {
        self.config
    }
}

// == Unit Tests ==
#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_defaults() {
        let config = CacheConfig::default();
        assert_eq!(config.initial_capacity, 100);
        assert_eq!(config.max_entries, 1000);
        assert_eq!(config.default_ttl, None);
        assert_eq!(config.eviction_policy, EvictionPolicy::Lru);
        assert!(!config.record_stats);
        assert_eq!(config.sweep_interval, Some(Duration::from_secs(30)));
        assert_eq!(config.connect_timeout, Duration::from_secs(2));
    }

    #[test]
    fn test_builder_chains() {
        let config = CacheConfig::builder()
            .max_entries(50)
            .default_ttl(Duration::from_secs(60))
            .eviction_policy(EvictionPolicy::Lfu)
            .record_stats(true)
            .sweep_interval(Duration::from_millis(500))
            .build();

        assert_eq!(config.max_entries, 50);
        assert_eq!(config.default_ttl, Some(Duration::from_secs(60)));
        assert_eq!(config.eviction_policy, EvictionPolicy::Lfu);
        assert!(config.record_stats);
        assert_eq!(config.sweep_interval, Some(Duration::from_millis(500)));
    }

    #[test]
    fn test_builder_remote_fields() {
        let config = CacheConfig::builder()
            .endpoint("redis://localhost:6379")
            .credentials("svc-cache", "secret")
            .use_tls(true)
            .connect_timeout(Duration::from_millis(250))
            .operation_timeout(Duration::from_millis(100))
            .build();

        assert_eq!(config.endpoint.as_deref(), Some("redis://localhost:6379"));
        assert_eq!(config.username.as_deref(), Some("svc-cache"));
        assert_eq!(config.password.as_deref(), Some("secret"));
        assert!(config.use_tls);
        assert!(config.validate(BackendKind::Remote).is_ok());
    }

    #[test]
    fn test_validate_rejects_zero_capacity() {
        let mut config = CacheConfig::default();
        config.max_entries = 0;

        let result = config.validate(BackendKind::Local);
        assert!(matches!(result, Err(CacheError::InvalidArgument(_))));
    }

    #[test]
    fn test_validate_rejects_zero_default_ttl() {
        let mut config = CacheConfig::default();
        config.default_ttl = Some(Duration::ZERO);

        let result = config.validate(BackendKind::Local);
        assert!(matches!(result, Err(CacheError::InvalidArgument(_))));
    }

    #[test]
    fn test_validate_rejects_zero_sweep_interval() {
        let mut config = CacheConfig::default();
        config.sweep_interval = Some(Duration::ZERO);

        let result = config.validate(BackendKind::Local);
        assert!(matches!(result, Err(CacheError::InvalidArgument(_))));
    }

    #[test]
    fn test_validate_remote_requires_endpoint() {
        let config = CacheConfig::default();
        assert!(config.validate(BackendKind::Local).is_ok());

        let result = config.validate(BackendKind::Remote);
        assert!(matches!(result, Err(CacheError::InvalidArgument(_))));

        let config = CacheConfig::builder().endpoint("").build();
        let result = config.validate(BackendKind::Remote);
        assert!(matches!(result, Err(CacheError::InvalidArgument(_))));
    }

    #[test]
    fn test_validate_remote_rejects_zero_timeouts() {
        let config = CacheConfig::builder()
            .endpoint("redis://localhost:6379")
            .operation_timeout(Duration::ZERO)
            .build();

        let result = config.validate(BackendKind::Remote);
        assert!(matches!(result, Err(CacheError::InvalidArgument(_))));
    }

    #[test]
    fn test_debug_redacts_password() {
        let config = CacheConfig::builder()
            .endpoint("redis://localhost:6379")
            .credentials("svc-cache", "hunter2")
            .build();

        let rendered = format!("{config:?}");
        assert!(rendered.contains("<redacted>"));
        assert!(!rendered.contains("hunter2"));
    }
}
