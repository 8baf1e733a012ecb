//! Error types for the caching core
//!
//! Provides unified error handling using thiserror. Every backend reports
//! failures through the same taxonomy, so callers never match on
//! backend-specific error types.
//!
//! A missing key is not an error: lookups return `Ok(None)` and removals
//! return `Ok(false)`.

use thiserror::Error;

// == Cache Error Enum ==
/// Unified error type for all cache backends and the registry.
#[derive(Error, Debug)]
pub enum CacheError {
    /// A supplied argument violates the contract (empty name, zero TTL,
    /// invalid configuration field)
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    /// A stored value could not be interpreted as the requested type
    #[error("Type mismatch: {0}")]
    TypeMismatch(String),

    /// A cache with the given name is already registered
    #[error("Cache already exists: {0}")]
    AlreadyExists(String),

    /// The cache is at capacity and no eviction victim could be selected
    #[error("Capacity exceeded: {0}")]
    CapacityExceeded(String),

    /// The remote backend could not be reached
    #[error("Connection error: {0}")]
    Connection(String),

    /// A remote operation did not complete within the configured timeout
    #[error("Operation timed out: {0}")]
    Timeout(String),

    /// The remote backend rejected the configured credentials
    #[error("Authentication failed: {0}")]
    Authentication(String),

    /// A value could not be encoded or decoded by the codec
    #[error("Serialization error: {0}")]
    Serialization(String),
}

// == Result Type Alias ==
/// Convenience Result type for the caching core.
pub type Result<T> = std::result::Result<T, CacheError>;
