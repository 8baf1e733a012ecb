//! Cache Entry Module
//!
//! Defines the immutable wrapper for individual cache entries with TTL support.

use std::time::{Duration, Instant};

// == Cache Entry ==
/// A single cache entry pairing a value with its lifetime metadata.
///
/// Entries are immutable after creation: updating a value or its TTL always
/// replaces the whole entry. Timestamps are monotonic (`Instant`), so entry
/// lifetimes are unaffected by wall-clock adjustments.
#[derive(Debug, Clone)]
pub struct CacheEntry<V> {
    /// The stored value
    pub value: V,
    /// Creation timestamp
    pub created_at: Instant,
    /// Expiration timestamp, None = no expiration
    pub expires_at: Option<Instant>,
}

impl<V> CacheEntry<V> {
    // == Constructor ==
    /// Creates a new cache entry with optional TTL.
    ///
    /// `expires_at` is always at or after `created_at` since TTLs are
    /// non-negative durations added to the creation instant.
    ///
    /// # Arguments
    /// * `value` - The value to store
    /// * `ttl` - Optional time-to-live; None means the entry never expires
    pub fn new(value: V, ttl: Option<Duration>) -> Self {
        let now = Instant::now();

        Self {
            value,
            created_at: now,
            expires_at: ttl.map(|ttl| now + ttl),
        }
    }

    // == Is Expired ==
    /// Checks if the entry has expired.
    ///
    /// Boundary condition: an entry is considered expired when the current
    /// instant is greater than or equal to the expiration instant, so an
    /// entry becomes unavailable the moment its TTL has fully elapsed.
    ///
    /// # Returns
    /// - `true` if the entry has a TTL and the current instant >= expiration
    /// - `false` if the entry has no TTL (never expires) or TTL hasn't elapsed
    pub fn is_expired(&self) -> bool {
        match self.expires_at {
            Some(expires) => Instant::now() >= expires,
            None => false,
        }
    }

    // == Time To Live ==
    /// Returns the remaining lifetime, or None if no expiration is set.
    ///
    /// # Returns
    /// - `Some(Duration::ZERO)` if the entry has already expired
    /// - `Some(remaining)` if the entry has a TTL and hasn't expired
    /// - `None` if the entry has no TTL (never expires)
    pub fn ttl_remaining(&self) -> Option<Duration> {
        self.expires_at
            .map(|expires| expires.saturating_duration_since(Instant::now()))
    }
}
