//! Cache Module
//!
//! The backend-independent caching contract: the [`Cache`] trait and its
//! typed conveniences, cache entries, statistics and the single-flight
//! table shared by every backend.

mod contract;
mod entry;
mod flight;
mod stats;


// Re-export public types
pub use contract::{Cache, CacheExt, CacheKey, CacheValue, Supplier};
pub use entry::CacheEntry;
pub use stats::CacheStats;

pub(crate) use flight::FlightTable;
pub(crate) use stats::StatsCollector;
