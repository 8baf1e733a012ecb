//! Remote Backend Module
//!
//! The cache backend that delegates storage to an external key/value store
//! reached through the [`RemoteStore`] trait.

mod cache;
mod store;

pub use cache::RemoteCache;
pub use store::{RemoteStore, StoreError, StoreResult};
