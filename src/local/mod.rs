//! Local Backend Module
//!
//! The in-process cache backend and its eviction policy trackers.

pub(crate) mod eviction;
mod store;

pub use store::LocalCache;
pub(crate) use store::LocalShared;
