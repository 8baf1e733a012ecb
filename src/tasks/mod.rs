//! Background Tasks Module
//!
//! Contains background tasks that run periodically alongside cache handles.
//!
//! # Tasks
//! - Expiration sweep: removes expired entries at the configured interval

mod sweep;

pub(crate) use sweep::spawn_sweep_task;
