//! Pastebin Core Business Logic
//!
//! This crate provides the paste lifecycle: key generation, the
//! write ordering across blob and metadata stores, frequency-gated
//! caching of hot pastes, and the scheduled expiry sweep.

pub mod cache;
pub mod engine;
pub mod error;
pub mod keygen;
pub mod sweeper;

#[cfg(test)]
mod testing;

pub use cache::{
    spawn_purge_task, CachePolicy, MemoryCache, PasteCache, RedisCache, RedisCacheConfig,
};
pub use engine::{FetchedPaste, PasteEngine};
pub use error::{CacheError, CoreError};
pub use keygen::KeyGenerator;
pub use sweeper::{spawn_sweep_task, ExpirySweeper, SweepFailure, SweepReport, SweepSchedule};
