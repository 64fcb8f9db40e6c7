//! Pool Module
//!
//! Bounded, concurrency-safe entry storage with lifetime and idle-time
//! expiration.

mod activity;
mod entry;
mod stats;
mod store;


use std::time::Duration;

// Re-export public types
pub use activity::{ActivityPrint, UNBOUNDED};
pub(crate) use activity::saturating_millis;
pub use entry::{EvictHook, PoolEntry, Poolable};
pub use stats::PoolStats;
pub use store::{OverflowPolicy, Pool, PoolGuard};

// == Public Constants ==
/// Default lifetime applied by a cache when none is given (3 hours).
pub const DEFAULT_LIVE_TIME: Duration = Duration::from_secs(3 * 60 * 60);

/// Default idle limit applied by a cache when none is given (30 minutes).
pub const DEFAULT_MAX_IDLE_TIME: Duration = Duration::from_secs(30 * 60);
