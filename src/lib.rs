//! Timed Pool - A bounded in-process object pool and cache
//!
//! Entries expire on two clocks, an absolute lifetime and an idle limit.
//! The [`Pool`] owns storage and eviction; the [`Cache`] façade applies
//! default timing and offers blocking and async access.

pub mod cache;
pub mod config;
pub mod error;
pub mod executor;
pub mod pool;
pub mod tasks;
pub mod telemetry;

pub use cache::Cache;
pub use config::CacheConfig;
pub use error::{DestroyError, PoolError, Result};
pub use executor::{AsyncExecutor, CacheTask};
pub use pool::{ActivityPrint, OverflowPolicy, Pool, PoolEntry, PoolGuard, PoolStats, Poolable, UNBOUNDED};
pub use tasks::spawn_vacate_task;
