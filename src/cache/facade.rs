//! Cache Facade Module
//!
//! Typed entry point over a shared pool: applies default timing, carries
//! instance properties, and offers every operation in a blocking and a
//! future-returning form.

use std::fmt;
use std::hash::Hash;
use std::sync::Arc;
use std::time::Duration;

use serde_json::Value;
use tokio::task::JoinHandle;
use tracing::info;

use crate::cache::PropertyBag;
use crate::config::CacheConfig;
use crate::error::Result;
use crate::executor::{AsyncExecutor, CacheTask, DEFAULT_WORKERS};
use crate::pool::{
    saturating_millis, Pool, PoolEntry, PoolGuard, PoolStats, Poolable, DEFAULT_LIVE_TIME,
    DEFAULT_MAX_IDLE_TIME,
};
use crate::tasks::spawn_vacate_task;

// == Property Names ==
pub const PROPERTY_CAPACITY: &str = "cache.capacity";
pub const PROPERTY_LIVE_TIME_MS: &str = "cache.live_time_ms";
pub const PROPERTY_MAX_IDLE_TIME_MS: &str = "cache.max_idle_time_ms";
pub const PROPERTY_OVERFLOW_POLICY: &str = "cache.overflow_policy";

// == Cache ==
/// Cache façade over a [`Pool`].
///
/// Cloning a cache is cheap; clones share the pool, properties and
/// executor.
pub struct Cache<K, V> {
    pool: Arc<Pool<K, V>>,
    live_time: Duration,
    max_idle_time: Duration,
    properties: Arc<PropertyBag>,
    executor: AsyncExecutor,
}

impl<K, V> Cache<K, V>
where
    K: Eq + Hash + Clone + Send + Sync + 'static,
    V: Clone + Send + Sync + 'static,
{
    // == Constructors ==
    /// Wraps a pool, using the default 3 hour lifetime and 30 minute idle
    /// limit.
    pub fn new(pool: Pool<K, V>, executor: AsyncExecutor) -> Self {
        let properties = PropertyBag::new();
        properties.set(PROPERTY_CAPACITY, pool.capacity());
        properties.set(
            PROPERTY_OVERFLOW_POLICY,
            format!("{:?}", pool.overflow_policy()),
        );
        properties.set(PROPERTY_LIVE_TIME_MS, saturating_millis(DEFAULT_LIVE_TIME));
        properties.set(
            PROPERTY_MAX_IDLE_TIME_MS,
            saturating_millis(DEFAULT_MAX_IDLE_TIME),
        );

        Self {
            pool: Arc::new(pool),
            live_time: DEFAULT_LIVE_TIME,
            max_idle_time: DEFAULT_MAX_IDLE_TIME,
            properties: Arc::new(properties),
            executor,
        }
    }

    /// Builds a rejecting pool of `capacity` on the current tokio runtime.
    pub fn with_capacity(capacity: usize) -> Result<Self> {
        Ok(Self::new(
            Pool::new(capacity)?,
            AsyncExecutor::new(DEFAULT_WORKERS)?,
        ))
    }

    /// Builds a cache from configuration on the current tokio runtime.
    ///
    /// Starts the background vacate task when an interval is configured; the
    /// task ends when the cache is closed or dropped.
    pub fn from_config(config: &CacheConfig) -> Result<Self> {
        config.validate()?;

        let pool = Pool::with_policy(config.capacity, config.overflow_policy)?;
        let executor = AsyncExecutor::new(config.workers)?;
        let cache = Self::new(pool, executor)
            .with_default_timing(config.live_time, config.max_idle_time);

        if let Some(interval) = config.vacate_interval {
            cache.spawn_vacate_task(interval);
        }

        info!(
            capacity = config.capacity,
            workers = config.workers,
            "Cache initialized"
        );
        Ok(cache)
    }

    /// Replaces the timing applied by [`put`](Self::put).
    pub fn with_default_timing(mut self, live_time: Duration, max_idle_time: Duration) -> Self {
        self.live_time = live_time;
        self.max_idle_time = max_idle_time;
        self.properties
            .set(PROPERTY_LIVE_TIME_MS, saturating_millis(live_time));
        self.properties
            .set(PROPERTY_MAX_IDLE_TIME_MS, saturating_millis(max_idle_time));
        self
    }

    pub fn live_time(&self) -> Duration {
        self.live_time
    }

    pub fn max_idle_time(&self) -> Duration {
        self.max_idle_time
    }

    // == Reads ==
    /// Value under `key`, or `None` on a miss or after expiry.
    pub fn get(&self, key: &K) -> Result<Option<V>> {
        self.pool.get(key)
    }

    /// Like [`get`](Self::get), but any failure also yields `None`.
    pub fn get_or_none(&self, key: &K) -> Option<V> {
        self.get(key).ok().flatten()
    }

    pub fn contains_key(&self, key: &K) -> Result<bool> {
        self.pool.contains_key(key)
    }

    /// Snapshot of live keys; later changes are not reflected.
    pub fn keys(&self) -> Vec<K> {
        self.pool.keys()
    }

    pub fn size(&self) -> usize {
        self.pool.size()
    }

    pub fn is_empty(&self) -> bool {
        self.pool.is_empty()
    }

    pub fn stats(&self) -> PoolStats {
        self.pool.stats()
    }

    // == Writes ==
    /// Stores `value` with the cache's default timing.
    ///
    /// Returns `Ok(false)` if the pool is full and nothing could be
    /// reclaimed.
    pub fn put(&self, key: K, value: V) -> Result<bool> {
        self.pool
            .put(key, value, self.live_time, self.max_idle_time)
    }

    /// Stores `value` with explicit timing.
    pub fn put_with(
        &self,
        key: K,
        value: V,
        live_time: Duration,
        max_idle_time: Duration,
    ) -> Result<bool> {
        self.pool.put(key, value, live_time, max_idle_time)
    }

    /// Stores a prebuilt entry as-is.
    pub fn put_entry(&self, key: K, entry: PoolEntry<V>) -> Result<bool> {
        self.pool.insert(key, entry)
    }

    /// Stores a poolable value; its `destroy` runs when it is evicted.
    ///
    /// The value's own activity print wins over the cache's defaults.
    pub fn put_poolable(&self, key: K, value: V) -> Result<bool>
    where
        V: Poolable,
    {
        self.put_entry(
            key,
            PoolEntry::poolable_with(value, self.live_time, self.max_idle_time),
        )
    }

    pub fn remove(&self, key: &K) -> Result<bool> {
        self.pool.remove(key)
    }

    pub fn vacate(&self) -> Result<usize> {
        self.pool.vacate()
    }

    pub fn clear(&self) -> Result<()> {
        self.pool.clear()
    }

    pub fn close(&self) -> Result<()> {
        self.pool.close()
    }

    pub fn is_closed(&self) -> bool {
        self.pool.is_closed()
    }

    // == Pool Access ==
    /// Takes the pool lock for composing several operations atomically.
    pub fn lock(&self) -> PoolGuard<'_, K, V> {
        self.pool.lock()
    }

    pub fn pool(&self) -> &Arc<Pool<K, V>> {
        &self.pool
    }

    pub fn executor(&self) -> &AsyncExecutor {
        &self.executor
    }

    /// Starts a periodic sweep of expired entries.
    pub fn spawn_vacate_task(&self, interval: Duration) -> JoinHandle<()> {
        spawn_vacate_task(Arc::clone(&self.pool), interval)
    }

    // == Properties ==
    pub fn get_property(&self, name: &str) -> Option<Value> {
        self.properties.get(name)
    }

    /// Returns the previous value, if any.
    pub fn set_property(&self, name: impl Into<String>, value: impl Into<Value>) -> Option<Value> {
        self.properties.set(name, value)
    }

    /// Returns the removed value, if any.
    pub fn remove_property(&self, name: &str) -> Option<Value> {
        self.properties.remove(name)
    }

    pub fn properties(&self) -> &PropertyBag {
        &self.properties
    }

    // == Async Operations ==
    pub fn async_get(&self, key: K) -> CacheTask<Option<V>> {
        self.submit(move |pool| pool.get(&key))
    }

    pub fn async_contains_key(&self, key: K) -> CacheTask<bool> {
        self.submit(move |pool| pool.contains_key(&key))
    }

    pub fn async_put(&self, key: K, value: V) -> CacheTask<bool> {
        let (live_time, max_idle_time) = (self.live_time, self.max_idle_time);
        self.submit(move |pool| pool.put(key, value, live_time, max_idle_time))
    }

    pub fn async_put_with(
        &self,
        key: K,
        value: V,
        live_time: Duration,
        max_idle_time: Duration,
    ) -> CacheTask<bool> {
        self.submit(move |pool| pool.put(key, value, live_time, max_idle_time))
    }

    pub fn async_put_entry(&self, key: K, entry: PoolEntry<V>) -> CacheTask<bool> {
        self.submit(move |pool| pool.insert(key, entry))
    }

    pub fn async_remove(&self, key: K) -> CacheTask<bool> {
        self.submit(move |pool| pool.remove(&key))
    }

    pub fn async_vacate(&self) -> CacheTask<usize> {
        self.submit(|pool| pool.vacate())
    }

    pub fn async_clear(&self) -> CacheTask<()> {
        self.submit(|pool| pool.clear())
    }

    pub fn async_close(&self) -> CacheTask<()> {
        self.submit(|pool| pool.close())
    }

    fn submit<T, F>(&self, op: F) -> CacheTask<T>
    where
        T: Send + 'static,
        F: FnOnce(&Pool<K, V>) -> Result<T> + Send + 'static,
    {
        let pool = Arc::clone(&self.pool);
        self.executor.submit(move || op(&pool))
    }
}

impl<K, V> Clone for Cache<K, V> {
    fn clone(&self) -> Self {
        Self {
            pool: Arc::clone(&self.pool),
            live_time: self.live_time,
            max_idle_time: self.max_idle_time,
            properties: Arc::clone(&self.properties),
            executor: self.executor.clone(),
        }
    }
}

impl<K, V> fmt::Debug for Cache<K, V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Cache")
            .field("pool", &self.pool)
            .field("live_time", &self.live_time)
            .field("max_idle_time", &self.max_idle_time)
            .field("workers", &self.executor.workers())
            .finish()
    }
}
