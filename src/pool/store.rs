//! Pool Store Module
//!
//! Main pool engine: fixed-capacity storage guarded by a reentrant lock,
//! expiry sweeps, counters and lifecycle.

use std::cell::RefCell;
use std::collections::HashMap;
use std::any::Any;
use std::fmt;
use std::hash::Hash;
use std::panic::{self, AssertUnwindSafe};
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::time::{Duration, Instant};

use chrono::Utc;
use parking_lot::{ReentrantMutex, ReentrantMutexGuard};
use tracing::{debug, info, warn};

use crate::error::{DestroyError, HookFailures, PoolError, Result};
use crate::pool::{ActivityPrint, PoolEntry, PoolStats};

type Entries<K, V> = RefCell<HashMap<K, PoolEntry<V>>>;

const INITIAL_CAPACITY_HINT: usize = 1024;

// == Overflow Policy ==
/// What a put does when the pool is full after the expiry sweep.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum OverflowPolicy {
    /// Refuse the new entry; live data is never dropped to make room.
    #[default]
    Reject,
    /// Evict the live entry with the oldest last access to make room.
    EvictLeastRecentlyUsed,
}

impl OverflowPolicy {
    /// Parses `reject` or `lru` (case-insensitive).
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "reject" => Some(Self::Reject),
            "lru" | "evict-lru" => Some(Self::EvictLeastRecentlyUsed),
            _ => None,
        }
    }
}

#[derive(Debug, Default)]
struct Counters {
    puts: AtomicU64,
    hits: AtomicU64,
    misses: AtomicU64,
    evictions: AtomicU64,
}

// == Pool ==
/// Bounded key/value storage with per-entry expiry.
///
/// Every operation runs under one reentrant lock. Callers that need several
/// operations to happen atomically take the lock with [`Pool::lock`] and
/// issue them on the returned [`PoolGuard`]; the owning thread may still call
/// methods on the pool itself while holding the guard.
///
/// Destroy hooks run under the lock, after their entry has left storage.
pub struct Pool<K, V> {
    entries: ReentrantMutex<Entries<K, V>>,
    capacity: usize,
    overflow: OverflowPolicy,
    counters: Counters,
    closed: AtomicBool,
}

impl<K, V> Pool<K, V>
where
    K: Eq + Hash + Clone,
    V: Clone,
{
    // == Constructors ==
    /// Creates a pool that rejects insertions once full.
    pub fn new(capacity: usize) -> Result<Self> {
        Self::with_policy(capacity, OverflowPolicy::Reject)
    }

    /// Creates a pool with an explicit overflow policy.
    pub fn with_policy(capacity: usize, overflow: OverflowPolicy) -> Result<Self> {
        if capacity == 0 {
            return Err(PoolError::InvalidConfig(
                "capacity must be greater than 0".to_string(),
            ));
        }

        Ok(Self {
            entries: ReentrantMutex::new(RefCell::new(HashMap::with_capacity(
                capacity.min(INITIAL_CAPACITY_HINT),
            ))),
            capacity,
            overflow,
            counters: Counters::default(),
            closed: AtomicBool::new(false),
        })
    }

    // == Lock ==
    /// Acquires the pool lock, blocking until it is available.
    ///
    /// The lock is released when the guard is dropped.
    pub fn lock(&self) -> PoolGuard<'_, K, V> {
        PoolGuard {
            pool: self,
            entries: self.entries.lock(),
        }
    }

    // == Delegating Operations ==
    /// See [`PoolGuard::put`].
    pub fn put(&self, key: K, value: V, live_time: Duration, max_idle_time: Duration) -> Result<bool> {
        self.lock().put(key, value, live_time, max_idle_time)
    }

    /// See [`PoolGuard::insert`].
    pub fn insert(&self, key: K, entry: PoolEntry<V>) -> Result<bool> {
        self.lock().insert(key, entry)
    }

    /// See [`PoolGuard::get`].
    pub fn get(&self, key: &K) -> Result<Option<V>> {
        self.lock().get(key)
    }

    /// See [`PoolGuard::remove`].
    pub fn remove(&self, key: &K) -> Result<bool> {
        self.lock().remove(key)
    }

    /// See [`PoolGuard::contains_key`].
    pub fn contains_key(&self, key: &K) -> Result<bool> {
        self.lock().contains_key(key)
    }

    /// See [`PoolGuard::vacate`].
    pub fn vacate(&self) -> Result<usize> {
        self.lock().vacate()
    }

    /// See [`PoolGuard::clear`].
    pub fn clear(&self) -> Result<()> {
        self.lock().clear()
    }

    /// See [`PoolGuard::close`].
    pub fn close(&self) -> Result<()> {
        self.lock().close()
    }

    /// See [`PoolGuard::keys`].
    pub fn keys(&self) -> Vec<K> {
        self.lock().keys()
    }

    /// See [`PoolGuard::activity_print`].
    pub fn activity_print(&self, key: &K) -> Option<ActivityPrint> {
        self.lock().activity_print(key)
    }

    /// See [`PoolGuard::stats`].
    pub fn stats(&self) -> PoolStats {
        self.lock().stats()
    }

    pub fn size(&self) -> usize {
        self.lock().size()
    }

    pub fn is_empty(&self) -> bool {
        self.size() == 0
    }
}

impl<K, V> Pool<K, V> {
    // == Lock-free Reads ==
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn overflow_policy(&self) -> OverflowPolicy {
        self.overflow
    }

    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::Acquire)
    }

    pub fn put_count(&self) -> u64 {
        self.counters.puts.load(Ordering::Relaxed)
    }

    pub fn hit_count(&self) -> u64 {
        self.counters.hits.load(Ordering::Relaxed)
    }

    pub fn miss_count(&self) -> u64 {
        self.counters.misses.load(Ordering::Relaxed)
    }

    pub fn eviction_count(&self) -> u64 {
        self.counters.evictions.load(Ordering::Relaxed)
    }
}

impl<K, V> fmt::Debug for Pool<K, V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Pool")
            .field("capacity", &self.capacity)
            .field("overflow", &self.overflow)
            .field("counters", &self.counters)
            .field("closed", &self.is_closed())
            .finish()
    }
}

// == Pool Guard ==
/// Scoped ownership of the pool lock.
///
/// All storage access goes through a guard; the pool's own methods simply
/// take one for the duration of the call.
pub struct PoolGuard<'a, K, V> {
    pool: &'a Pool<K, V>,
    entries: ReentrantMutexGuard<'a, Entries<K, V>>,
}

impl<'a, K, V> PoolGuard<'a, K, V>
where
    K: Eq + Hash + Clone,
    V: Clone,
{
    // == Put ==
    /// Stores `value` under `key` with the given limits.
    ///
    /// Returns `Ok(false)` when the pool is full and nothing could be
    /// reclaimed.
    pub fn put(&self, key: K, value: V, live_time: Duration, max_idle_time: Duration) -> Result<bool> {
        self.insert(key, PoolEntry::wrap_with(value, live_time, max_idle_time))
    }

    // == Insert ==
    /// Admits a prebuilt entry.
    ///
    /// An existing entry under the same key is evicted first (its hook runs).
    /// A new key on a full pool triggers an expiry sweep and, under
    /// [`OverflowPolicy::EvictLeastRecentlyUsed`], the eviction of the least
    /// recently used entry. If a hook fails during either step the new entry
    /// is not admitted and the failure is returned.
    pub fn insert(&self, key: K, entry: PoolEntry<V>) -> Result<bool> {
        self.ensure_open()?;

        let now = Instant::now();
        let mut failures = HookFailures::default();

        let previous = self.entries.borrow_mut().remove(&key);
        match previous {
            Some(previous) => self.evict(previous, &mut failures),
            None if self.size() >= self.pool.capacity => self.make_room(now, &mut failures),
            None => {}
        }
        failures.into_result()?;

        // Hooks may have re-entered the pool, so capacity is checked last.
        if self.size() >= self.pool.capacity {
            warn!(
                capacity = self.pool.capacity,
                "Pool at capacity, insertion rejected"
            );
            return Ok(false);
        }

        self.entries.borrow_mut().insert(key, entry);
        self.pool.counters.puts.fetch_add(1, Ordering::Relaxed);
        Ok(true)
    }

    // == Get ==
    /// Retrieves a clone of the value stored under `key`.
    ///
    /// An expired entry is evicted and reported as a miss. A hit refreshes
    /// the entry's idle clock. If the evicted entry's hook fails, the miss
    /// is still counted and the failure is returned.
    pub fn get(&self, key: &K) -> Result<Option<V>> {
        self.ensure_open()?;

        let mut failures = HookFailures::default();
        let value = self.read_fresh(key, Instant::now(), &mut failures, |entry, now| {
            entry.print_mut().touch(now);
            entry.value().clone()
        });

        let counter = if value.is_some() {
            &self.pool.counters.hits
        } else {
            &self.pool.counters.misses
        };
        counter.fetch_add(1, Ordering::Relaxed);
        failures.into_result()?;
        Ok(value)
    }

    // == Contains Key ==
    /// Probes for a live entry without counting a hit or miss.
    ///
    /// Expired entries are evicted just like in [`get`](Self::get).
    pub fn contains_key(&self, key: &K) -> Result<bool> {
        self.ensure_open()?;

        let mut failures = HookFailures::default();
        let found = self
            .read_fresh(key, Instant::now(), &mut failures, |_, _| ())
            .is_some();
        failures.into_result()?;
        Ok(found)
    }

    // == Remove ==
    /// Evicts the entry under `key` if there is one.
    ///
    /// Returns whether an entry was removed.
    pub fn remove(&self, key: &K) -> Result<bool> {
        self.ensure_open()?;

        let removed = self.entries.borrow_mut().remove(key);
        match removed {
            Some(entry) => {
                let mut failures = HookFailures::default();
                self.evict(entry, &mut failures);
                failures.into_result()?;
                Ok(true)
            }
            None => Ok(false),
        }
    }

    // == Vacate ==
    /// Evicts every expired entry.
    ///
    /// Returns the number of entries removed.
    pub fn vacate(&self) -> Result<usize> {
        self.ensure_open()?;

        let mut failures = HookFailures::default();
        let removed = self.sweep(Instant::now(), &mut failures);
        debug!(removed, remaining = self.size(), "Vacated expired entries");

        failures.into_result()?;
        Ok(removed)
    }

    // == Clear ==
    /// Evicts every entry regardless of expiry. Counters are kept.
    pub fn clear(&self) -> Result<()> {
        self.ensure_open()?;

        let mut failures = HookFailures::default();
        let cleared = self.evict_all(&mut failures);
        debug!(cleared, "Cleared pool");
        failures.into_result()
    }

    // == Close ==
    /// Evicts every entry and refuses further mutation.
    ///
    /// Closing an already closed pool does nothing.
    pub fn close(&self) -> Result<()> {
        if self.pool.closed.swap(true, Ordering::AcqRel) {
            return Ok(());
        }

        let mut failures = HookFailures::default();
        let evicted = self.evict_all(&mut failures);
        info!(evicted, "Pool closed");
        failures.into_result()
    }

    // == Read-only Views ==
    /// Snapshot of the keys whose entries have not expired.
    pub fn keys(&self) -> Vec<K> {
        let now = Instant::now();
        self.entries
            .borrow()
            .iter()
            .filter(|(_, entry)| !entry.activity_print().is_expired(now))
            .map(|(key, _)| key.clone())
            .collect()
    }

    /// Copy of the activity print stored under `key`, expired or not.
    pub fn activity_print(&self, key: &K) -> Option<ActivityPrint> {
        self.entries
            .borrow()
            .get(key)
            .map(|entry| *entry.activity_print())
    }

    /// Counters and size as of this moment.
    pub fn stats(&self) -> PoolStats {
        PoolStats {
            put_count: self.pool.put_count(),
            hits: self.pool.hit_count(),
            misses: self.pool.miss_count(),
            evictions: self.pool.eviction_count(),
            size: self.size(),
            capacity: self.pool.capacity,
            captured_at: Utc::now(),
        }
    }

    pub fn size(&self) -> usize {
        self.entries.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.size() == 0
    }

    // == Internals ==
    fn ensure_open(&self) -> Result<()> {
        if self.pool.is_closed() {
            return Err(PoolError::Closed);
        }
        Ok(())
    }

    /// Runs `read` on the entry under `key` if it is still live.
    ///
    /// An expired entry is removed and evicted, and reads as absent.
    fn read_fresh<R>(
        &self,
        key: &K,
        now: Instant,
        failures: &mut HookFailures,
        read: impl FnOnce(&mut PoolEntry<V>, Instant) -> R,
    ) -> Option<R> {
        let expired = {
            let mut entries = self.entries.borrow_mut();
            let is_expired = entries.get(key)?.activity_print().is_expired(now);
            if !is_expired {
                let entry = entries.get_mut(key)?;
                return Some(read(entry, now));
            }
            entries.remove(key)
        };

        if let Some(entry) = expired {
            debug!("Evicting expired entry on read");
            self.evict(entry, failures);
        }
        None
    }

    fn make_room(&self, now: Instant, failures: &mut HookFailures) {
        self.sweep(now, failures);
        if self.size() < self.pool.capacity {
            return;
        }

        if self.pool.overflow == OverflowPolicy::EvictLeastRecentlyUsed {
            let victim = self
                .entries
                .borrow()
                .iter()
                .min_by_key(|(_, entry)| entry.activity_print().last_accessed_at())
                .map(|(key, _)| key.clone());

            if let Some(victim) = victim {
                let removed = self.entries.borrow_mut().remove(&victim);
                if let Some(entry) = removed {
                    debug!("Evicting least recently used entry to make room");
                    self.evict(entry, failures);
                }
            }
        }
    }

    fn sweep(&self, now: Instant, failures: &mut HookFailures) -> usize {
        let expired: Vec<PoolEntry<V>> = {
            let mut entries = self.entries.borrow_mut();
            let keys: Vec<K> = entries
                .iter()
                .filter(|(_, entry)| entry.activity_print().is_expired(now))
                .map(|(key, _)| key.clone())
                .collect();
            keys.iter().filter_map(|key| entries.remove(key)).collect()
        };

        let removed = expired.len();
        for entry in expired {
            self.evict(entry, failures);
        }
        removed
    }

    fn evict_all(&self, failures: &mut HookFailures) -> usize {
        let drained: Vec<PoolEntry<V>> = self
            .entries
            .borrow_mut()
            .drain()
            .map(|(_, entry)| entry)
            .collect();

        let evicted = drained.len();
        for entry in drained {
            self.evict(entry, failures);
        }
        evicted
    }

    /// Counts the eviction and runs the entry's hook.
    ///
    /// The entry must already be out of storage, and no `RefCell` borrow may
    /// be held, so the hook can call back into the pool. A panicking hook is
    /// recorded as a failure so the remaining evictions still run.
    fn evict(&self, entry: PoolEntry<V>, failures: &mut HookFailures) {
        self.pool.counters.evictions.fetch_add(1, Ordering::Relaxed);
        let outcome = panic::catch_unwind(AssertUnwindSafe(move || entry.destroy()))
            .unwrap_or_else(|payload| Err(hook_panic(payload)));
        if let Err(err) = outcome {
            warn!(error = %err, "Destroy hook failed during eviction");
            failures.record(err);
        }
    }
}

fn hook_panic(payload: Box<dyn Any + Send>) -> DestroyError {
    let message = payload
        .downcast_ref::<&str>()
        .map(|s| s.to_string())
        .or_else(|| payload.downcast_ref::<String>().cloned())
        .unwrap_or_else(|| "unknown panic".to_string());
    format!("destroy hook panicked: {}", message).into()
}
