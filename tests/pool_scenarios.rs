//! Integration Tests for Pool Expiry and Lifecycle
//!
//! Exercises capacity rejection, lifetime and idle expiry, and destroy
//! hooks through the public API.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::thread::sleep;
use std::time::Duration;

use timed_pool::{ActivityPrint, DestroyError, Pool, PoolEntry, PoolError, Poolable, UNBOUNDED};

// == Helpers ==

fn ms(n: u64) -> Duration {
    Duration::from_millis(n)
}

/// A value owning an external resource, counted on release.
#[derive(Clone)]
struct Session {
    id: u32,
    released: Arc<AtomicUsize>,
}

impl Poolable for Session {
    fn destroy(&self) -> Result<(), DestroyError> {
        self.released.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

/// A value that dictates its own timing.
#[derive(Clone)]
struct Lease {
    print: ActivityPrint,
}

impl Poolable for Lease {
    fn activity_print(&self) -> Option<ActivityPrint> {
        Some(self.print)
    }

    fn destroy(&self) -> Result<(), DestroyError> {
        Ok(())
    }
}

// == Capacity ==

#[test]
fn test_full_pool_rejects_live_data() {
    timed_pool::telemetry::init_tracing();
    let pool: Pool<&str, i32> = Pool::new(2).unwrap();

    assert!(pool.put("a", 1, ms(1000), ms(1000)).unwrap());
    assert!(pool.put("b", 2, ms(1000), ms(1000)).unwrap());
    assert!(!pool.put("c", 3, ms(1000), ms(1000)).unwrap());

    assert_eq!(pool.size(), 2);
    assert_eq!(pool.get(&"a").unwrap(), Some(1));
    assert_eq!(pool.get(&"b").unwrap(), Some(2));
    assert_eq!(pool.get(&"c").unwrap(), None);
}

// == Lifetime Expiry ==

#[test]
fn test_lifetime_expiry_on_get() {
    let pool: Pool<&str, i32> = Pool::new(2).unwrap();

    pool.put("a", 1, ms(50), UNBOUNDED).unwrap();
    sleep(ms(60));

    assert_eq!(pool.get(&"a").unwrap(), None);
    assert_eq!(pool.eviction_count(), 1);
    assert!(!pool.contains_key(&"a").unwrap());
}

// == Idle Expiry ==

#[test]
fn test_access_resets_idle_clock() {
    let pool: Pool<&str, i32> = Pool::new(2).unwrap();

    pool.put("a", 1, ms(1000), ms(30)).unwrap();
    sleep(ms(10));
    assert_eq!(pool.get(&"a").unwrap(), Some(1));
    sleep(ms(10));
    assert_eq!(pool.get(&"a").unwrap(), Some(1));
    sleep(ms(40));
    assert_eq!(pool.get(&"a").unwrap(), None);
}

#[test]
fn test_regular_access_outlives_idle_limit_until_lifetime() {
    let pool: Pool<&str, i32> = Pool::new(1).unwrap();
    pool.put("a", 1, ms(300), ms(60)).unwrap();

    // Touch every max_idle/2 well past the naive idle deadline
    for _ in 0..5 {
        sleep(ms(20));
        assert_eq!(pool.get(&"a").unwrap(), Some(1), "touch keeps the entry alive");
    }
    assert_eq!(pool.activity_print(&"a").unwrap().access_count(), 5);

    // Keep touching until the lifetime runs out
    let mut lookups = 0;
    while pool.get(&"a").unwrap().is_some() {
        lookups += 1;
        assert!(lookups < 100, "entry outlived its lifetime");
        sleep(ms(20));
    }
    assert_eq!(pool.eviction_count(), 1);
}

// == Destroy Hooks ==

#[test]
fn test_destroy_counts_distinct_evicted_keys() {
    let released = Arc::new(AtomicUsize::new(0));
    let session = |id| Session {
        id,
        released: Arc::clone(&released),
    };
    let pool: Pool<u32, Session> = Pool::new(10).unwrap();

    // Expiry
    pool.insert(1, PoolEntry::poolable_with(session(1), ms(20), UNBOUNDED))
        .unwrap();
    pool.insert(2, PoolEntry::poolable(session(2))).unwrap();
    sleep(ms(30));
    assert_eq!(pool.get(&1).unwrap().map(|s| s.id), None);
    assert_eq!(released.load(Ordering::SeqCst), 1);

    // Clear
    pool.insert(3, PoolEntry::poolable(session(3))).unwrap();
    pool.clear().unwrap();
    assert_eq!(released.load(Ordering::SeqCst), 3);

    // Close, twice
    pool.insert(4, PoolEntry::poolable(session(4))).unwrap();
    pool.insert(5, PoolEntry::poolable(session(5))).unwrap();
    pool.close().unwrap();
    pool.close().unwrap();
    assert_eq!(released.load(Ordering::SeqCst), 5);
    assert_eq!(pool.eviction_count(), 5);
}

#[test]
fn test_poolable_value_supplies_timing() {
    let pool: Pool<&str, Lease> = Pool::new(4).unwrap();
    let lease = Lease {
        print: ActivityPrint::new(ms(20), UNBOUNDED),
    };

    pool.insert("lease", PoolEntry::poolable_with(lease, UNBOUNDED, UNBOUNDED))
        .unwrap();
    sleep(ms(30));

    assert_eq!(pool.vacate().unwrap(), 1);
    assert!(pool.is_empty());
}

#[test]
fn test_failed_hook_is_surfaced_to_vacate() {
    let pool: Pool<&str, i32> = Pool::new(4).unwrap();
    let failing = PoolEntry::wrap_with(1, ms(10), UNBOUNDED).on_evict(|_| Err("fd close failed".into()));
    pool.insert("bad", failing).unwrap();
    pool.put("short", 2, ms(10), UNBOUNDED).unwrap();
    pool.put("good", 3, UNBOUNDED, UNBOUNDED).unwrap();
    sleep(ms(20));

    match pool.vacate() {
        Err(PoolError::Destroy { failed, source }) => {
            assert_eq!(failed, 1);
            assert_eq!(source.to_string(), "fd close failed");
        }
        other => panic!("expected destroy failure, got {:?}", other.map(|_| ())),
    }

    // Both expired entries are gone regardless
    assert_eq!(pool.keys(), vec!["good"]);
    assert_eq!(pool.eviction_count(), 2);
}

#[test]
fn test_failed_hook_is_surfaced_to_expiring_read() {
    let pool: Pool<&str, i32> = Pool::new(4).unwrap();
    let failing = || PoolEntry::wrap_with(1, ms(10), UNBOUNDED).on_evict(|_| Err("fd close failed".into()));
    pool.insert("read", failing()).unwrap();
    pool.insert("checked", failing()).unwrap();
    sleep(ms(20));

    match pool.get(&"read") {
        Err(PoolError::Destroy { failed, source }) => {
            assert_eq!(failed, 1);
            assert_eq!(source.to_string(), "fd close failed");
        }
        other => panic!("expected destroy failure, got {:?}", other),
    }
    assert!(matches!(
        pool.contains_key(&"checked"),
        Err(PoolError::Destroy { failed: 1, .. })
    ));

    assert!(pool.is_empty());
    assert_eq!(pool.miss_count(), 1);
    assert_eq!(pool.eviction_count(), 2);
}

// == Idempotence ==

#[test]
fn test_remove_absent_key_is_noop() {
    let pool: Pool<&str, i32> = Pool::new(2).unwrap();
    pool.put("a", 1, UNBOUNDED, UNBOUNDED).unwrap();

    assert!(!pool.remove(&"missing").unwrap());
    assert_eq!(pool.size(), 1);
    assert_eq!(pool.eviction_count(), 0);
    assert_eq!(pool.hit_count() + pool.miss_count(), 0);
}

#[test]
fn test_close_twice_matches_close_once() {
    let once: Pool<&str, i32> = Pool::new(2).unwrap();
    let twice: Pool<&str, i32> = Pool::new(2).unwrap();
    for pool in [&once, &twice] {
        pool.put("a", 1, UNBOUNDED, UNBOUNDED).unwrap();
    }

    once.close().unwrap();
    twice.close().unwrap();
    twice.close().unwrap();

    assert_eq!(once.is_closed(), twice.is_closed());
    assert_eq!(once.size(), twice.size());
    assert_eq!(once.eviction_count(), twice.eviction_count());
}

// == Concurrency ==

#[test]
fn test_guard_serializes_check_then_insert() {
    let pool: Arc<Pool<u32, u32>> = Arc::new(Pool::new(64).unwrap());
    let winners = Arc::new(AtomicUsize::new(0));

    let handles: Vec<_> = (0..8)
        .map(|thread| {
            let (pool, winners) = (Arc::clone(&pool), Arc::clone(&winners));
            std::thread::spawn(move || {
                let guard = pool.lock();
                if !guard.contains_key(&7).unwrap() {
                    guard.put(7, thread, UNBOUNDED, UNBOUNDED).unwrap();
                    winners.fetch_add(1, Ordering::SeqCst);
                }
            })
        })
        .collect();

    for handle in handles {
        handle.join().unwrap();
    }
    assert_eq!(winners.load(Ordering::SeqCst), 1);
    assert_eq!(pool.put_count(), 1);
}
