//! Vacate Task
//!
//! Background task that periodically sweeps expired entries out of a pool.

use std::hash::Hash;
use std::sync::Arc;
use std::time::Duration;

use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::error::PoolError;
use crate::pool::{saturating_millis, Pool};

/// Spawns a background task that periodically vacates expired entries.
///
/// The task sleeps for `interval` between sweeps and runs each sweep on the
/// blocking thread pool, since it takes the pool lock and runs destroy
/// hooks. Hook failures are logged and the task carries on; it exits on its
/// own once the pool is closed or every other handle to it is dropped.
///
/// # Returns
/// A JoinHandle for the spawned task, which can be used to abort the task
/// during shutdown.
///
/// # Example
/// ```ignore
/// let pool = Arc::new(Pool::<String, String>::new(1000)?);
/// let vacate_handle = spawn_vacate_task(pool.clone(), Duration::from_secs(60));
/// // Later, during shutdown:
/// vacate_handle.abort();
/// ```
pub fn spawn_vacate_task<K, V>(pool: Arc<Pool<K, V>>, interval: Duration) -> JoinHandle<()>
where
    K: Eq + Hash + Clone + Send + Sync + 'static,
    V: Clone + Send + Sync + 'static,
{
    let pool = Arc::downgrade(&pool);

    tokio::spawn(async move {
        info!(
            interval_ms = saturating_millis(interval),
            "Starting pool vacate task"
        );

        loop {
            // Sleep for the configured interval
            tokio::time::sleep(interval).await;

            let Some(sweep_pool) = pool.upgrade() else {
                debug!("Pool dropped, stopping vacate task");
                break;
            };
            let outcome = tokio::task::spawn_blocking(move || sweep_pool.vacate()).await;

            match outcome {
                Ok(Ok(removed)) if removed > 0 => {
                    info!("Vacate: removed {} expired entries", removed);
                }
                Ok(Ok(_)) => {
                    debug!("Vacate: no expired entries found");
                }
                Ok(Err(PoolError::Closed)) => {
                    info!("Pool closed, stopping vacate task");
                    break;
                }
                Ok(Err(err)) => {
                    warn!(error = %err, "Vacate sweep reported failures");
                }
                Err(err) => {
                    warn!(error = %err, "Vacate sweep panicked");
                }
            }
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    const LONG: Duration = Duration::from_secs(3600);

    fn shared_pool() -> Arc<Pool<String, String>> {
        Arc::new(Pool::new(100).unwrap())
    }

    #[tokio::test]
    async fn test_vacate_task_removes_expired_entries() {
        let pool = shared_pool();

        // Add an entry with very short lifetime
        pool.put(
            "expire_soon".to_string(),
            "value".to_string(),
            Duration::from_millis(50),
            LONG,
        )
        .unwrap();

        let handle = spawn_vacate_task(pool.clone(), Duration::from_millis(100));

        // Wait for entry to expire and a sweep to run
        tokio::time::sleep(Duration::from_millis(350)).await;

        // Removed by the sweep, not by a lookup
        assert_eq!(pool.size(), 0, "Expired entry should have been vacated");
        assert_eq!(pool.eviction_count(), 1);
        assert_eq!(pool.miss_count(), 0);

        handle.abort();
    }

    #[tokio::test]
    async fn test_vacate_task_preserves_valid_entries() {
        let pool = shared_pool();

        pool.put("long_lived".to_string(), "value".to_string(), LONG, LONG)
            .unwrap();

        let handle = spawn_vacate_task(pool.clone(), Duration::from_millis(50));

        tokio::time::sleep(Duration::from_millis(200)).await;

        assert_eq!(pool.get(&"long_lived".to_string()).unwrap(), Some("value".to_string()));

        handle.abort();
    }

    #[tokio::test]
    async fn test_vacate_task_stops_when_pool_closes() {
        let pool = shared_pool();
        let handle = spawn_vacate_task(pool.clone(), Duration::from_millis(20));

        pool.close().unwrap();
        tokio::time::sleep(Duration::from_millis(200)).await;

        assert!(handle.is_finished(), "Task should exit after the pool closes");
    }

    #[tokio::test]
    async fn test_vacate_task_stops_when_pool_dropped() {
        let pool = shared_pool();
        let handle = spawn_vacate_task(pool.clone(), Duration::from_millis(20));

        drop(pool);
        tokio::time::sleep(Duration::from_millis(200)).await;

        assert!(handle.is_finished(), "Task should not keep the pool alive");
    }

    #[tokio::test]
    async fn test_vacate_task_can_be_aborted() {
        let handle = spawn_vacate_task(shared_pool(), Duration::from_secs(1));

        // Abort immediately
        handle.abort();

        tokio::time::sleep(Duration::from_millis(100)).await;
        assert!(handle.is_finished(), "Task should be finished after abort");
    }
}
