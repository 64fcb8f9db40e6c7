//! Async Executor Module
//!
//! Bounded worker pool that runs blocking pool operations off the caller's
//! thread and hands back cancellable futures.

use std::future::Future;
use std::pin::Pin;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::task::{Context, Poll};

use tokio::runtime::Handle;
use tokio::sync::Semaphore;
use tokio::task::JoinHandle;
use tracing::debug;

use crate::error::{PoolError, Result};

/// Default number of operations allowed to run at once.
pub const DEFAULT_WORKERS: usize = 4;

// == Async Executor ==
/// Runs submitted work on tokio's blocking thread pool, at most `workers`
/// units at a time. Work beyond that waits in an unbounded queue.
#[derive(Debug, Clone)]
pub struct AsyncExecutor {
    permits: Arc<Semaphore>,
    workers: usize,
    handle: Handle,
}

impl AsyncExecutor {
    /// Creates an executor bound to the current tokio runtime.
    pub fn new(workers: usize) -> Result<Self> {
        let handle = Handle::try_current().map_err(|_| {
            PoolError::InvalidConfig("AsyncExecutor requires a tokio runtime".to_string())
        })?;
        Self::with_handle(workers, handle)
    }

    /// Creates an executor that spawns onto the given runtime.
    pub fn with_handle(workers: usize, handle: Handle) -> Result<Self> {
        if workers == 0 {
            return Err(PoolError::InvalidConfig(
                "workers must be greater than 0".to_string(),
            ));
        }

        Ok(Self {
            permits: Arc::new(Semaphore::new(workers)),
            workers,
            handle,
        })
    }

    pub fn workers(&self) -> usize {
        self.workers
    }

    /// Workers not currently running an operation.
    pub fn idle_workers(&self) -> usize {
        self.permits.available_permits()
    }

    // == Submit ==
    /// Queues `work` and returns a future for its result immediately.
    ///
    /// Work cancelled before a worker picks it up never runs. Work already
    /// running completes, but its result is replaced by
    /// [`PoolError::Cancelled`]. A panic inside `work` resolves the future to
    /// [`PoolError::TaskFailed`] and leaves the worker usable.
    pub fn submit<T, F>(&self, work: F) -> CacheTask<T>
    where
        T: Send + 'static,
        F: FnOnce() -> Result<T> + Send + 'static,
    {
        let cancelled = Arc::new(AtomicBool::new(false));
        let permits = Arc::clone(&self.permits);
        let flag = Arc::clone(&cancelled);

        let handle = self.handle.spawn(async move {
            let permit = permits
                .acquire_owned()
                .await
                .map_err(|_| PoolError::Cancelled)?;

            // The worker slot stays taken until the blocking work returns,
            // even if this task is aborted while awaiting it.
            let start_flag = Arc::clone(&flag);
            let result = tokio::task::spawn_blocking(move || {
                let _permit = permit;
                if start_flag.load(Ordering::SeqCst) {
                    return Err(PoolError::Cancelled);
                }
                work()
            })
            .await
            .map_err(|err| PoolError::TaskFailed(err.to_string()))?;

            if flag.load(Ordering::SeqCst) {
                debug!("Discarding result of cancelled task");
                return Err(PoolError::Cancelled);
            }
            result
        });

        CacheTask { handle, cancelled }
    }
}

// == Cache Task ==
/// Future returned by async cache operations.
///
/// Resolves to the operation's result. Dropping the task does not cancel
/// it; call [`cancel`](CacheTask::cancel) for that.
#[derive(Debug)]
pub struct CacheTask<T> {
    handle: JoinHandle<Result<T>>,
    cancelled: Arc<AtomicBool>,
}

impl<T> CacheTask<T> {
    /// Requests cancellation.
    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::SeqCst);
        self.handle.abort();
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::SeqCst)
    }

    /// Whether the task has produced its result.
    pub fn is_finished(&self) -> bool {
        self.handle.is_finished()
    }
}

impl<T> Future for CacheTask<T> {
    type Output = Result<T>;

    fn poll(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        match Pin::new(&mut self.handle).poll(cx) {
            Poll::Pending => Poll::Pending,
            Poll::Ready(Ok(result)) => Poll::Ready(result),
            Poll::Ready(Err(err)) if err.is_cancelled() => Poll::Ready(Err(PoolError::Cancelled)),
            Poll::Ready(Err(err)) => Poll::Ready(Err(PoolError::TaskFailed(err.to_string()))),
        }
    }
}
