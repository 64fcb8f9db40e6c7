//! Error types for the pool engine
//!
//! Provides unified error handling using thiserror.

use thiserror::Error;

/// Error raised by a value's destroy hook.
pub type DestroyError = Box<dyn std::error::Error + Send + Sync>;

// == Pool Error Enum ==
/// Unified error type for pool and cache operations.
///
/// Misses and capacity rejections are not errors; they are reported through
/// `Ok(None)` and `Ok(false)` respectively.
#[derive(Error, Debug)]
pub enum PoolError {
    /// The pool was closed and no longer accepts mutating calls
    #[error("Pool is closed")]
    Closed,

    /// Construction parameters were rejected
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// One or more destroy hooks failed while evicting entries.
    ///
    /// The evictions themselves are not rolled back.
    #[error("Destroy hook failed for {failed} evicted entries: {source}")]
    Destroy {
        /// Number of hooks that failed during the operation
        failed: usize,
        /// First failure observed
        #[source]
        source: DestroyError,
    },

    /// The async task was cancelled before its result was delivered
    #[error("Task cancelled")]
    Cancelled,

    /// The delegated operation panicked on a worker thread
    #[error("Task failed: {0}")]
    TaskFailed(String),
}

// == Result Type Alias ==
/// Convenience Result type for the pool engine.
pub type Result<T> = std::result::Result<T, PoolError>;

// == Hook Failures ==
/// Collects destroy hook failures across one operation.
///
/// Eviction keeps going after a failed hook; the failures are reported
/// once the operation has finished touching storage.
#[derive(Debug, Default)]
pub(crate) struct HookFailures {
    first: Option<DestroyError>,
    failed: usize,
}

impl HookFailures {
    pub(crate) fn record(&mut self, err: DestroyError) {
        self.failed += 1;
        if self.first.is_none() {
            self.first = Some(err);
        }
    }

    pub(crate) fn into_result(self) -> Result<()> {
        match self.first {
            Some(source) => Err(PoolError::Destroy {
                failed: self.failed,
                source,
            }),
            None => Ok(()),
        }
    }
}
