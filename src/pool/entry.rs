//! Pool Entry Module
//!
//! Defines the wrapper a value lives in while admitted to a pool, and the
//! `Poolable` capability values implement to take part in their own
//! lifecycle.

use std::fmt;
use std::time::Duration;

use crate::error::DestroyError;
use crate::pool::{ActivityPrint, UNBOUNDED};

/// Callback run exactly once when an entry leaves the pool.
pub type EvictHook<V> = Box<dyn FnOnce(&V) -> Result<(), DestroyError> + Send>;

// == Poolable ==
/// Capability of a value that manages its own resources.
///
/// A poolable value may report its own [`ActivityPrint`]; returning `None`
/// lets the pool manage timing. [`destroy`](Poolable::destroy) is called
/// once, when the entry holding the value is evicted, and never
/// concurrently with another eviction of the same entry.
pub trait Poolable {
    /// Timing the value wants to be admitted with.
    fn activity_print(&self) -> Option<ActivityPrint> {
        None
    }

    /// Releases the value's resources.
    fn destroy(&self) -> Result<(), DestroyError>;
}

// == Pool Entry ==
/// A value together with its activity print and optional eviction hook.
pub struct PoolEntry<V> {
    value: V,
    print: ActivityPrint,
    on_evict: Option<EvictHook<V>>,
}

impl<V> PoolEntry<V> {
    /// Wraps a value that never expires by time.
    ///
    /// Only capacity pressure or explicit removal will evict it.
    pub fn wrap(value: V) -> Self {
        Self::wrap_with(value, UNBOUNDED, UNBOUNDED)
    }

    /// Wraps a value with explicit lifetime and idle limits.
    pub fn wrap_with(value: V, live_time: Duration, max_idle_time: Duration) -> Self {
        Self::from_print(value, ActivityPrint::new(live_time, max_idle_time))
    }

    /// Wraps a value with an existing activity print.
    pub fn from_print(value: V, print: ActivityPrint) -> Self {
        Self {
            value,
            print,
            on_evict: None,
        }
    }

    /// Installs the hook run on eviction, replacing any previous one.
    pub fn on_evict<F>(mut self, hook: F) -> Self
    where
        F: FnOnce(&V) -> Result<(), DestroyError> + Send + 'static,
    {
        self.on_evict = Some(Box::new(hook));
        self
    }

    pub fn value(&self) -> &V {
        &self.value
    }

    pub fn activity_print(&self) -> &ActivityPrint {
        &self.print
    }

    pub fn has_evict_hook(&self) -> bool {
        self.on_evict.is_some()
    }

    pub(crate) fn print_mut(&mut self) -> &mut ActivityPrint {
        &mut self.print
    }

    // == Destroy ==
    /// Consumes the entry, running its hook if one is installed.
    pub(crate) fn destroy(self) -> Result<(), DestroyError> {
        match self.on_evict {
            Some(hook) => hook(&self.value),
            None => Ok(()),
        }
    }
}

impl<V: Poolable + 'static> PoolEntry<V> {
    /// Wraps a poolable value.
    ///
    /// Uses the value's own activity print when it reports one and never
    /// expires by time otherwise. [`Poolable::destroy`] becomes the eviction
    /// hook.
    pub fn poolable(value: V) -> Self {
        let print = value
            .activity_print()
            .unwrap_or_else(ActivityPrint::unbounded);
        Self::from_print(value, print).on_evict(|v: &V| v.destroy())
    }

    /// Wraps a poolable value, falling back to the given limits when the
    /// value does not report its own print.
    pub fn poolable_with(value: V, live_time: Duration, max_idle_time: Duration) -> Self {
        let print = value
            .activity_print()
            .unwrap_or_else(|| ActivityPrint::new(live_time, max_idle_time));
        Self::from_print(value, print).on_evict(|v: &V| v.destroy())
    }
}

impl<V: fmt::Debug> fmt::Debug for PoolEntry<V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PoolEntry")
            .field("value", &self.value)
            .field("print", &self.print)
            .field("on_evict", &self.on_evict.is_some())
            .finish()
    }
}
