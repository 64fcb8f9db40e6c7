//! Activity Print Module
//!
//! Temporal metadata for a single pool entry: when it was created, when it
//! was last used, how often it was used, and the two limits it expires on.

use std::time::{Duration, Instant};

/// Duration used for limits that never expire.
pub const UNBOUNDED: Duration = Duration::MAX;

// == Activity Print ==
/// Creation time, last access time and access count of one entry, together
/// with its lifetime and idle-time limits.
///
/// An entry expires once it has lived longer than `live_time` or has gone
/// unused for longer than `max_idle_time`, whichever comes first. A limit of
/// [`UNBOUNDED`] disables that check; a limit of zero expires the entry as
/// soon as any time has elapsed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ActivityPrint {
    created_at: Instant,
    last_accessed_at: Instant,
    access_count: u64,
    live_time: Duration,
    max_idle_time: Duration,
}

impl ActivityPrint {
    // == Constructors ==
    /// Creates a print starting now.
    pub fn new(live_time: Duration, max_idle_time: Duration) -> Self {
        Self::starting_at(Instant::now(), live_time, max_idle_time)
    }

    /// Creates a print whose creation and last access are both `now`.
    pub fn starting_at(now: Instant, live_time: Duration, max_idle_time: Duration) -> Self {
        Self {
            created_at: now,
            last_accessed_at: now,
            access_count: 0,
            live_time,
            max_idle_time,
        }
    }

    /// Creates a print that never expires by time.
    pub fn unbounded() -> Self {
        Self::new(UNBOUNDED, UNBOUNDED)
    }

    // == Touch ==
    /// Records an access at `now`.
    pub fn touch(&mut self, now: Instant) {
        self.last_accessed_at = now;
        self.access_count += 1;
    }

    // == Is Expired ==
    /// Checks both limits against a single clock reading.
    ///
    /// Comparisons are strict: an entry whose age equals `live_time` exactly
    /// is still alive.
    pub fn is_expired(&self, now: Instant) -> bool {
        let lived_out = self.live_time != UNBOUNDED && self.age(now) > self.live_time;
        let idled_out = self.max_idle_time != UNBOUNDED && self.idle_for(now) > self.max_idle_time;
        lived_out || idled_out
    }

    /// Time elapsed since creation.
    pub fn age(&self, now: Instant) -> Duration {
        now.saturating_duration_since(self.created_at)
    }

    /// Time elapsed since the last access (or creation if never accessed).
    pub fn idle_for(&self, now: Instant) -> Duration {
        now.saturating_duration_since(self.last_accessed_at)
    }

    /// Remaining lifetime, or `None` if the lifetime is unbounded.
    ///
    /// Idle time is not taken into account.
    pub fn time_to_live(&self, now: Instant) -> Option<Duration> {
        if self.live_time == UNBOUNDED {
            return None;
        }
        Some(self.live_time.saturating_sub(self.age(now)))
    }

    // == Accessors ==
    pub fn created_at(&self) -> Instant {
        self.created_at
    }

    pub fn last_accessed_at(&self) -> Instant {
        self.last_accessed_at
    }

    pub fn access_count(&self) -> u64 {
        self.access_count
    }

    pub fn live_time(&self) -> Duration {
        self.live_time
    }

    pub fn max_idle_time(&self) -> Duration {
        self.max_idle_time
    }
}

impl Default for ActivityPrint {
    fn default() -> Self {
        Self::unbounded()
    }
}

/// Whole milliseconds in `duration`, saturating at `u64::MAX` for
/// [`UNBOUNDED`].
pub(crate) fn saturating_millis(duration: Duration) -> u64 {
    u64::try_from(duration.as_millis()).unwrap_or(u64::MAX)
}
