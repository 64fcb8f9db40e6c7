//! Pool Statistics Module
//!
//! Point-in-time snapshot of a pool's counters.

use chrono::{DateTime, Utc};
use serde::Serialize;

// == Pool Stats ==
/// Snapshot of pool performance counters.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PoolStats {
    /// Number of successful insertions
    pub put_count: u64,
    /// Number of successful retrievals
    pub hits: u64,
    /// Number of failed retrievals (key not found or expired)
    pub misses: u64,
    /// Number of entries that left the pool for any reason
    pub evictions: u64,
    /// Entries stored when the snapshot was taken
    pub size: usize,
    /// Fixed upper bound on stored entries
    pub capacity: usize,
    /// Wall-clock time the snapshot was taken
    pub captured_at: DateTime<Utc>,
}

impl PoolStats {
    // == Hit Rate ==
    /// Calculates the hit rate.
    ///
    /// Returns hits / (hits + misses), or 0.0 if no retrievals have been made.
    pub fn hit_rate(&self) -> f64 {
        let total = self.hits + self.misses;
        if total == 0 {
            0.0
        } else {
            self.hits as f64 / total as f64
        }
    }

    /// Fraction of capacity in use.
    pub fn utilization(&self) -> f64 {
        if self.capacity == 0 {
            0.0
        } else {
            self.size as f64 / self.capacity as f64
        }
    }
}

// == Unit Tests ==
#[cfg(test)]
mod tests {
    use super::*;

    fn stats(hits: u64, misses: u64) -> PoolStats {
        PoolStats {
            put_count: 0,
            hits,
            misses,
            evictions: 0,
            size: 5,
            capacity: 20,
            captured_at: Utc::now(),
        }
    }

    #[test]
    fn test_hit_rate_no_requests() {
        assert_eq!(stats(0, 0).hit_rate(), 0.0);
    }

    #[test]
    fn test_hit_rate_all_hits() {
        assert_eq!(stats(3, 0).hit_rate(), 1.0);
    }

    #[test]
    fn test_hit_rate_all_misses() {
        assert_eq!(stats(0, 2).hit_rate(), 0.0);
    }

    #[test]
    fn test_hit_rate_mixed() {
        assert_eq!(stats(1, 1).hit_rate(), 0.5);
    }

    #[test]
    fn test_utilization() {
        assert_eq!(stats(0, 0).utilization(), 0.25);
    }

    #[test]
    fn test_serializes_counters() {
        let json = serde_json::to_value(stats(4, 1)).unwrap();
        assert_eq!(json["hits"], 4);
        assert_eq!(json["misses"], 1);
        assert_eq!(json["capacity"], 20);
        assert!(json["captured_at"].is_string());
    }
}
