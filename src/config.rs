//! Configuration Module
//!
//! Handles loading and validating cache configuration from environment
//! variables.

use std::env;
use std::time::Duration;

use crate::error::{PoolError, Result};
use crate::executor::DEFAULT_WORKERS;
use crate::pool::{OverflowPolicy, DEFAULT_LIVE_TIME, DEFAULT_MAX_IDLE_TIME};

/// Cache configuration parameters.
///
/// All values can be configured via environment variables with sensible defaults.
#[derive(Debug, Clone, PartialEq)]
pub struct CacheConfig {
    /// Maximum number of entries the pool can hold
    pub capacity: usize,
    /// Lifetime applied to puts without explicit limits
    pub live_time: Duration,
    /// Idle limit applied to puts without explicit limits
    pub max_idle_time: Duration,
    /// Behavior when the pool is full after an expiry sweep
    pub overflow_policy: OverflowPolicy,
    /// Async operations allowed to run at once
    pub workers: usize,
    /// Background vacate interval, None disables the task
    pub vacate_interval: Option<Duration>,
}

impl CacheConfig {
    /// Creates a new CacheConfig by loading values from environment variables.
    ///
    /// # Environment Variables
    /// - `POOL_CAPACITY` - Maximum pool entries (default: 1000)
    /// - `CACHE_LIVE_TIME_MS` - Default lifetime in milliseconds (default: 3 hours)
    /// - `CACHE_MAX_IDLE_TIME_MS` - Default idle limit in milliseconds (default: 30 minutes)
    /// - `CACHE_OVERFLOW_POLICY` - `reject` or `lru` (default: reject)
    /// - `CACHE_WORKERS` - Async worker count (default: 4)
    /// - `CACHE_VACATE_INTERVAL_MS` - Background sweep interval, 0 disables (default: 60000)
    pub fn from_env() -> Self {
        let defaults = Self::default();

        Self {
            capacity: parse_var("POOL_CAPACITY").unwrap_or(defaults.capacity),
            live_time: parse_var("CACHE_LIVE_TIME_MS")
                .map(Duration::from_millis)
                .unwrap_or(defaults.live_time),
            max_idle_time: parse_var("CACHE_MAX_IDLE_TIME_MS")
                .map(Duration::from_millis)
                .unwrap_or(defaults.max_idle_time),
            overflow_policy: env::var("CACHE_OVERFLOW_POLICY")
                .ok()
                .and_then(|v| OverflowPolicy::parse(&v))
                .unwrap_or(defaults.overflow_policy),
            workers: parse_var("CACHE_WORKERS").unwrap_or(defaults.workers),
            vacate_interval: match parse_var::<u64>("CACHE_VACATE_INTERVAL_MS") {
                Some(0) => None,
                Some(ms) => Some(Duration::from_millis(ms)),
                None => defaults.vacate_interval,
            },
        }
    }

    /// Rejects values no pool or executor can be built with.
    pub fn validate(&self) -> Result<()> {
        if self.capacity == 0 {
            return Err(PoolError::InvalidConfig(
                "capacity must be greater than 0".to_string(),
            ));
        }
        if self.workers == 0 {
            return Err(PoolError::InvalidConfig(
                "workers must be greater than 0".to_string(),
            ));
        }
        if self.vacate_interval == Some(Duration::ZERO) {
            return Err(PoolError::InvalidConfig(
                "vacate interval must be greater than 0".to_string(),
            ));
        }
        Ok(())
    }
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            capacity: 1000,
            live_time: DEFAULT_LIVE_TIME,
            max_idle_time: DEFAULT_MAX_IDLE_TIME,
            overflow_policy: OverflowPolicy::Reject,
            workers: DEFAULT_WORKERS,
            vacate_interval: Some(Duration::from_secs(60)),
        }
    }
}

fn parse_var<T: std::str::FromStr>(name: &str) -> Option<T> {
    env::var(name).ok().and_then(|v| v.trim().parse().ok())
}
