//! Cache Module
//!
//! Typed cache façade with default timing, instance properties, and
//! blocking plus async access to a shared pool.

mod facade;
mod properties;

// Re-export public types
pub use facade::{
    Cache, PROPERTY_CAPACITY, PROPERTY_LIVE_TIME_MS, PROPERTY_MAX_IDLE_TIME_MS,
    PROPERTY_OVERFLOW_POLICY,
};
pub use properties::PropertyBag;
