//! Property Bag Module
//!
//! String-keyed instance metadata attached to a cache. Holds configuration
//! and monitoring values, never cached data.

use std::collections::HashMap;

use parking_lot::RwLock;
use serde_json::Value;

// == Property Bag ==
#[derive(Debug, Default)]
pub struct PropertyBag {
    values: RwLock<HashMap<String, Value>>,
}

impl PropertyBag {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, name: &str) -> Option<Value> {
        self.values.read().get(name).cloned()
    }

    /// Stores a property, returning the previous value if any.
    pub fn set(&self, name: impl Into<String>, value: impl Into<Value>) -> Option<Value> {
        self.values.write().insert(name.into(), value.into())
    }

    /// Removes a property, returning its value if it was set.
    pub fn remove(&self, name: &str) -> Option<Value> {
        self.values.write().remove(name)
    }

    /// Sorted property names.
    pub fn names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.values.read().keys().cloned().collect();
        names.sort();
        names
    }

    /// All properties as one JSON object.
    pub fn to_json(&self) -> Value {
        Value::Object(
            self.values
                .read()
                .iter()
                .map(|(name, value)| (name.clone(), value.clone()))
                .collect(),
        )
    }
}
