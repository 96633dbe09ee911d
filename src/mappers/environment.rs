//! The shared mapper environment.

use std::collections::BTreeMap;

use serde::de::DeserializeOwned;
use serde::Serialize;

/// A key-typed bag of intermediate values threaded through the graph
/// mapper stages.
///
/// Later mappers read keys written by earlier ones, so the pipeline driver
/// passes one environment through the whole run. Writing a key once per
/// stage keeps mappers order-independent where possible; overwrites are
/// legal but logged.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MapperEnvironment {
    values: BTreeMap<String, serde_json::Value>,
}

impl MapperEnvironment {
    /// Create an empty environment.
    pub fn new() -> Self {
        MapperEnvironment::default()
    }

    /// Store a value under the given key.
    pub fn insert<T: Serialize>(&mut self, key: impl Into<String>, value: T) -> serde_json::Result<()> {
        let key = key.into();
        let value = serde_json::to_value(value)?;
        if self.values.insert(key.clone(), value).is_some() {
            tracing::debug!(key = %key, "environment key overwritten");
        }
        Ok(())
    }

    /// Read a value by key, decoding into the requested type.
    pub fn get<T: DeserializeOwned>(&self, key: &str) -> Option<T> {
        let value = self.values.get(key)?.clone();
        serde_json::from_value(value).ok()
    }

    /// Check if a key is present.
    pub fn contains(&self, key: &str) -> bool {
        self.values.contains_key(key)
    }

    /// Iterate over the stored keys in sorted order.
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.values.keys().map(String::as_str)
    }

    /// Number of stored keys.
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Check if no keys are stored.
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}
