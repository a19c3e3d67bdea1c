//! Per-frame metadata bag.
//!
//! A frame travels through the pipeline with a heterogeneous set of tags
//! attached: statistics produced by earlier stages, status reports published
//! by algorithms, sensor-embedded data. The bag is a string-keyed store with
//! runtime type checking; producer/consumer ordering is the host's problem,
//! so consumers treat a missing or mistyped key as "not available this
//! frame" rather than an error.

use std::any::Any;
use std::collections::HashMap;

/// Typed key/value store attached to one frame.
#[derive(Default)]
pub struct Metadata {
    values: HashMap<String, Box<dyn Any + Send>>,
}

impl Metadata {
    /// Create an empty bag.
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or replace the value under `key`.
    pub fn set<T: Any + Send>(&mut self, key: &str, value: T) {
        self.values.insert(key.to_string(), Box::new(value));
    }

    /// Clone out the value under `key`, if present with the expected type.
    pub fn get<T: Any + Clone>(&self, key: &str) -> Option<T> {
        self.values.get(key)?.downcast_ref::<T>().cloned()
    }

    /// Whether any value is stored under `key`.
    pub fn contains(&self, key: &str) -> bool {
        self.values.contains_key(key)
    }

    /// Remove the value under `key`, reporting whether one was present.
    pub fn remove(&mut self, key: &str) -> bool {
        self.values.remove(key).is_some()
    }

    /// Drop all tags.
    pub fn clear(&mut self) {
        self.values.clear();
    }
}

impl std::fmt::Debug for Metadata {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut keys: Vec<&str> = self.values.keys().map(String::as_str).collect();
        keys.sort_unstable();
        f.debug_struct("Metadata").field("keys", &keys).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_set_get_roundtrip() {
        let mut meta = Metadata::new();
        meta.set("agc.prepare_status", 42u32);
        assert_eq!(meta.get::<u32>("agc.prepare_status"), Some(42));
    }

    #[test]
    fn test_missing_key() {
        let meta = Metadata::new();
        assert_eq!(meta.get::<u32>("nope"), None);
        assert!(!meta.contains("nope"));
    }

    #[test]
    fn test_wrong_type_is_none() {
        let mut meta = Metadata::new();
        meta.set("x", 1.0f64);
        assert_eq!(meta.get::<u32>("x"), None);
        assert!(meta.contains("x"));
    }

    #[test]
    fn test_replace() {
        let mut meta = Metadata::new();
        meta.set("x", 1u32);
        meta.set("x", 2u32);
        assert_eq!(meta.get::<u32>("x"), Some(2));
        assert!(meta.remove("x"));
        assert!(!meta.remove("x"));
    }
}
