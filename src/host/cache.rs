//! Process object cache
//!
//! Values are JSON documents keyed by `(key, group)`. Nothing in the plugin
//! invalidates entries; a cache implementation expires them on its own.

use std::collections::HashMap;

use parking_lot::Mutex;
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use tracing::trace;

pub trait ObjectCache: Send + Sync {
    fn get(&self, key: &str, group: &str) -> Option<Value>;
    fn set(&self, key: &str, group: &str, value: Value);
}

/// Typed helpers over any [`ObjectCache`]
pub trait ObjectCacheExt: ObjectCache {
    /// Returns the cached value, or `None` on a miss or a shape mismatch
    fn get_as<T: DeserializeOwned>(&self, key: &str, group: &str) -> Option<T> {
        let value = self.get(key, group);
        trace!(key, group, hit = value.is_some(), "object cache lookup");
        value.and_then(|value| serde_json::from_value(value).ok())
    }

    fn set_as<T: Serialize>(&self, key: &str, group: &str, value: &T) {
        if let Ok(value) = serde_json::to_value(value) {
            self.set(key, group, value);
        }
    }
}

impl<C: ObjectCache + ?Sized> ObjectCacheExt for C {}

/// In-memory cache living as long as the process
#[derive(Debug, Default)]
pub struct MemoryCache {
    entries: Mutex<HashMap<(String, String), Value>>,
}

impl MemoryCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.lock().is_empty()
    }
}

impl ObjectCache for MemoryCache {
    fn get(&self, key: &str, group: &str) -> Option<Value> {
        self.entries
            .lock()
            .get(&(key.to_string(), group.to_string()))
            .cloned()
    }

    fn set(&self, key: &str, group: &str, value: Value) {
        self.entries
            .lock()
            .insert((key.to_string(), group.to_string()), value);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeMap;

    #[test]
    fn groups_are_separate() {
        let cache = MemoryCache::new();
        cache.set("k", "a", Value::from(1));
        cache.set("k", "b", Value::from(2));

        assert_eq!(cache.get("k", "a"), Some(Value::from(1)));
        assert_eq!(cache.get("k", "b"), Some(Value::from(2)));
        assert_eq!(cache.get("k", "c"), None);
        assert_eq!(cache.len(), 2);
    }

    #[test]
    fn typed_access() {
        let cache = MemoryCache::new();
        let mut map = BTreeMap::new();
        map.insert("2".to_string(), 99i64);
        cache.set_as("translations", "mlp", &map);

        let read: Option<BTreeMap<String, i64>> = cache.get_as("translations", "mlp");
        assert_eq!(read, Some(map));

        let wrong: Option<Vec<String>> = cache.get_as("translations", "mlp");
        assert_eq!(wrong, None);
    }
}
