//! The `persist` key/value store backing `get_persist`/`set_persist`/`clear_persist`.
//!
//! A dashmap-backed in-memory map, scoped to one running bridge process: it
//! keeps arbitrary JSON values rather than opaque bytes, and has no TTL
//! concept or on-disk durability.

use dashmap::DashMap;
use serde_json::Value;

#[derive(Default)]
pub struct PersistStore {
    values: DashMap<String, Value>,
}

impl PersistStore {
    pub fn new() -> Self {
        Self {
            values: DashMap::new(),
        }
    }

    pub fn get(&self, key: &str) -> Option<Value> {
        self.values.get(key).map(|v| v.clone())
    }

    pub fn set(&self, key: String, value: Value) {
        self.values.insert(key, value);
    }

    pub fn remove(&self, key: &str) -> Option<Value> {
        self.values.remove(key).map(|(_, v)| v)
    }

    pub fn clear_all(&self) {
        self.values.clear();
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}
