//! Key-value persistence surfaces for menu state.
//!
//! The menu engine only ever reads and writes two keys: [`MENUS_KEY`] and
//! [`MENU_VERSION_KEY`]. Values are plain JSON so any session backend that
//! can hold JSON can hold menus.

use std::collections::HashMap;
use std::sync::Arc;

use anyhow::{Context, Result};
use parking_lot::Mutex;
use serde_json::Value as JsonValue;

/// Store key holding `menu_id -> serialized tree`.
pub const MENUS_KEY: &str = "menus";

/// Store key holding the version of the last save.
pub const MENU_VERSION_KEY: &str = "menuVersion";

/// A per-session key-value store.
pub trait MenuStore {
    /// Read a value.
    fn get(&self, key: &str) -> Option<JsonValue>;

    /// Write a value.
    fn set(&mut self, key: &str, value: JsonValue);

    /// Check whether a key is present.
    fn contains(&self, key: &str) -> bool {
        self.get(key).is_some()
    }
}

impl<S: MenuStore + ?Sized> MenuStore for &mut S {
    fn get(&self, key: &str) -> Option<JsonValue> {
        (**self).get(key)
    }

    fn set(&mut self, key: &str, value: JsonValue) {
        (**self).set(key, value);
    }

    fn contains(&self, key: &str) -> bool {
        (**self).contains(key)
    }
}

/// In-memory store.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    values: HashMap<String, JsonValue>,
    modified: bool,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Load a store from a JSON object. Anything else yields an empty store.
    pub fn from_json(value: JsonValue) -> Self {
        let values = match value {
            JsonValue::Object(map) => map.into_iter().collect(),
            _ => HashMap::new(),
        };
        Self {
            values,
            modified: false,
        }
    }

    /// Parse a store from JSON text.
    pub fn from_json_str(text: &str) -> Result<Self> {
        let value: JsonValue = serde_json::from_str(text).context("session file is not valid JSON")?;
        Ok(Self::from_json(value))
    }

    /// All values as a JSON object.
    pub fn to_json(&self) -> JsonValue {
        JsonValue::Object(
            self.values
                .iter()
                .map(|(k, v)| (k.clone(), v.clone()))
                .collect(),
        )
    }

    /// Whether anything was written since the store was created.
    pub fn is_modified(&self) -> bool {
        self.modified
    }

    pub fn remove(&mut self, key: &str) -> Option<JsonValue> {
        let removed = self.values.remove(key);
        if removed.is_some() {
            self.modified = true;
        }
        removed
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

impl MenuStore for MemoryStore {
    fn get(&self, key: &str) -> Option<JsonValue> {
        self.values.get(key).cloned()
    }

    fn set(&mut self, key: &str, value: JsonValue) {
        self.values.insert(key.to_string(), value);
        self.modified = true;
    }

    fn contains(&self, key: &str) -> bool {
        self.values.contains_key(key)
    }
}

/// A [`MemoryStore`] shared between several handles.
///
/// Models one session observed by more than one manager at a time.
#[derive(Debug, Clone, Default)]
pub struct SharedStore {
    inner: Arc<Mutex<MemoryStore>>,
}

impl SharedStore {
    pub fn new(store: MemoryStore) -> Self {
        Self {
            inner: Arc::new(Mutex::new(store)),
        }
    }

    /// Copy of the current contents.
    pub fn snapshot(&self) -> MemoryStore {
        self.inner.lock().clone()
    }
}

impl MenuStore for SharedStore {
    fn get(&self, key: &str) -> Option<JsonValue> {
        self.inner.lock().get(key)
    }

    fn set(&mut self, key: &str, value: JsonValue) {
        self.inner.lock().set(key, value);
    }

    fn contains(&self, key: &str) -> bool {
        self.inner.lock().contains(key)
    }
}
