//! Menu state in a tower-sessions session.
//!
//! Session access is async while the menu engine is not, so a request takes a
//! [`SessionSnapshot`] of the menu keys, runs its [`MenuManager`] against the
//! snapshot, and commits the snapshot back once done.
//!
//! [`MenuManager`]: crate::menu::MenuManager

use anyhow::{Result, anyhow};
use serde_json::{Map, Value as JsonValue};
use tower_sessions::Session;
use tracing::debug;

use crate::store::{MENU_VERSION_KEY, MENUS_KEY, MemoryStore, MenuStore};

/// Session keys owned by the menu engine.
const MENU_SESSION_KEYS: [&str; 2] = [MENUS_KEY, MENU_VERSION_KEY];

/// The menu keys of one session, held in memory.
#[derive(Debug, Clone, Default)]
pub struct SessionSnapshot {
    store: MemoryStore,
}

impl SessionSnapshot {
    /// Copy the menu keys out of the session.
    pub async fn load(session: &Session) -> Result<Self> {
        let mut values = Map::new();
        for key in MENU_SESSION_KEYS {
            let value: Option<JsonValue> = session
                .get(key)
                .await
                .map_err(|e| anyhow!("failed to read '{key}' from session: {e}"))?;
            if let Some(value) = value {
                values.insert(key.to_string(), value);
            }
        }

        Ok(Self {
            store: MemoryStore::from_json(JsonValue::Object(values)),
        })
    }

    /// Whether the menu engine wrote anything since loading.
    pub fn is_modified(&self) -> bool {
        self.store.is_modified()
    }

    /// Write the menu keys back if they changed. Returns whether anything was written.
    pub async fn commit(&self, session: &Session) -> Result<bool> {
        if !self.store.is_modified() {
            return Ok(false);
        }

        for key in MENU_SESSION_KEYS {
            if let Some(value) = self.store.get(key) {
                session
                    .insert(key, value)
                    .await
                    .map_err(|e| anyhow!("failed to store '{key}' in session: {e}"))?;
            }
        }

        debug!("menu state committed to session");
        Ok(true)
    }
}

impl MenuStore for SessionSnapshot {
    fn get(&self, key: &str) -> Option<JsonValue> {
        self.store.get(key)
    }

    fn set(&mut self, key: &str, value: JsonValue) {
        self.store.set(key, value);
    }

    fn contains(&self, key: &str) -> bool {
        self.store.contains(key)
    }
}
