//! Menu trees: a named, ordered list of items with dirty and version tracking.

use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;

use super::item::{self, MenuItem, MenuItemRecord};
use crate::error::MenuResult;

/// Persisted shape of a menu tree.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MenuTreeRecord {
    /// Older state wrote the key as `id`.
    #[serde(default, alias = "id")]
    pub menu_id: String,
    #[serde(default)]
    pub items: Vec<MenuItemRecord>,
    #[serde(default)]
    pub version: u64,
}

/// A named menu.
///
/// `dirty` is set by any change and cleared once the tree has been persisted.
/// `version` only moves on structural changes and feeds the filter cache key.
#[derive(Debug, Clone, Default)]
pub struct MenuTree {
    menu_id: String,
    items: Vec<MenuItem>,
    dirty: bool,
    version: u64,
}

impl PartialEq for MenuTree {
    fn eq(&self, other: &Self) -> bool {
        self.menu_id == other.menu_id && self.items == other.items && self.version == other.version
    }
}

impl Eq for MenuTree {}

impl MenuTree {
    /// Create an empty, clean tree.
    pub fn new(menu_id: impl Into<String>) -> Self {
        Self {
            menu_id: menu_id.into(),
            ..Self::default()
        }
    }

    /// Create a clean tree from items, sorting every level.
    pub fn with_items(menu_id: impl Into<String>, mut items: Vec<MenuItem>) -> Self {
        item::sort_siblings(&mut items);
        Self {
            menu_id: menu_id.into(),
            items,
            dirty: false,
            version: 0,
        }
    }

    pub(crate) fn filtered_copy(source: &MenuTree, items: Vec<MenuItem>) -> Self {
        Self {
            menu_id: source.menu_id.clone(),
            items,
            dirty: false,
            version: source.version,
        }
    }

    pub fn menu_id(&self) -> &str {
        &self.menu_id
    }

    /// Root-level items in display order.
    pub fn items(&self) -> &[MenuItem] {
        &self.items
    }

    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    pub fn version(&self) -> u64 {
        self.version
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn mark_dirty(&mut self) {
        self.dirty = true;
    }

    pub fn mark_clean(&mut self) {
        self.dirty = false;
    }

    /// Re-sort every level and record a structural change.
    pub(crate) fn structure_changed(&mut self) {
        item::sort_siblings(&mut self.items);
        self.dirty = true;
        self.version = self.version.saturating_add(1);
    }

    /// Depth-first lookup by id.
    pub fn find_item(&self, item_id: &str) -> Option<&MenuItem> {
        fn walk<'a>(items: &'a [MenuItem], item_id: &str) -> Option<&'a MenuItem> {
            items.iter().find_map(|item| {
                if item.id == item_id {
                    Some(item)
                } else {
                    walk(item.children(), item_id)
                }
            })
        }
        walk(&self.items, item_id)
    }

    pub(crate) fn find_item_mut(&mut self, item_id: &str) -> Option<&mut MenuItem> {
        item::find_item_mut(&mut self.items, item_id)
    }

    /// Append a root item and re-sort.
    pub fn push_item(&mut self, item: MenuItem) {
        self.items.push(item);
        self.structure_changed();
    }

    /// Remove a root item by id. Returns whether anything was removed.
    ///
    /// The tree is marked dirty either way; the version only moves on removal.
    pub fn remove_item(&mut self, item_id: &str) -> bool {
        let before = self.items.len();
        self.items.retain(|item| item.id != item_id);
        let removed = self.items.len() < before;
        if removed {
            self.structure_changed();
        } else {
            self.dirty = true;
        }
        removed
    }

    /// Flip the alt state of the first item with `item_id`.
    ///
    /// Order, structure and version are left alone.
    pub fn toggle_alt(&mut self, item_id: &str) -> bool {
        let changed = self
            .find_item_mut(item_id)
            .map(MenuItem::toggle_alt)
            .unwrap_or(false);
        if changed {
            self.dirty = true;
        }
        changed
    }

    /// Build a clean tree from its record. `fallback_id` is used when the record has none.
    pub fn from_record(record: MenuTreeRecord, fallback_id: &str) -> Self {
        let menu_id = if record.menu_id.is_empty() {
            fallback_id.to_string()
        } else {
            record.menu_id
        };
        let items = record.items.into_iter().map(MenuItem::from_record).collect();
        let mut tree = Self::with_items(menu_id, items);
        tree.version = record.version;
        tree
    }

    pub fn to_record(&self) -> MenuTreeRecord {
        MenuTreeRecord {
            menu_id: self.menu_id.clone(),
            items: self.items.iter().map(MenuItem::to_record).collect(),
            version: self.version,
        }
    }

    /// Store form of this tree.
    pub fn to_value(&self) -> MenuResult<JsonValue> {
        Ok(serde_json::to_value(self.to_record())?)
    }

    /// Build a tree from its store form.
    pub fn from_value(value: JsonValue, fallback_id: &str) -> MenuResult<Self> {
        let record: MenuTreeRecord = serde_json::from_value(value)?;
        Ok(Self::from_record(record, fallback_id))
    }
}
