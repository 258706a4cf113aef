//! Menu manager: loads menu trees from a session store, serves filtered
//! copies through a bounded cache, and persists every mutation.
//!
//! # Versions
//!
//! Each save bumps a manager-wide version stored under
//! [`MENU_VERSION_KEY`]. Before serving or mutating, the manager compares
//! that stored version with the one it last saw and reloads everything on a
//! mismatch. Filtered results are cached under
//! `(menu id, auth flag, tree version, manager version)`, so a stale entry can
//! never be hit after a change.
//!
//! Saves are optimistic: if the stored version moved since the manager last
//! looked, the save is refused with [`MenuError::Conflict`] instead of
//! overwriting someone else's change.

use std::collections::BTreeMap;
use std::str::FromStr;

use moka::sync::Cache;
use serde_json::{Map, Value as JsonValue};
use tracing::{debug, info, warn};

use super::defaults::DefaultMenus;
use super::filter;
use super::item::{MenuItem, MenuItemKind};
use super::tree::MenuTree;
use crate::error::{MenuError, MenuResult};
use crate::store::{MENU_VERSION_KEY, MENUS_KEY, MenuStore};

/// Order gap used when placing items at the top or bottom.
pub const ORDER_STEP: i64 = 10;

/// Order gap used when placing items next to a sibling.
pub const RELATIVE_ORDER_STEP: i64 = 5;

/// Default number of filtered menus kept per manager.
pub const DEFAULT_CACHE_CAPACITY: u64 = 64;

/// Where a new root item goes.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum MenuPosition {
    /// Before every existing item.
    Top,
    /// After every existing item.
    #[default]
    Bottom,
    /// Just before the sibling with this id.
    Before(String),
    /// Just after the sibling with this id.
    After(String),
}

impl FromStr for MenuPosition {
    type Err = MenuError;

    /// Parses `top`, `bottom`, `before:<id>` or `after:<id>`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if s.eq_ignore_ascii_case("top") {
            return Ok(Self::Top);
        }
        if s.eq_ignore_ascii_case("bottom") {
            return Ok(Self::Bottom);
        }
        match s.split_once(':') {
            Some((kind, id)) if !id.is_empty() && kind.eq_ignore_ascii_case("before") => {
                Ok(Self::Before(id.to_string()))
            }
            Some((kind, id)) if !id.is_empty() && kind.eq_ignore_ascii_case("after") => {
                Ok(Self::After(id.to_string()))
            }
            _ => Err(MenuError::InvalidArgument(format!(
                "unknown position '{s}', expected top, bottom, before:<id> or after:<id>"
            ))),
        }
    }
}

/// Filter cache key.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
struct FilterKey {
    menu_id: String,
    authenticated: bool,
    tree_version: u64,
    manager_version: u64,
}

/// Filter cache counters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CacheStats {
    pub hits: u64,
    pub misses: u64,
}

/// Owns the menu trees of one session for the span of one unit of work.
pub struct MenuManager<S: MenuStore> {
    store: S,
    menus: BTreeMap<String, MenuTree>,
    /// `menuVersion` as of the last load or save.
    known_version: Option<u64>,
    cache: Cache<FilterKey, MenuTree>,
    stats: CacheStats,
}

impl<S: MenuStore> MenuManager<S> {
    /// Create a manager and load whatever the store holds.
    pub fn new(store: S) -> Self {
        let mut manager = Self {
            store,
            menus: BTreeMap::new(),
            known_version: None,
            cache: build_cache(DEFAULT_CACHE_CAPACITY),
            stats: CacheStats::default(),
        };
        manager.reload();
        manager
    }

    /// Replace the filter cache with one of the given capacity.
    pub fn with_cache_capacity(mut self, capacity: u64) -> Self {
        self.cache = build_cache(capacity);
        self
    }

    /// Create a manager, seeding `defaults` when the store has never held menus.
    ///
    /// Seeding happens only when the `menus` key is absent, so calling this on
    /// every request is safe.
    pub fn ensure_default_menus(store: S, defaults: &DefaultMenus) -> MenuResult<Self> {
        let seeded = store.contains(MENUS_KEY);
        let mut manager = Self::new(store);
        if !seeded {
            manager.seed(defaults)?;
        }
        Ok(manager)
    }

    /// Discard every menu and reseed from `defaults`.
    pub fn reset_to_defaults(&mut self, defaults: &DefaultMenus) -> MenuResult<()> {
        self.refresh();
        self.seed(defaults)
    }

    fn seed(&mut self, defaults: &DefaultMenus) -> MenuResult<()> {
        info!(menus = defaults.len(), "initializing default menus");
        self.menus.clear();
        for tree in defaults.trees() {
            self.menus.insert(tree.menu_id().to_string(), tree);
        }
        self.save()
    }

    /// Reload from the store if someone saved since we last looked.
    ///
    /// Returns whether a reload happened.
    pub fn refresh(&mut self) -> bool {
        if self.stored_version() == self.known_version {
            return false;
        }
        self.reload();
        true
    }

    fn stored_version(&self) -> Option<u64> {
        self.store
            .get(MENU_VERSION_KEY)
            .and_then(|value| value.as_u64())
    }

    /// Replace every tree with what the store holds.
    fn reload(&mut self) {
        self.menus.clear();
        self.known_version = self.stored_version();
        self.cache.invalidate_all();

        let Some(stored) = self.store.get(MENUS_KEY) else {
            return;
        };
        let JsonValue::Object(stored) = stored else {
            warn!("stored menus are not a map, ignoring them");
            return;
        };

        for (menu_id, value) in stored {
            match MenuTree::from_value(value, &menu_id) {
                Ok(tree) => {
                    self.menus.insert(menu_id, tree);
                }
                Err(e) => {
                    warn!(menu_id = %menu_id, error = %e, "skipping unreadable stored menu");
                }
            }
        }

        debug!(
            menus = self.menus.len(),
            version = ?self.known_version,
            "loaded menus from store"
        );
    }

    /// Write every tree and a bumped version to the store.
    fn save(&mut self) -> MenuResult<()> {
        let found = self.stored_version();
        if found != self.known_version {
            warn!(
                expected = ?self.known_version,
                found = ?found,
                "menu state changed in the store since it was loaded, refusing to overwrite"
            );
            return Err(MenuError::Conflict {
                expected: self.known_version,
                found,
            });
        }

        let mut encoded = Map::new();
        for (menu_id, tree) in &self.menus {
            encoded.insert(menu_id.clone(), tree.to_value()?);
        }

        let Some(next) = self.known_version.unwrap_or(0).checked_add(1) else {
            warn!(version = ?self.known_version, "stored menu version is exhausted");
            return Err(MenuError::VersionExhausted);
        };
        self.store.set(MENUS_KEY, JsonValue::Object(encoded));
        self.store.set(MENU_VERSION_KEY, JsonValue::from(next));
        self.known_version = Some(next);

        for tree in self.menus.values_mut() {
            tree.mark_clean();
        }
        self.cache.invalidate_all();

        debug!(version = next, menus = self.menus.len(), "saved menus");
        Ok(())
    }

    /// Persist changes made through [`MenuManager::menu_mut`].
    pub fn persist(&mut self) -> MenuResult<()> {
        self.save()
    }

    /// Create an empty menu. Returns false if it already existed.
    pub fn create_menu(&mut self, menu_id: &str) -> MenuResult<bool> {
        if menu_id.trim().is_empty() {
            return Err(MenuError::InvalidArgument(
                "menu id cannot be empty".to_string(),
            ));
        }

        self.refresh();
        if self.menus.contains_key(menu_id) {
            return Ok(false);
        }

        info!(menu_id = %menu_id, "creating menu");
        self.menus
            .insert(menu_id.to_string(), MenuTree::new(menu_id));
        self.save()?;
        Ok(true)
    }

    /// Add a root item.
    ///
    /// An item whose `order` is still 0 gets one derived from `position`.
    /// A `Before`/`After` position naming a missing sibling leaves the order as is.
    pub fn add_item(
        &mut self,
        menu_id: &str,
        mut item: MenuItem,
        position: MenuPosition,
    ) -> MenuResult<()> {
        require_item_id(&item)?;
        self.refresh();

        let tree = self
            .menus
            .get_mut(menu_id)
            .ok_or_else(|| MenuError::not_found(menu_id))?;

        if item.order == 0
            && let Some(order) = position_order(tree.items(), &position)
        {
            item.order = order;
        }

        debug!(menu_id = %menu_id, item_id = %item.id, order = item.order, "adding menu item");
        tree.push_item(item);
        self.save()
    }

    /// Remove a root item. Returns whether it existed.
    ///
    /// Nested dropdown items are not searched.
    pub fn remove_item(&mut self, menu_id: &str, item_id: &str) -> MenuResult<bool> {
        self.refresh();
        let Some(tree) = self.menus.get_mut(menu_id) else {
            debug!(menu_id = %menu_id, "remove from unknown menu ignored");
            return Ok(false);
        };

        let removed = tree.remove_item(item_id);
        if !removed {
            debug!(menu_id = %menu_id, item_id = %item_id, "no such item to remove");
        }
        self.save()?;
        Ok(removed)
    }

    /// Add `item` under the dropdown `parent_id`, searching nested dropdowns too.
    ///
    /// A missing menu, missing parent, or non-dropdown parent is a no-op.
    /// Returns whether the item was added.
    pub fn add_dropdown_item(
        &mut self,
        menu_id: &str,
        parent_id: &str,
        mut item: MenuItem,
    ) -> MenuResult<bool> {
        require_item_id(&item)?;
        self.refresh();

        let Some(tree) = self.menus.get_mut(menu_id) else {
            warn!(menu_id = %menu_id, "dropdown item for unknown menu ignored");
            return Ok(false);
        };
        let Some(parent) = tree.find_item_mut(parent_id) else {
            warn!(menu_id = %menu_id, parent_id = %parent_id, "dropdown parent not found");
            return Ok(false);
        };
        if parent.kind != MenuItemKind::Dropdown {
            warn!(
                menu_id = %menu_id,
                parent_id = %parent_id,
                kind = %parent.kind,
                "dropdown parent is not a dropdown"
            );
            return Ok(false);
        }

        if item.order == 0 {
            item.order = parent
                .children()
                .iter()
                .map(|child| child.order)
                .max()
                .unwrap_or(0)
                .saturating_add(ORDER_STEP);
        }
        parent.add_child(item)?;
        tree.structure_changed();
        self.save()?;
        Ok(true)
    }

    /// Remove `item_id` from the dropdown `parent_id`. Missing pieces are a no-op.
    pub fn remove_dropdown_item(
        &mut self,
        menu_id: &str,
        parent_id: &str,
        item_id: &str,
    ) -> MenuResult<bool> {
        self.refresh();

        let Some(tree) = self.menus.get_mut(menu_id) else {
            return Ok(false);
        };
        let removed = match tree.find_item_mut(parent_id) {
            Some(parent) if parent.kind == MenuItemKind::Dropdown => parent.remove_child(item_id)?,
            _ => {
                warn!(menu_id = %menu_id, parent_id = %parent_id, "dropdown parent not found");
                false
            }
        };

        if removed {
            tree.structure_changed();
            self.save()?;
        }
        Ok(removed)
    }

    /// Flip an item between its primary and alternate icon.
    pub fn toggle_alt(&mut self, menu_id: &str, item_id: &str) -> MenuResult<bool> {
        self.refresh();
        let changed = self
            .menus
            .get_mut(menu_id)
            .map(|tree| tree.toggle_alt(item_id))
            .unwrap_or(false);
        if changed {
            self.save()?;
        }
        Ok(changed)
    }

    /// The menu as seen by a caller with the given authentication state.
    pub fn get_menu(&mut self, menu_id: &str, authenticated: bool) -> Option<MenuTree> {
        self.refresh();
        let tree = self.menus.get(menu_id)?;

        let key = FilterKey {
            menu_id: menu_id.to_string(),
            authenticated,
            tree_version: tree.version(),
            manager_version: self.known_version.unwrap_or(0),
        };
        if let Some(hit) = self.cache.get(&key) {
            self.stats.hits += 1;
            return Some(hit);
        }

        self.stats.misses += 1;
        let filtered = filter::filter_tree(tree, authenticated);
        debug!(
            menu_id = %menu_id,
            authenticated,
            items = filtered.items().len(),
            "filtered menu"
        );
        self.cache.insert(key, filtered.clone());
        Some(filtered)
    }

    /// Unfiltered tree for direct edits; call [`MenuManager::persist`] afterwards.
    ///
    /// Cached views are dropped since edits here need not move any version.
    pub fn menu_mut(&mut self, menu_id: &str) -> Option<&mut MenuTree> {
        self.refresh();
        self.cache.invalidate_all();
        self.menus.get_mut(menu_id)
    }

    pub fn menu_ids(&self) -> impl Iterator<Item = &str> {
        self.menus.keys().map(String::as_str)
    }

    pub fn contains_menu(&self, menu_id: &str) -> bool {
        self.menus.contains_key(menu_id)
    }

    /// Whether any tree has unsaved changes.
    pub fn is_dirty(&self) -> bool {
        self.menus.values().any(MenuTree::is_dirty)
    }

    /// Version of the last load or save (0 before the first save).
    pub fn version(&self) -> u64 {
        self.known_version.unwrap_or(0)
    }

    pub fn cache_stats(&self) -> CacheStats {
        self.stats
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn into_store(self) -> S {
        self.store
    }
}

impl<S: MenuStore> std::fmt::Debug for MenuManager<S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MenuManager")
            .field("menus", &self.menus.len())
            .field("known_version", &self.known_version)
            .field("stats", &self.stats)
            .finish()
    }
}

fn build_cache(capacity: u64) -> Cache<FilterKey, MenuTree> {
    Cache::builder().max_capacity(capacity).build()
}

fn require_item_id(item: &MenuItem) -> MenuResult<()> {
    if item.id.trim().is_empty() {
        return Err(MenuError::InvalidArgument(
            "menu item id cannot be empty".to_string(),
        ));
    }
    Ok(())
}

/// Order for a new root item at `position`, if one can be derived.
fn position_order(siblings: &[MenuItem], position: &MenuPosition) -> Option<i64> {
    match position {
        MenuPosition::Top => Some(
            siblings
                .iter()
                .map(|i| i.order)
                .min()
                .unwrap_or(0)
                .saturating_sub(ORDER_STEP),
        ),
        MenuPosition::Bottom => Some(
            siblings
                .iter()
                .map(|i| i.order)
                .max()
                .unwrap_or(0)
                .saturating_add(ORDER_STEP),
        ),
        MenuPosition::Before(relative) => siblings
            .iter()
            .find(|i| &i.id == relative)
            .map(|i| i.order.saturating_sub(RELATIVE_ORDER_STEP)),
        MenuPosition::After(relative) => siblings
            .iter()
            .find(|i| &i.id == relative)
            .map(|i| i.order.saturating_add(RELATIVE_ORDER_STEP)),
    }
}
