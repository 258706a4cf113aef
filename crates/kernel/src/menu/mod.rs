//! Navigation menus for page chrome.
//!
//! Menus are ordered trees of items (links, headers, separators and
//! dropdowns) stored per session. They provide:
//! - Default menus seeded on first access
//! - Visibility filtering by authentication state
//! - A bounded cache of filtered menus keyed by version

mod defaults;
mod filter;
mod item;
mod manager;
mod tree;

pub use defaults::{DefaultMenu, DefaultMenus};
pub use filter::{filter_items, filter_tree};
pub use item::{AuthRequirement, MenuItem, MenuItemKind, MenuItemRecord, sort_siblings};
pub use manager::{
    CacheStats, DEFAULT_CACHE_CAPACITY, MenuManager, MenuPosition, ORDER_STEP,
    RELATIVE_ORDER_STEP,
};
pub use tree::{MenuTree, MenuTreeRecord};
