//! Authentication-based visibility filtering.
//!
//! Filtering never touches the source items. It builds fresh copies holding
//! only what the caller may see, and drops dropdowns left with no visible
//! children.

use super::item::{MenuItem, MenuItemKind};
use super::tree::MenuTree;

/// Visible copies of `items` for a caller, in their existing order.
pub fn filter_items(items: &[MenuItem], authenticated: bool) -> Vec<MenuItem> {
    items
        .iter()
        .filter(|item| item.auth_requirement.allows(authenticated))
        .filter_map(|item| {
            if item.kind == MenuItemKind::Dropdown {
                let visible = item.visible_children(authenticated).ok()?;
                if visible.is_empty() {
                    return None;
                }
                Some(item.with_children(visible))
            } else {
                Some(item.with_children(Vec::new()))
            }
        })
        .collect()
}

/// A filtered copy of a whole tree. The copy keeps the source version and is clean.
pub fn filter_tree(tree: &MenuTree, authenticated: bool) -> MenuTree {
    MenuTree::filtered_copy(tree, filter_items(tree.items(), authenticated))
}
