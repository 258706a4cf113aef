//! Menu items and their persisted record form.
//!
//! Item kind and auth requirement are parsed once, when a record enters the
//! engine. Unrecognized values degrade to `Link` / `All` with a warning so a
//! single bad entry never takes a whole menu down.

use std::cmp::Ordering;
use std::fmt;

use serde::{Deserialize, Serialize};
use tracing::warn;

use super::filter;
use crate::error::{MenuError, MenuResult};

/// What an item renders as.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MenuItemKind {
    Header,
    #[default]
    Link,
    Separator,
    Dropdown,
}

impl MenuItemKind {
    /// Wire name of the kind.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Header => "header",
            Self::Link => "link",
            Self::Separator => "separator",
            Self::Dropdown => "dropdown",
        }
    }

    /// Parse a wire name, ignoring case and surrounding whitespace.
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "header" => Some(Self::Header),
            "link" => Some(Self::Link),
            "separator" => Some(Self::Separator),
            "dropdown" => Some(Self::Dropdown),
            _ => None,
        }
    }
}

impl fmt::Display for MenuItemKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Who gets to see an item.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AuthRequirement {
    /// Only shown to authenticated callers.
    AuthOnly,
    /// Only shown to anonymous callers.
    UnauthOnly,
    /// Shown to everyone.
    #[default]
    All,
}

impl AuthRequirement {
    /// Wire name of the requirement.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::AuthOnly => "auth_only",
            Self::UnauthOnly => "unauth_only",
            Self::All => "all",
        }
    }

    /// Parse a wire name, ignoring case and surrounding whitespace.
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "auth_only" => Some(Self::AuthOnly),
            "unauth_only" => Some(Self::UnauthOnly),
            "all" => Some(Self::All),
            _ => None,
        }
    }

    /// Whether a caller with the given authentication state may see the item.
    pub fn allows(&self, authenticated: bool) -> bool {
        match self {
            Self::All => true,
            Self::AuthOnly => authenticated,
            Self::UnauthOnly => !authenticated,
        }
    }
}

impl fmt::Display for AuthRequirement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Persisted shape of a menu item.
///
/// This is also the shape of entries in a default-menu table. Kind and auth
/// requirement stay raw strings here; [`MenuItem::from_record`] parses them.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MenuItemRecord {
    #[serde(default)]
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub item_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub menu_text: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub menu_class: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hover_text: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub auth_requirement: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub icon: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub icon_class: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub alt_icon: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub alt_icon_class: Option<String>,
    #[serde(default)]
    pub alt_status: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub secondary_text: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub secondary_class: Option<String>,
    #[serde(default)]
    pub new_window: bool,
    #[serde(default)]
    pub order: i64,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub items: Vec<MenuItemRecord>,
}

/// A single entry in a menu tree.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MenuItem {
    /// Identifier, unique within the owning menu.
    pub id: String,
    pub kind: MenuItemKind,
    /// Main label.
    pub display_text: Option<String>,
    /// CSS class applied to the label.
    pub menu_class: Option<String>,
    /// Badge or counter shown next to the label.
    pub secondary_text: Option<String>,
    pub secondary_class: Option<String>,
    pub hover_text: Option<String>,
    /// Link target. Meaningless for headers and separators.
    pub url: Option<String>,
    pub auth_requirement: AuthRequirement,
    pub icon: Option<String>,
    pub icon_class: Option<String>,
    pub alt_icon: Option<String>,
    pub alt_icon_class: Option<String>,
    /// Selects `alt_icon` / `alt_icon_class` over the primary pair.
    pub alt_active: bool,
    /// Open the link in a new window.
    pub new_window: bool,
    /// Sort position among siblings (lower first, ties broken by id).
    pub order: i64,
    children: Vec<MenuItem>,
}

impl MenuItem {
    /// Create an item of the given kind with everything else defaulted.
    pub fn new(id: impl Into<String>, kind: MenuItemKind) -> Self {
        Self {
            id: id.into(),
            kind,
            ..Self::default()
        }
    }

    /// Create a link item.
    pub fn link(id: impl Into<String>, text: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            display_text: Some(text.into()),
            url: Some(url.into()),
            ..Self::new(id, MenuItemKind::Link)
        }
    }

    /// Create a header item.
    pub fn header(id: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            display_text: Some(text.into()),
            ..Self::new(id, MenuItemKind::Header)
        }
    }

    /// Create a separator item.
    pub fn separator(id: impl Into<String>) -> Self {
        Self::new(id, MenuItemKind::Separator)
    }

    /// Create a dropdown holding `children`, sorted.
    pub fn dropdown(id: impl Into<String>, text: impl Into<String>, children: Vec<MenuItem>) -> Self {
        let mut item = Self {
            display_text: Some(text.into()),
            ..Self::new(id, MenuItemKind::Dropdown)
        };
        item.children = children;
        sort_siblings(&mut item.children);
        item
    }

    /// Set the sort order.
    pub fn with_order(mut self, order: i64) -> Self {
        self.order = order;
        self
    }

    /// Set the auth requirement.
    pub fn with_auth(mut self, auth_requirement: AuthRequirement) -> Self {
        self.auth_requirement = auth_requirement;
        self
    }

    /// Set the primary icon.
    pub fn with_icon(mut self, icon: impl Into<String>) -> Self {
        self.icon = Some(icon.into());
        self
    }

    /// Set the alternate icon and its class.
    pub fn with_alt_icon(mut self, icon: impl Into<String>, class: impl Into<String>) -> Self {
        self.alt_icon = Some(icon.into());
        self.alt_icon_class = Some(class.into());
        self
    }

    /// Child items; always empty for non-dropdown kinds.
    pub fn children(&self) -> &[MenuItem] {
        &self.children
    }

    /// Icon to render given the alt state.
    pub fn current_icon(&self) -> Option<&str> {
        if self.alt_active {
            self.alt_icon.as_deref()
        } else {
            self.icon.as_deref()
        }
    }

    /// Icon class to render given the alt state.
    pub fn current_icon_class(&self) -> Option<&str> {
        if self.alt_active {
            self.alt_icon_class.as_deref()
        } else {
            self.icon_class.as_deref()
        }
    }

    /// Flip between primary and alternate presentation.
    ///
    /// Returns the changed signal the owning tree turns into its dirty flag.
    pub fn toggle_alt(&mut self) -> bool {
        self.alt_active = !self.alt_active;
        true
    }

    /// Append a child to a dropdown and re-sort.
    pub fn add_child(&mut self, item: MenuItem) -> MenuResult<()> {
        self.require_dropdown()?;
        self.children.push(item);
        sort_siblings(&mut self.children);
        Ok(())
    }

    /// Remove a direct child by id. Returns whether anything was removed.
    pub fn remove_child(&mut self, item_id: &str) -> MenuResult<bool> {
        self.require_dropdown()?;
        let before = self.children.len();
        self.children.retain(|child| child.id != item_id);
        Ok(self.children.len() < before)
    }

    /// Children visible to a caller, as fresh copies.
    pub fn visible_children(&self, authenticated: bool) -> MenuResult<Vec<MenuItem>> {
        self.require_dropdown()?;
        Ok(filter::filter_items(&self.children, authenticated))
    }

    /// Copy of this item with its children replaced.
    pub(crate) fn with_children(&self, children: Vec<MenuItem>) -> Self {
        Self {
            id: self.id.clone(),
            kind: self.kind,
            display_text: self.display_text.clone(),
            menu_class: self.menu_class.clone(),
            secondary_text: self.secondary_text.clone(),
            secondary_class: self.secondary_class.clone(),
            hover_text: self.hover_text.clone(),
            url: self.url.clone(),
            auth_requirement: self.auth_requirement,
            icon: self.icon.clone(),
            icon_class: self.icon_class.clone(),
            alt_icon: self.alt_icon.clone(),
            alt_icon_class: self.alt_icon_class.clone(),
            alt_active: self.alt_active,
            new_window: self.new_window,
            order: self.order,
            children,
        }
    }

    fn require_dropdown(&self) -> MenuResult<()> {
        if self.kind == MenuItemKind::Dropdown {
            Ok(())
        } else {
            Err(MenuError::invalid_operation(&self.id, self.kind))
        }
    }

    /// Build an item from its record, recursively.
    pub fn from_record(record: MenuItemRecord) -> Self {
        let kind = match record.item_type.as_deref() {
            None => MenuItemKind::default(),
            Some(raw) => MenuItemKind::parse(raw).unwrap_or_else(|| {
                warn!(item_id = %record.id, item_type = %raw, "unknown item type, treating as link");
                MenuItemKind::Link
            }),
        };

        let auth_requirement = match record.auth_requirement.as_deref() {
            None => AuthRequirement::default(),
            Some(raw) => AuthRequirement::parse(raw).unwrap_or_else(|| {
                warn!(
                    item_id = %record.id,
                    auth_requirement = %raw,
                    "unknown auth requirement, treating as all"
                );
                AuthRequirement::All
            }),
        };

        let children = if kind == MenuItemKind::Dropdown {
            let mut children: Vec<MenuItem> =
                record.items.into_iter().map(MenuItem::from_record).collect();
            sort_siblings(&mut children);
            children
        } else {
            if !record.items.is_empty() {
                warn!(
                    item_id = %record.id,
                    kind = %kind,
                    dropped = record.items.len(),
                    "non-dropdown item carried children, discarding them"
                );
            }
            Vec::new()
        };

        Self {
            id: record.id,
            kind,
            display_text: record.menu_text,
            menu_class: record.menu_class,
            secondary_text: record.secondary_text,
            secondary_class: record.secondary_class,
            hover_text: record.hover_text,
            url: record.url,
            auth_requirement,
            icon: record.icon,
            icon_class: record.icon_class,
            alt_icon: record.alt_icon,
            alt_icon_class: record.alt_icon_class,
            alt_active: record.alt_status,
            new_window: record.new_window,
            order: record.order,
            children,
        }
    }

    /// Record form of this item, recursively.
    pub fn to_record(&self) -> MenuItemRecord {
        MenuItemRecord {
            id: self.id.clone(),
            item_type: Some(self.kind.as_str().to_string()),
            menu_text: self.display_text.clone(),
            menu_class: self.menu_class.clone(),
            hover_text: self.hover_text.clone(),
            url: self.url.clone(),
            auth_requirement: Some(self.auth_requirement.as_str().to_string()),
            icon: self.icon.clone(),
            icon_class: self.icon_class.clone(),
            alt_icon: self.alt_icon.clone(),
            alt_icon_class: self.alt_icon_class.clone(),
            alt_status: self.alt_active,
            secondary_text: self.secondary_text.clone(),
            secondary_class: self.secondary_class.clone(),
            new_window: self.new_window,
            order: self.order,
            items: self.children.iter().map(MenuItem::to_record).collect(),
        }
    }
}

/// Sibling ordering: `order` ascending, then `id`.
fn sibling_cmp(a: &MenuItem, b: &MenuItem) -> Ordering {
    a.order.cmp(&b.order).then_with(|| a.id.cmp(&b.id))
}

/// Stable sort of a sibling list, recursing into every dropdown.
pub fn sort_siblings(items: &mut [MenuItem]) {
    items.sort_by(sibling_cmp);
    for item in items.iter_mut() {
        if !item.children.is_empty() {
            sort_siblings(&mut item.children);
        }
    }
}

/// Depth-first search for an item by id.
pub(crate) fn find_item_mut<'a>(items: &'a mut [MenuItem], item_id: &str) -> Option<&'a mut MenuItem> {
    for item in items.iter_mut() {
        if item.id == item_id {
            return Some(item);
        }
        if let Some(found) = find_item_mut(&mut item.children, item_id) {
            return Some(found);
        }
    }
    None
}
