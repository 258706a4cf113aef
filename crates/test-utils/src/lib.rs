//! navtree test utilities.
//!
//! Fixture builders that produce the JSON shapes the menu engine reads:
//! item records, default-menu tables, and session contents.

use serde_json::{Map, Value as JsonValue, json};

/// Create a test link item.
pub fn test_link(id: &str, text: &str, order: i64) -> TestMenuItem {
    TestMenuItem {
        id: id.to_string(),
        item_type: "link".to_string(),
        menu_text: Some(text.to_string()),
        url: Some(format!("/{}", id.replace('_', "-"))),
        auth_requirement: "all".to_string(),
        alt_status: false,
        order,
        items: Vec::new(),
    }
}

/// Create a test separator.
pub fn test_separator(id: &str, order: i64) -> TestMenuItem {
    TestMenuItem {
        item_type: "separator".to_string(),
        menu_text: None,
        url: None,
        ..test_link(id, "", order)
    }
}

/// Create a test dropdown holding `items`.
pub fn test_dropdown(id: &str, text: &str, order: i64, items: Vec<TestMenuItem>) -> TestMenuItem {
    TestMenuItem {
        item_type: "dropdown".to_string(),
        url: None,
        items,
        ..test_link(id, text, order)
    }
}

/// A menu item record builder.
#[derive(Debug, Clone)]
pub struct TestMenuItem {
    pub id: String,
    pub item_type: String,
    pub menu_text: Option<String>,
    pub url: Option<String>,
    pub auth_requirement: String,
    pub alt_status: bool,
    pub order: i64,
    pub items: Vec<TestMenuItem>,
}

impl TestMenuItem {
    /// Only visible when authenticated.
    pub fn auth_only(mut self) -> Self {
        self.auth_requirement = "auth_only".to_string();
        self
    }

    /// Only visible when anonymous.
    pub fn unauth_only(mut self) -> Self {
        self.auth_requirement = "unauth_only".to_string();
        self
    }

    /// Set a raw auth requirement string, valid or not.
    pub fn with_auth(mut self, auth_requirement: &str) -> Self {
        self.auth_requirement = auth_requirement.to_string();
        self
    }

    /// Set a raw item type string, valid or not.
    pub fn with_type(mut self, item_type: &str) -> Self {
        self.item_type = item_type.to_string();
        self
    }

    /// Record form.
    pub fn to_json(&self) -> JsonValue {
        let mut record = json!({
            "id": self.id,
            "item_type": self.item_type,
            "auth_requirement": self.auth_requirement,
            "alt_status": self.alt_status,
            "order": self.order,
        });
        if let Some(obj) = record.as_object_mut() {
            if let Some(text) = &self.menu_text {
                obj.insert("menu_text".to_string(), json!(text));
            }
            if let Some(url) = &self.url {
                obj.insert("url".to_string(), json!(url));
            }
            if !self.items.is_empty() {
                let items: Vec<JsonValue> = self.items.iter().map(TestMenuItem::to_json).collect();
                obj.insert("items".to_string(), JsonValue::Array(items));
            }
        }
        record
    }
}

/// A default-menu table: `{ menu_id: { id, items } }`.
pub fn test_defaults(menus: &[(&str, Vec<TestMenuItem>)]) -> JsonValue {
    let mut table = Map::new();
    for (menu_id, items) in menus {
        let items: Vec<JsonValue> = items.iter().map(TestMenuItem::to_json).collect();
        table.insert(
            menu_id.to_string(),
            json!({ "id": menu_id, "items": items }),
        );
    }
    JsonValue::Object(table)
}

/// Session contents holding already-persisted menus at `version`.
pub fn test_session(menus: &[(&str, Vec<TestMenuItem>)], version: u64) -> JsonValue {
    let mut stored = Map::new();
    for (menu_id, items) in menus {
        let items: Vec<JsonValue> = items.iter().map(TestMenuItem::to_json).collect();
        stored.insert(
            menu_id.to_string(),
            json!({ "menu_id": menu_id, "items": items, "version": 0 }),
        );
    }
    json!({
        "menus": JsonValue::Object(stored),
        "menuVersion": version,
    })
}

/// Sidebar with an anonymous home link and authenticated dashboard and logout links.
pub fn sidebar_items() -> Vec<TestMenuItem> {
    vec![
        test_link("Home", "Home", 10).unauth_only(),
        test_link("Dashboard", "Dashboard", 10).auth_only(),
        test_link("Logout", "Logout", 99999).auth_only(),
    ]
}

/// Default table holding only [`sidebar_items`] under `sidebar`.
pub fn sidebar_defaults() -> JsonValue {
    test_defaults(&[("sidebar", sidebar_items())])
}
