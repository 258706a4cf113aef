//! Default menu tables used to seed a fresh session.
//!
//! The built-in table ships inside the binary as YAML and is parsed once.
//! Sites can replace it with their own YAML file of the same shape:
//!
//! ```yaml
//! sidebar:
//!   items:
//!     - id: home
//!       item_type: link
//!       menu_text: Home
//!       url: /
//!       auth_requirement: all
//!       order: 10
//! ```

use std::collections::BTreeMap;
use std::path::Path;
use std::sync::LazyLock;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use tracing::{debug, error};

use super::item::{MenuItem, MenuItemRecord};
use super::tree::MenuTree;
use crate::error::MenuResult;

const BUILTIN_YAML: &str = include_str!("defaults.yml");

/// Maximum override file size (1 MB).
const MAX_DEFAULTS_FILE_SIZE: u64 = 1024 * 1024;

static BUILTIN: LazyLock<DefaultMenus> = LazyLock::new(|| {
    match DefaultMenus::from_yaml_str(BUILTIN_YAML) {
        Ok(menus) => menus,
        Err(e) => {
            error!(error = %e, "built-in default menus failed to parse, seeding nothing");
            DefaultMenus::default()
        }
    }
});

/// One menu in a default table.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DefaultMenu {
    /// Informational; the table key is the menu id.
    #[serde(default, alias = "menu_id", skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(default)]
    pub items: Vec<MenuItemRecord>,
}

/// An immutable table of `menu_id -> default items`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DefaultMenus {
    menus: BTreeMap<String, DefaultMenu>,
}

impl DefaultMenus {
    /// The table compiled into the binary.
    pub fn builtin() -> &'static DefaultMenus {
        &BUILTIN
    }

    /// Parse a table from YAML.
    pub fn from_yaml_str(yaml: &str) -> MenuResult<Self> {
        Ok(serde_yml::from_str(yaml)?)
    }

    /// Read a table from a YAML file.
    pub fn from_path(path: &Path) -> Result<Self> {
        let metadata = std::fs::metadata(path)
            .with_context(|| format!("failed to stat default menus {}", path.display()))?;
        if metadata.len() > MAX_DEFAULTS_FILE_SIZE {
            anyhow::bail!(
                "default menus file {} is {} bytes, limit is {MAX_DEFAULTS_FILE_SIZE}",
                path.display(),
                metadata.len()
            );
        }

        let yaml = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read default menus {}", path.display()))?;
        let menus = Self::from_yaml_str(&yaml)
            .with_context(|| format!("failed to parse default menus {}", path.display()))?;

        debug!(path = %path.display(), menus = menus.len(), "loaded default menus");
        Ok(menus)
    }

    pub fn menu_ids(&self) -> impl Iterator<Item = &str> {
        self.menus.keys().map(String::as_str)
    }

    pub fn get(&self, menu_id: &str) -> Option<&DefaultMenu> {
        self.menus.get(menu_id)
    }

    pub fn len(&self) -> usize {
        self.menus.len()
    }

    pub fn is_empty(&self) -> bool {
        self.menus.is_empty()
    }

    /// Fresh, clean trees for every configured menu.
    pub fn trees(&self) -> impl Iterator<Item = MenuTree> + '_ {
        self.menus.iter().map(|(menu_id, menu)| {
            let items = menu
                .items
                .iter()
                .cloned()
                .map(MenuItem::from_record)
                .collect();
            MenuTree::with_items(menu_id.clone(), items)
        })
    }
}
