//! Menu engine error types.

use thiserror::Error;

use crate::menu::MenuItemKind;

/// Errors surfaced by menu operations.
///
/// Tolerant operations (removing a missing item, adding under a missing
/// dropdown) never produce these; they complete without effect.
#[derive(Debug, Error)]
pub enum MenuError {
    /// A required identifier was empty.
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    /// The referenced menu does not exist.
    #[error("menu '{menu_id}' does not exist")]
    NotFound { menu_id: String },

    /// A child operation was attempted on an item that cannot hold children.
    #[error("item '{item_id}' is a {kind} and cannot hold child items")]
    InvalidOperation { item_id: String, kind: MenuItemKind },

    /// The store was written by someone else since it was last read.
    #[error("menu state changed underneath us: expected version {expected:?}, found {found:?}")]
    Conflict {
        expected: Option<u64>,
        found: Option<u64>,
    },

    /// The stored version counter cannot move any further.
    #[error("menu version counter is exhausted")]
    VersionExhausted,

    /// Menu state could not be encoded for the store.
    #[error("failed to serialize menu state")]
    Serialization(#[from] serde_json::Error),

    /// A default-menu table could not be parsed.
    #[error("failed to parse default menus")]
    Defaults(#[from] serde_yml::Error),
}

impl MenuError {
    /// Create a not-found error for a menu id.
    pub fn not_found(menu_id: impl Into<String>) -> Self {
        Self::NotFound {
            menu_id: menu_id.into(),
        }
    }

    /// Create an invalid-operation error for an item.
    pub fn invalid_operation(item_id: impl Into<String>, kind: MenuItemKind) -> Self {
        Self::InvalidOperation {
            item_id: item_id.into(),
            kind,
        }
    }
}

/// Result type alias using MenuError.
pub type MenuResult<T> = Result<T, MenuError>;
