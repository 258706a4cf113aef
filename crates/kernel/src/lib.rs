//! navtree kernel library
//!
//! Session-stored navigation menus: ordered item trees filtered by the
//! caller's authentication state. The `navtree` binary wraps this library
//! for inspecting and editing a session file.

pub mod config;
pub mod error;
pub mod menu;
pub mod session;
pub mod store;

pub use config::Config;
pub use error::{MenuError, MenuResult};
pub use menu::{MenuItem, MenuManager, MenuPosition, MenuTree};
pub use store::{MemoryStore, MenuStore, SharedStore};
