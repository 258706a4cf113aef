//! Configuration loaded from environment variables.

use std::env;
use std::path::PathBuf;

use anyhow::{Context, Result};

use crate::menu::{DEFAULT_CACHE_CAPACITY, DefaultMenus};

/// Application configuration.
#[derive(Debug, Clone)]
pub struct Config {
    /// JSON file holding one session's state (default: ./session.json).
    pub session_file: PathBuf,

    /// Filtered menus cached per manager (default: 64).
    pub cache_capacity: u64,

    /// YAML file replacing the built-in default menus.
    pub defaults_path: Option<PathBuf>,
}

impl Config {
    /// Load configuration from environment variables.
    pub fn from_env() -> Result<Self> {
        let session_file = env::var("NAVTREE_SESSION_FILE")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("./session.json"));

        let cache_capacity = env::var("NAVTREE_CACHE_CAPACITY")
            .unwrap_or_else(|_| DEFAULT_CACHE_CAPACITY.to_string())
            .parse()
            .context("NAVTREE_CACHE_CAPACITY must be a valid u64")?;

        let defaults_path = env::var("NAVTREE_DEFAULTS_PATH")
            .ok()
            .filter(|v| !v.trim().is_empty())
            .map(PathBuf::from);

        Ok(Self {
            session_file,
            cache_capacity,
            defaults_path,
        })
    }

    /// The default-menu table to seed with.
    pub fn default_menus(&self) -> Result<DefaultMenus> {
        match &self.defaults_path {
            Some(path) => DefaultMenus::from_path(path),
            None => Ok(DefaultMenus::builtin().clone()),
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            session_file: PathBuf::from("./session.json"),
            cache_capacity: DEFAULT_CACHE_CAPACITY,
            defaults_path: None,
        }
    }
}
