//! navtree CLI
//!
//! Inspect and edit the menus stored in a JSON session file.

use std::path::Path;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing::{debug, info};
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

use navtree_kernel::menu::{AuthRequirement, MenuItemKind};
use navtree_kernel::{Config, MemoryStore, MenuItem, MenuManager, MenuPosition};

#[derive(Debug, Parser)]
#[command(name = "navtree", version, about = "Manage session-stored navigation menus")]
struct Cli {
    /// Session file to operate on (overrides NAVTREE_SESSION_FILE).
    #[arg(long, global = true)]
    session: Option<std::path::PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Seed default menus if the session has none and save them.
    Seed,
    /// Replace every menu with the defaults.
    Reset,
    /// List menu ids. An unseeded session shows the defaults without saving them.
    List,
    /// Print a menu as a caller would see it. Never writes the session.
    Show {
        menu: String,
        #[arg(long)]
        authenticated: bool,
    },
    /// Create an empty menu.
    Create { menu: String },
    /// Add an item to a menu or to a dropdown inside it.
    Add {
        menu: String,
        #[arg(long)]
        id: String,
        #[arg(long, default_value = "link", value_parser = parse_kind)]
        kind: MenuItemKind,
        #[arg(long)]
        text: Option<String>,
        #[arg(long)]
        url: Option<String>,
        #[arg(long)]
        icon: Option<String>,
        #[arg(long, default_value = "all", value_parser = parse_auth)]
        auth: AuthRequirement,
        #[arg(long, default_value_t = 0, allow_negative_numbers = true)]
        order: i64,
        /// top, bottom, before:<id> or after:<id> (default bottom)
        #[arg(long, conflicts_with = "parent")]
        position: Option<MenuPosition>,
        /// Dropdown to add the item under; it goes after the existing children.
        #[arg(long)]
        parent: Option<String>,
    },
    /// Remove an item from a menu or from a dropdown inside it.
    Remove {
        menu: String,
        item: String,
        #[arg(long)]
        parent: Option<String>,
    },
    /// Flip an item between its primary and alternate icon.
    ToggleAlt { menu: String, item: String },
}

impl Command {
    fn is_read_only(&self) -> bool {
        matches!(self, Command::List | Command::Show { .. })
    }
}

fn parse_kind(value: &str) -> Result<MenuItemKind, String> {
    MenuItemKind::parse(value).ok_or_else(|| format!("unknown item kind '{value}'"))
}

fn parse_auth(value: &str) -> Result<AuthRequirement, String> {
    AuthRequirement::parse(value).ok_or_else(|| format!("unknown auth requirement '{value}'"))
}

fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    init_tracing();

    let cli = Cli::parse();
    let mut config = Config::from_env().context("failed to load configuration")?;
    if let Some(session) = cli.session {
        config.session_file = session;
    }

    let defaults = config.default_menus()?;
    let mut store = read_session(&config.session_file)?;

    if cli.command.is_read_only() {
        let mut scratch = store.clone();
        let mut manager = MenuManager::ensure_default_menus(&mut scratch, &defaults)?
            .with_cache_capacity(config.cache_capacity);
        return run(&mut manager, cli.command, &defaults);
    }

    {
        let mut manager = MenuManager::ensure_default_menus(&mut store, &defaults)?
            .with_cache_capacity(config.cache_capacity);
        run(&mut manager, cli.command, &defaults)?;
    }

    if store.is_modified() {
        write_session(&config.session_file, &store)?;
        info!(path = %config.session_file.display(), "session file updated");
    }
    Ok(())
}

fn run(
    manager: &mut MenuManager<&mut MemoryStore>,
    command: Command,
    defaults: &navtree_kernel::menu::DefaultMenus,
) -> Result<()> {
    match command {
        Command::Seed => {
            info!(
                menus = manager.menu_ids().count(),
                version = manager.version(),
                "session seeded"
            );
        }
        Command::List => {
            for menu_id in manager.menu_ids() {
                println!("{menu_id}");
            }
        }
        Command::Reset => {
            manager.reset_to_defaults(defaults)?;
            info!(version = manager.version(), "menus reset to defaults");
        }
        Command::Show {
            menu,
            authenticated,
        } => {
            let tree = manager
                .get_menu(&menu, authenticated)
                .with_context(|| format!("no menu named '{menu}'"))?;
            println!("{}", serde_json::to_string_pretty(&tree.to_record())?);
        }
        Command::Create { menu } => {
            if !manager.create_menu(&menu)? {
                info!(menu_id = %menu, "menu already exists");
            }
        }
        Command::Add {
            menu,
            id,
            kind,
            text,
            url,
            icon,
            auth,
            order,
            position,
            parent,
        } => {
            let mut item = MenuItem::new(id, kind).with_auth(auth).with_order(order);
            item.display_text = text;
            item.url = url;
            item.icon = icon;

            match parent {
                Some(parent) => {
                    if !manager.add_dropdown_item(&menu, &parent, item)? {
                        anyhow::bail!("'{parent}' is not a dropdown in menu '{menu}'");
                    }
                }
                None => manager.add_item(&menu, item, position.unwrap_or_default())?,
            }
        }
        Command::Remove { menu, item, parent } => {
            let removed = match parent {
                Some(parent) => manager.remove_dropdown_item(&menu, &parent, &item)?,
                None => manager.remove_item(&menu, &item)?,
            };
            debug!(menu_id = %menu, item_id = %item, removed, "remove finished");
        }
        Command::ToggleAlt { menu, item } => {
            if !manager.toggle_alt(&menu, &item)? {
                anyhow::bail!("no item '{item}' in menu '{menu}'");
            }
        }
    }
    Ok(())
}

fn read_session(path: &Path) -> Result<MemoryStore> {
    if !path.exists() {
        debug!(path = %path.display(), "session file missing, starting empty");
        return Ok(MemoryStore::new());
    }
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read session file {}", path.display()))?;
    MemoryStore::from_json_str(&text)
}

fn write_session(path: &Path, store: &MemoryStore) -> Result<()> {
    let text = serde_json::to_string_pretty(&store.to_json())?;
    std::fs::write(path, text)
        .with_context(|| format!("failed to write session file {}", path.display()))
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}
