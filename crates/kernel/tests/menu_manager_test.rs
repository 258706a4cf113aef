#![allow(clippy::unwrap_used, clippy::expect_used)]
//! Menu manager integration tests.
//!
//! Exercises seeding, filtering, caching, mutation ordering and cross-manager
//! versioning against in-memory session stores.

use navtree_kernel::menu::{AuthRequirement, DefaultMenus, MenuItemKind};
use navtree_kernel::store::{MENU_VERSION_KEY, MENUS_KEY};
use navtree_kernel::{
    MemoryStore, MenuError, MenuItem, MenuManager, MenuPosition, MenuStore, MenuTree, SharedStore,
};
use navtree_test_utils::{
    sidebar_defaults, sidebar_items, test_dropdown, test_link, test_session,
};

fn defaults(value: serde_json::Value) -> DefaultMenus {
    serde_json::from_value(value).unwrap()
}

fn ids(tree: &MenuTree) -> Vec<&str> {
    tree.items().iter().map(|i| i.id.as_str()).collect()
}

fn assert_sorted(items: &[MenuItem]) {
    for pair in items.windows(2) {
        assert!(
            (pair[0].order, &pair[0].id) <= (pair[1].order, &pair[1].id),
            "{} ({}) sorted after {} ({})",
            pair[1].id,
            pair[1].order,
            pair[0].id,
            pair[0].order
        );
    }
    for item in items {
        assert_sorted(item.children());
    }
}

#[test]
fn sidebar_filters_by_auth_state() {
    let mut store = MemoryStore::new();
    let mut manager =
        MenuManager::ensure_default_menus(&mut store, &defaults(sidebar_defaults())).unwrap();

    let anonymous = manager.get_menu("sidebar", false).unwrap();
    assert_eq!(ids(&anonymous), ["Home"]);

    let signed_in = manager.get_menu("sidebar", true).unwrap();
    assert_eq!(ids(&signed_in), ["Dashboard", "Logout"]);
}

#[test]
fn unknown_menu_is_none() {
    let mut manager = MenuManager::new(MemoryStore::new());
    assert!(manager.get_menu("sidebar", true).is_none());
}

#[test]
fn bottom_position_steps_past_max_order() {
    let session = test_session(&[("sidebar", vec![test_link("a", "A", 50)])], 1);
    let mut manager = MenuManager::new(MemoryStore::from_json(session));

    manager
        .add_item("sidebar", MenuItem::link("x", "X", "/x"), MenuPosition::Bottom)
        .unwrap();

    let tree = manager.get_menu("sidebar", true).unwrap();
    assert_eq!(tree.find_item("x").unwrap().order, 60);
    assert_eq!(ids(&tree), ["a", "x"]);
}

#[test]
fn dropdown_add_with_missing_parent_changes_nothing() {
    let mut store = MemoryStore::new();
    let mut manager =
        MenuManager::ensure_default_menus(&mut store, &defaults(sidebar_defaults())).unwrap();
    let tree_version = manager.get_menu("sidebar", true).unwrap().version();
    let manager_version = manager.version();

    let added = manager
        .add_dropdown_item("sidebar", "missing", MenuItem::link("y", "Y", "/y"))
        .unwrap();

    assert!(!added);
    assert_eq!(manager.version(), manager_version);
    assert_eq!(manager.get_menu("sidebar", true).unwrap().version(), tree_version);
}

#[test]
fn seeding_twice_leaves_the_store_alone() {
    let table = defaults(sidebar_defaults());

    let mut first = MemoryStore::new();
    drop(MenuManager::ensure_default_menus(&mut first, &table).unwrap());
    let persisted = first.to_json();
    assert_eq!(persisted[MENU_VERSION_KEY], 1);

    let mut second = MemoryStore::from_json(persisted.clone());
    let manager = MenuManager::ensure_default_menus(&mut second, &table).unwrap();
    assert_eq!(manager.version(), 1);
    drop(manager);

    assert!(!second.is_modified());
    assert_eq!(second.to_json(), persisted);
}

#[test]
fn builtin_defaults_seed_every_menu() {
    let mut store = MemoryStore::new();
    let mut manager = MenuManager::ensure_default_menus(&mut store, DefaultMenus::builtin()).unwrap();

    let menus: Vec<&str> = manager.menu_ids().collect();
    assert_eq!(
        menus,
        ["header_left_menu", "header_right_menu", "sidebar", "user_menu"]
    );

    // Everything in the user menu is for signed-in users.
    assert!(manager.get_menu("user_menu", false).unwrap().is_empty());
    let user_menu = manager.get_menu("user_menu", true).unwrap();
    assert_eq!(user_menu.items().len(), 4);
    assert_eq!(user_menu.items()[0].id, "user_menu_alttextexample");

    let sidebar = manager.get_menu("sidebar", false).unwrap();
    assert_eq!(
        ids(&sidebar),
        [
            "sidebar_home",
            "examples",
            "sidebar_iconref",
            "sidebar_loginlogoutSEPARATOR",
            "sidebar_login",
        ]
    );
}

#[test]
fn repeated_reads_hit_the_cache_until_a_mutation() {
    let mut store = MemoryStore::new();
    let mut manager =
        MenuManager::ensure_default_menus(&mut store, &defaults(sidebar_defaults())).unwrap();

    let first = manager.get_menu("sidebar", true).unwrap();
    let second = manager.get_menu("sidebar", true).unwrap();
    assert_eq!(first, second);
    assert_eq!(manager.cache_stats().hits, 1);
    assert_eq!(manager.cache_stats().misses, 1);

    // The other auth state is a separate entry.
    manager.get_menu("sidebar", false).unwrap();
    assert_eq!(manager.cache_stats().misses, 2);

    manager
        .add_item(
            "sidebar",
            MenuItem::link("Settings", "Settings", "/settings").with_auth(AuthRequirement::AuthOnly),
            MenuPosition::After("Dashboard".to_string()),
        )
        .unwrap();

    let third = manager.get_menu("sidebar", true).unwrap();
    assert_eq!(ids(&third), ["Dashboard", "Settings", "Logout"]);
    assert_eq!(manager.cache_stats().misses, 3);
}

#[test]
fn removal_is_reflected_and_idempotent() {
    let mut store = MemoryStore::new();
    let mut manager =
        MenuManager::ensure_default_menus(&mut store, &defaults(sidebar_defaults())).unwrap();
    manager.get_menu("sidebar", true).unwrap();

    assert!(manager.remove_item("sidebar", "Logout").unwrap());
    assert_eq!(ids(&manager.get_menu("sidebar", true).unwrap()), ["Dashboard"]);

    let version = manager.version();
    assert!(!manager.remove_item("sidebar", "Logout").unwrap());
    // Still persisted even though nothing changed.
    assert_eq!(manager.version(), version + 1);
    assert!(!manager.is_dirty());
}

#[test]
fn siblings_stay_sorted_at_every_level() {
    let session = test_session(
        &[(
            "nav",
            vec![
                test_dropdown(
                    "more",
                    "More",
                    20,
                    vec![test_link("z", "Z", 1), test_link("m", "M", 1)],
                ),
                test_link("b", "B", 20),
                test_link("a", "A", 30),
            ],
        )],
        1,
    );
    let mut manager = MenuManager::new(MemoryStore::from_json(session));

    manager
        .add_item("nav", MenuItem::link("top", "Top", "/"), MenuPosition::Top)
        .unwrap();
    manager
        .add_dropdown_item("nav", "more", MenuItem::link("c", "C", "/c").with_order(1))
        .unwrap();
    manager
        .add_dropdown_item(
            "nav",
            "more",
            MenuItem::dropdown("deeper", "Deeper", vec![]).with_order(1),
        )
        .unwrap();
    manager
        .add_dropdown_item("nav", "deeper", MenuItem::link("q", "Q", "/q").with_order(4))
        .unwrap();
    manager
        .add_dropdown_item("nav", "deeper", MenuItem::link("p", "P", "/p").with_order(4))
        .unwrap();
    manager.remove_item("nav", "a").unwrap();

    let tree = manager.get_menu("nav", true).unwrap();
    assert_sorted(tree.items());
    assert_eq!(ids(&tree), ["top", "b", "more"]);

    let more = tree.find_item("more").unwrap();
    let children: Vec<&str> = more.children().iter().map(|i| i.id.as_str()).collect();
    assert_eq!(children, ["c", "deeper", "m", "z"]);

    let deeper = tree.find_item("deeper").unwrap();
    assert_eq!(deeper.kind, MenuItemKind::Dropdown);
    let grandchildren: Vec<&str> = deeper.children().iter().map(|i| i.id.as_str()).collect();
    assert_eq!(grandchildren, ["p", "q"]);
}

#[test]
fn dropdowns_without_visible_children_are_elided() {
    let session = test_session(
        &[(
            "nav",
            vec![
                test_dropdown("account", "Account", 10, vec![test_link("me", "Me", 1).auth_only()]),
                test_dropdown("empty", "Empty", 20, vec![]),
                test_link("home", "Home", 30),
            ],
        )],
        1,
    );
    let mut manager = MenuManager::new(MemoryStore::from_json(session));

    assert_eq!(ids(&manager.get_menu("nav", false).unwrap()), ["home"]);
    assert_eq!(ids(&manager.get_menu("nav", true).unwrap()), ["account", "home"]);
}

#[test]
fn malformed_kinds_degrade_to_visible_links() {
    let session = test_session(
        &[(
            "nav",
            vec![test_link("odd", "Odd", 1)
                .with_type("carousel")
                .with_auth("admins_only")],
        )],
        1,
    );
    let mut manager = MenuManager::new(MemoryStore::from_json(session));

    for authenticated in [true, false] {
        let tree = manager.get_menu("nav", authenticated).unwrap();
        let odd = tree.find_item("odd").unwrap();
        assert_eq!(odd.kind, MenuItemKind::Link);
        assert_eq!(odd.auth_requirement, AuthRequirement::All);
    }
}

#[test]
fn persisted_tree_round_trips() {
    let mut store = MemoryStore::new();
    {
        let mut manager = MenuManager::ensure_default_menus(&mut store, DefaultMenus::builtin())
            .unwrap();
        manager
            .add_item(
                "sidebar",
                MenuItem::dropdown("tools", "Tools", vec![MenuItem::link("t1", "T1", "/t1")]),
                MenuPosition::Top,
            )
            .unwrap();
    }

    let stored = store.get(MENUS_KEY).unwrap();
    let tree = MenuTree::from_value(stored["sidebar"].clone(), "sidebar").unwrap();
    assert_eq!(tree.version(), 1);
    let again = MenuTree::from_value(tree.to_value().unwrap(), "sidebar").unwrap();
    assert_eq!(again, tree);
    assert_eq!(again.items()[0].id, "tools");
}

#[test]
fn another_manager_sees_saved_changes() {
    let shared = SharedStore::default();
    let table = defaults(sidebar_defaults());

    let mut reader = MenuManager::ensure_default_menus(shared.clone(), &table).unwrap();
    let mut writer = MenuManager::ensure_default_menus(shared.clone(), &table).unwrap();
    assert_eq!(ids(&reader.get_menu("sidebar", false).unwrap()), ["Home"]);

    writer
        .add_item(
            "sidebar",
            MenuItem::link("Signup", "Sign up", "/signup").with_auth(AuthRequirement::UnauthOnly),
            MenuPosition::Bottom,
        )
        .unwrap();

    let refreshed = reader.get_menu("sidebar", false).unwrap();
    assert_eq!(ids(&refreshed), ["Home", "Signup"]);
    assert_eq!(reader.version(), writer.version());
}

#[test]
fn concurrent_write_is_a_conflict() {
    let shared = SharedStore::default();
    let table = defaults(sidebar_defaults());

    let mut slow = MenuManager::ensure_default_menus(shared.clone(), &table).unwrap();
    let mut fast = MenuManager::ensure_default_menus(shared.clone(), &table).unwrap();

    slow.menu_mut("sidebar")
        .unwrap()
        .push_item(MenuItem::link("stale", "Stale", "/stale"));
    assert!(slow.is_dirty());

    fast.remove_item("sidebar", "Home").unwrap();

    let err = slow.persist().unwrap_err();
    assert!(matches!(
        err,
        MenuError::Conflict {
            expected: Some(1),
            found: Some(2)
        }
    ));

    // The fast writer's change is what the store holds.
    assert!(slow.refresh());
    let tree = slow.get_menu("sidebar", false).unwrap();
    assert!(tree.is_empty());
    assert!(tree.find_item("stale").is_none());
}

#[test]
fn reset_restores_defaults() {
    let mut store = MemoryStore::new();
    let table = defaults(sidebar_defaults());
    let mut manager = MenuManager::ensure_default_menus(&mut store, &table).unwrap();
    manager.create_menu("footer").unwrap();
    manager.remove_item("sidebar", "Home").unwrap();

    manager.reset_to_defaults(&table).unwrap();

    assert!(!manager.contains_menu("footer"));
    assert_eq!(ids(&manager.get_menu("sidebar", false).unwrap()), ["Home"]);
}

#[test]
fn fixture_items_match_builder_items() {
    let from_fixture = defaults(sidebar_defaults())
        .trees()
        .next()
        .unwrap();
    let built = MenuTree::with_items(
        "sidebar",
        vec![
            MenuItem::link("Home", "Home", "/Home")
                .with_order(10)
                .with_auth(AuthRequirement::UnauthOnly),
            MenuItem::link("Dashboard", "Dashboard", "/Dashboard")
                .with_order(10)
                .with_auth(AuthRequirement::AuthOnly),
            MenuItem::link("Logout", "Logout", "/Logout")
                .with_order(99999)
                .with_auth(AuthRequirement::AuthOnly),
        ],
    );
    assert_eq!(from_fixture, built);
    assert_eq!(sidebar_items().len(), 3);
}

#[test]
fn direct_edits_are_visible_to_the_next_read() {
    let mut store = MemoryStore::new();
    let mut manager = MenuManager::new(&mut store);
    manager.create_menu("main").unwrap();
    manager
        .add_item(
            "main",
            MenuItem::link("theme", "Theme", "/theme")
                .with_icon("sun")
                .with_alt_icon("moon", "icon-dark"),
            MenuPosition::Bottom,
        )
        .unwrap();

    let before = manager.get_menu("main", true).unwrap();
    assert!(!before.items()[0].alt_active);
    assert_eq!(manager.get_menu("main", true).unwrap(), before);
    assert_eq!(manager.cache_stats().hits, 1);

    assert!(manager.menu_mut("main").unwrap().toggle_alt("theme"));

    let after = manager.get_menu("main", true).unwrap();
    assert!(after.items()[0].alt_active);
    assert_eq!(after.items()[0].current_icon(), Some("moon"));
}

#[test]
fn extreme_stored_orders_saturate() {
    let session = test_session(
        &[
            (
                "main",
                vec![
                    test_link("first", "First", i64::MIN),
                    test_link("last", "Last", i64::MAX),
                ],
            ),
            (
                "tools",
                vec![test_dropdown(
                    "more",
                    "More",
                    10,
                    vec![test_link("deep", "Deep", i64::MAX)],
                )],
            ),
        ],
        3,
    );
    let mut manager = MenuManager::new(MemoryStore::from_json(session));

    let place = |manager: &mut MenuManager<MemoryStore>, id: &str, position: MenuPosition| {
        manager
            .add_item("main", MenuItem::link(id, id, "/"), position)
            .unwrap();
        manager
            .menu_mut("main")
            .unwrap()
            .find_item(id)
            .unwrap()
            .order
    };
    assert_eq!(place(&mut manager, "bottom", MenuPosition::Bottom), i64::MAX);
    assert_eq!(place(&mut manager, "top", MenuPosition::Top), i64::MIN);
    assert_eq!(
        place(&mut manager, "before", MenuPosition::Before("first".into())),
        i64::MIN
    );
    assert_eq!(
        place(&mut manager, "after", MenuPosition::After("last".into())),
        i64::MAX
    );

    assert!(
        manager
            .add_dropdown_item("tools", "more", MenuItem::link("deeper", "Deeper", "/"))
            .unwrap()
    );
    let tools = manager.get_menu("tools", true).unwrap();
    assert_eq!(tools.find_item("deeper").unwrap().order, i64::MAX);
    assert_sorted(tools.items());
}

#[test]
fn exhausted_version_counter_refuses_to_save() {
    let mut store = MemoryStore::from_json(test_session(
        &[("main", vec![test_link("home", "Home", 10)])],
        u64::MAX,
    ));
    {
        let mut manager = MenuManager::new(&mut store);
        assert_eq!(manager.version(), u64::MAX);

        let err = manager.remove_item("main", "home").unwrap_err();
        assert!(matches!(err, MenuError::VersionExhausted));
        assert!(manager.is_dirty());
    }

    assert_eq!(store.get(MENU_VERSION_KEY).unwrap(), u64::MAX);
    let stored = store.get(MENUS_KEY).unwrap();
    let tree = MenuTree::from_value(stored["main"].clone(), "main").unwrap();
    assert!(tree.find_item("home").is_some());
}
