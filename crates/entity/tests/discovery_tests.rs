//! Directory scanning for entity types

use std::fs;
use std::path::Path;

use elif_entity::{EntityError, EntityScanner};
use tempfile::TempDir;
use tracing_subscriber::EnvFilter;

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

fn write(root: &Path, relative: &str, contents: &str) {
    let path = root.join(relative);
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).unwrap();
    }
    fs::write(path, contents).unwrap();
}

const USER: &str = r#"use elif_entity::{Entity, Property};

/// Application user
#[derive(Debug, Default, Entity)]
#[entity(table = "users")]
pub struct User {
    #[id]
    pub id: Property<i64>,
}
"#;

const BASE: &str = r#"use elif_entity::{Entity, Property};

#[derive(Debug, Default, Entity)]
#[entity(abstract_entity)]
pub struct BaseModel {
    pub created_at: Property<String>,
}
"#;

#[test]
fn test_abstract_entities_are_not_discovered() {
    init_tracing();
    let dir = TempDir::new().unwrap();
    write(dir.path(), "models/user.rs", USER);
    write(dir.path(), "models/base_model.rs", BASE);

    let scan = EntityScanner::new().with_root_module("app").scan(dir.path()).unwrap();
    let found: Vec<String> = scan.iter().collect();

    assert_eq!(found, vec!["app::models::user::User".to_string()]);
}

#[test]
fn test_files_without_the_marker_are_skipped() {
    let dir = TempDir::new().unwrap();
    write(dir.path(), "lib.rs", "pub mod models;\n");
    write(dir.path(), "dto.rs", "#[derive(Debug, serde::Serialize)]\npub struct Dto { pub id: i64 }\n");
    write(dir.path(), "util.rs", "pub fn helper() -> u8 { 1 }\n");
    write(dir.path(), "models/mod.rs", USER);
    write(dir.path(), "README.md", USER);

    let scan = EntityScanner::new().scan(dir.path()).unwrap();
    assert_eq!(scan.iter().collect::<Vec<_>>(), vec!["models::User".to_string()]);

    // A second pass walks the tree again
    write(dir.path(), "post.rs", &USER.replace("User", "Post"));
    let mut found: Vec<String> = (&scan).into_iter().collect();
    found.sort();
    assert_eq!(found, vec!["models::User".to_string(), "post::Post".to_string()]);
}

#[test]
fn test_invalid_sources_do_not_abort_the_scan() {
    init_tracing();
    let dir = TempDir::new().unwrap();
    write(dir.path(), "broken.rs", "#[derive(Entity)]\npub struct Broken {\n    id: Property<i64>,\n");
    write(dir.path(), "not-a-module.rs", USER);
    write(dir.path(), "user.rs", USER);

    let found: Vec<String> = EntityScanner::new().scan(dir.path()).unwrap().iter().collect();
    assert_eq!(found, vec!["user::User".to_string()]);
}

#[test]
fn test_unreadable_root_is_a_hard_error() {
    let dir = TempDir::new().unwrap();
    let missing = dir.path().join("missing");

    let err = EntityScanner::new().scan(&missing).unwrap_err();
    assert!(matches!(err, EntityError::Discovery { .. }));

    let file = dir.path().join("file.rs");
    fs::write(&file, USER).unwrap();
    assert!(EntityScanner::new().scan(&file).is_err());
}
