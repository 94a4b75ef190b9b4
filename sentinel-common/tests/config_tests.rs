//! Configuration loading and root folder resolution
//!
//! Tests that touch SENTINEL_ROOT_FOLDER or SENTINEL_ROOT are marked #[serial]
//! so they never run concurrently.

use sentinel_common::config::{
    load_toml_config, CompiledDefaults, RootFolderInitializer, RootFolderResolver,
    StorageBackend, TomlConfig, ROOT_ENV, ROOT_FOLDER_ENV,
};
use sentinel_common::Error;
use serial_test::serial;
use std::env;
use std::path::PathBuf;
use tempfile::TempDir;

fn clear_root_env() {
    env::remove_var(ROOT_FOLDER_ENV);
    env::remove_var(ROOT_ENV);
}

#[test]
fn test_compiled_defaults() {
    let defaults = CompiledDefaults::for_current_platform();
    assert!(!defaults.root_folder.as_os_str().is_empty());
    assert!(defaults.root_folder.ends_with("sentinel") || defaults.root_folder.ends_with("sentinel_data"));
    assert_eq!(defaults.log_level, "info");
}

#[test]
#[serial]
fn test_resolver_with_no_overrides_uses_default() {
    clear_root_env();

    let root = RootFolderResolver::new().resolve();
    assert_eq!(root, CompiledDefaults::for_current_platform().root_folder);
}

#[test]
#[serial]
fn test_resolver_env_root_folder() {
    clear_root_env();
    env::set_var(ROOT_FOLDER_ENV, "/tmp/sentinel-env-folder");

    let root = RootFolderResolver::new()
        .with_toml_root(Some(PathBuf::from("/tmp/sentinel-toml")))
        .resolve();
    assert_eq!(root, PathBuf::from("/tmp/sentinel-env-folder"));

    clear_root_env();
}

#[test]
#[serial]
fn test_resolver_root_folder_beats_root() {
    clear_root_env();
    env::set_var(ROOT_FOLDER_ENV, "/tmp/sentinel-priority-1");
    env::set_var(ROOT_ENV, "/tmp/sentinel-priority-2");

    assert_eq!(
        RootFolderResolver::new().resolve(),
        PathBuf::from("/tmp/sentinel-priority-1")
    );

    env::remove_var(ROOT_FOLDER_ENV);
    assert_eq!(
        RootFolderResolver::new().resolve(),
        PathBuf::from("/tmp/sentinel-priority-2")
    );

    clear_root_env();
}

#[test]
#[serial]
fn test_resolver_cli_beats_env() {
    clear_root_env();
    env::set_var(ROOT_FOLDER_ENV, "/tmp/sentinel-env");

    let root = RootFolderResolver::new()
        .with_cli_arg(Some(PathBuf::from("/tmp/sentinel-cli")))
        .resolve();
    assert_eq!(root, PathBuf::from("/tmp/sentinel-cli"));

    clear_root_env();
}

#[test]
#[serial]
fn test_resolver_toml_used_without_env() {
    clear_root_env();

    let root = RootFolderResolver::new()
        .with_toml_root(Some(PathBuf::from("/tmp/sentinel-toml")))
        .resolve();
    assert_eq!(root, PathBuf::from("/tmp/sentinel-toml"));
}

#[test]
fn test_missing_config_file_gives_defaults() {
    let dir = TempDir::new().unwrap();
    let config = load_toml_config(&dir.path().join("absent.toml")).unwrap();
    assert_eq!(config, TomlConfig::default());
}

#[test]
fn test_config_file_loaded() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("config.toml");
    std::fs::write(
        &path,
        r#"
        host = "0.0.0.0"
        port = 5050
        storage = "memory"
        root_folder = "/srv/sentinel"
        seed_sample_data = false
        "#,
    )
    .unwrap();

    let config = load_toml_config(&path).unwrap();
    assert_eq!(config.host, "0.0.0.0");
    assert_eq!(config.port, 5050);
    assert_eq!(config.storage, StorageBackend::Memory);
    assert_eq!(config.root_folder, Some(PathBuf::from("/srv/sentinel")));
    assert!(!config.seed_sample_data);
    assert_eq!(config.logging.level, "info");
}

#[test]
fn test_malformed_config_file_is_error() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("config.toml");
    std::fs::write(&path, "port = \"not a number\"\n").unwrap();

    let err = load_toml_config(&path).unwrap_err();
    assert!(matches!(err, Error::Config(_)), "got {err:?}");
}

#[test]
fn test_initializer_creates_nested_root() {
    let dir = TempDir::new().unwrap();
    let root = dir.path().join("nested").join("sentinel");

    let initializer = RootFolderInitializer::new(root.clone());
    initializer.ensure_directory_exists().unwrap();
    initializer.ensure_directory_exists().unwrap();

    assert!(root.is_dir());
    assert_eq!(
        TomlConfig::default().database_path_in(initializer.root_folder()),
        root.join("sentinel.db")
    );
}
