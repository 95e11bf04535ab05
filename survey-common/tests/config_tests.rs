//! Configuration resolution and graceful degradation
//!
//! Uses serial_test: these tests set and clear process environment variables.

use serial_test::serial;
use std::env;
use std::path::PathBuf;
use survey_common::config::{
    load_config, resolve_config_path, SurveyConfig, BIND_ENV_VAR, CONFIG_ENV_VAR,
    DATABASE_ENV_VAR,
};

fn clear_env() {
    env::remove_var(CONFIG_ENV_VAR);
    env::remove_var(BIND_ENV_VAR);
    env::remove_var(DATABASE_ENV_VAR);
}

fn write_config(dir: &tempfile::TempDir, name: &str, content: &str) -> PathBuf {
    let path = dir.path().join(name);
    std::fs::write(&path, content).unwrap();
    path
}

#[test]
#[serial]
fn test_cli_path_wins_over_env() {
    clear_env();
    let dir = tempfile::tempdir().unwrap();
    let cli = write_config(&dir, "cli.toml", "bind_address = \"127.0.0.1:1111\"");
    let from_env = write_config(&dir, "env.toml", "bind_address = \"127.0.0.1:2222\"");
    env::set_var(CONFIG_ENV_VAR, &from_env);

    assert_eq!(resolve_config_path(Some(&cli)), Some(cli.clone()));
    let config = load_config(Some(&cli)).unwrap();
    assert_eq!(config.bind_address, "127.0.0.1:1111");

    clear_env();
}

#[test]
#[serial]
fn test_env_path_used_without_cli() {
    clear_env();
    let dir = tempfile::tempdir().unwrap();
    let path = write_config(&dir, "env.toml", "log_level = \"debug\"");
    env::set_var(CONFIG_ENV_VAR, &path);

    let config = load_config(None).unwrap();
    assert_eq!(config.log_level, "debug");
    assert_eq!(config.bind_address, SurveyConfig::default().bind_address);

    clear_env();
}

#[test]
#[serial]
fn test_missing_file_degrades_to_defaults() {
    clear_env();
    let dir = tempfile::tempdir().unwrap();
    let missing = dir.path().join("does-not-exist.toml");

    let config = load_config(Some(&missing)).unwrap();
    assert_eq!(config, SurveyConfig::default());
}

#[test]
#[serial]
fn test_malformed_file_is_an_error() {
    clear_env();
    let dir = tempfile::tempdir().unwrap();
    let path = write_config(&dir, "bad.toml", "secure_cookies = \"maybe\"");

    assert!(load_config(Some(&path)).is_err());
}

#[test]
#[serial]
fn test_env_overrides_apply_after_file() {
    clear_env();
    let dir = tempfile::tempdir().unwrap();
    let path = write_config(
        &dir,
        "config.toml",
        "bind_address = \"127.0.0.1:3333\"\ndatabase_path = \"/tmp/from-file.db\"",
    );
    env::set_var(BIND_ENV_VAR, "0.0.0.0:4444");
    env::set_var(DATABASE_ENV_VAR, "/tmp/from-env.db");

    let config = load_config(Some(&path)).unwrap();
    assert_eq!(config.bind_address, "0.0.0.0:4444");
    assert_eq!(config.database_path, PathBuf::from("/tmp/from-env.db"));

    clear_env();
}
