//! Tests for TOML config loading, creation, and path resolution.

use super::*;
use std::path::Path;

#[test]
fn load_from_nonexistent_returns_file_not_found() {
    let result = load_from_path(Path::new("/tmp/nonexistent_bridgeview_config.toml"));
    let err = result.unwrap_err();
    assert!(matches!(err, bridgeview_common::ConfigError::FileNotFound(_)));
}

#[test]
fn load_valid_partial_toml() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("config.toml");
    std::fs::write(
        &path,
        r##"
[interception]
main_frame_only = false
timeout_secs = 5

[surface]
default_user_agent = "bridgeview-test/1.0"
"##,
    )
    .unwrap();

    let config = load_from_path(&path).unwrap();
    assert!(!config.interception.main_frame_only);
    assert_eq!(config.interception.timeout_secs, 5);
    assert_eq!(
        config.surface.default_user_agent.as_deref(),
        Some("bridgeview-test/1.0")
    );
    // Defaults preserved
    assert_eq!(config.interception.connect_timeout_secs, 10);
    assert_eq!(config.bridge.relink_progress_threshold, 10);
}

#[test]
fn load_invalid_toml_returns_parse_error() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("config.toml");
    std::fs::write(&path, "this is not valid toml {{{").unwrap();

    let err = load_from_path(&path).unwrap_err();
    assert!(matches!(err, bridgeview_common::ConfigError::ParseError(_)));
}

#[test]
fn load_config_with_invalid_values_is_returned_as_parsed() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("config.toml");
    std::fs::write(
        &path,
        r#"
[bridge]
relink_progress_threshold = 150
"#,
    )
    .unwrap();

    let config = load_from_path(&path).unwrap();
    assert_eq!(config.bridge.relink_progress_threshold, 150);
}

#[test]
fn create_and_load_default_config() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("bridgeview").join("config.toml");

    create_default_config(&path).unwrap();
    assert!(path.exists());

    let config = load_from_path(&path).unwrap();
    assert!(config.interception.enabled);
    assert_eq!(config.navigation.blacklist.len(), 1);
}

#[test]
fn default_config_toml_is_valid() {
    use super::template::default_config_toml;
    use crate::schema::BridgeviewConfig;

    let config: BridgeviewConfig = toml::from_str(&default_config_toml()).unwrap();
    assert!(crate::validation::validate(&config).is_ok());
}

#[test]
fn default_config_path_is_reasonable() {
    if std::env::var_os(CONFIG_PATH_ENV).is_some() {
        return;
    }
    if let Ok(path) = default_config_path() {
        let path_str = path.to_string_lossy();
        assert!(path_str.contains("bridgeview"));
        assert!(path_str.ends_with("config.toml"));
    }
}
