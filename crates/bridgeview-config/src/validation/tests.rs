//! Tests for the full validation pipeline.

use super::*;
use crate::schema::*;

#[test]
fn default_config_validates() {
    let config = BridgeviewConfig::default();
    assert!(validate(&config).is_ok());
}

#[test]
fn catches_threshold_above_100() {
    let mut config = BridgeviewConfig::default();
    config.bridge.relink_progress_threshold = 101;
    let err = validate(&config).unwrap_err().to_string();
    assert!(err.contains("bridge.relink_progress_threshold"));
}

#[test]
fn threshold_bounds_are_inclusive() {
    let mut config = BridgeviewConfig::default();
    config.bridge.relink_progress_threshold = 0;
    assert!(validate(&config).is_ok());
    config.bridge.relink_progress_threshold = 100;
    assert!(validate(&config).is_ok());
}

#[test]
fn catches_bad_interface_name() {
    let mut config = BridgeviewConfig::default();
    config.bridge.interface_name = "not valid".into();
    let err = validate(&config).unwrap_err().to_string();
    assert!(err.contains("bridge.interface_name"));

    config.bridge.interface_name = "9lives".into();
    assert!(validate(&config).is_err());

    config.bridge.interface_name = "$bridge_2".into();
    assert!(validate(&config).is_ok());
}

#[test]
fn catches_zero_timeouts() {
    let mut config = BridgeviewConfig::default();
    config.interception.connect_timeout_secs = 0;
    config.interception.timeout_secs = 0;
    let err = validate(&config).unwrap_err().to_string();
    assert!(err.contains("interception.connect_timeout_secs"));
    assert!(err.contains("interception.timeout_secs"));
}

#[test]
fn catches_tiny_head_window() {
    let mut config = BridgeviewConfig::default();
    config.interception.head_search_window = 16;
    let err = validate(&config).unwrap_err().to_string();
    assert!(err.contains("interception.head_search_window"));
}

#[test]
fn catches_blank_blacklist_entry() {
    let mut config = BridgeviewConfig::default();
    config.navigation.blacklist.push("   ".into());
    let err = validate(&config).unwrap_err().to_string();
    assert!(err.contains("navigation.blacklist[1]"));
}

#[test]
fn collects_multiple_errors() {
    let mut config = BridgeviewConfig::default();
    config.bridge.relink_progress_threshold = 500;
    config.interception.pool_max_idle_per_host = 1000;
    let err = validate(&config).unwrap_err().to_string();
    assert!(err.contains("; "));
}
