//! Validators for the interception, bridge, and navigation sections.

use std::sync::OnceLock;

use regex::Regex;

use crate::schema::BridgeviewConfig;

use super::helpers::validate_range;

fn js_identifier() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^[A-Za-z_$][A-Za-z0-9_$]*$").expect("identifier regex is valid"))
}

pub(crate) fn validate_interception(errors: &mut Vec<String>, config: &BridgeviewConfig) {
    let c = &config.interception;
    validate_range(
        errors,
        "interception.connect_timeout_secs",
        c.connect_timeout_secs,
        1,
        120,
    );
    validate_range(errors, "interception.timeout_secs", c.timeout_secs, 1, 600);
    validate_range(
        errors,
        "interception.head_search_window",
        c.head_search_window,
        1024,
        16 * 1024 * 1024,
    );
    validate_range(
        errors,
        "interception.pool_max_idle_per_host",
        c.pool_max_idle_per_host,
        0,
        256,
    );
}

pub(crate) fn validate_bridge(errors: &mut Vec<String>, config: &BridgeviewConfig) {
    validate_range(
        errors,
        "bridge.relink_progress_threshold",
        config.bridge.relink_progress_threshold,
        0,
        100,
    );
    if !js_identifier().is_match(&config.bridge.interface_name) {
        errors.push(format!(
            "bridge.interface_name = {:?} is not a valid script identifier",
            config.bridge.interface_name
        ));
    }
}

pub(crate) fn validate_navigation(errors: &mut Vec<String>, config: &BridgeviewConfig) {
    for (i, entry) in config.navigation.blacklist.iter().enumerate() {
        if entry.trim().is_empty() {
            errors.push(format!("navigation.blacklist[{i}] is empty"));
        }
    }
}
