//! Default TOML config template with inline documentation comments.

/// Generate the default TOML config content with comments.
pub(crate) fn default_config_toml() -> String {
    r##"# bridgeview configuration
# Schema version 1
# Only override what you want to change -- missing fields use defaults.

[logging]
# level = "INFO"               # TRACE, DEBUG, INFO, WARNING, ERROR

[interception]
# enabled = true
# main_frame_only = true       # service-worker requests are always eligible
# connect_timeout_secs = 10    # 1-120
# timeout_secs = 30            # 1-600
# head_search_window = 65536   # 1024-16777216 bytes held back looking for <head>
# pool_max_idle_per_host = 8   # 0-256

[bridge]
# relink_progress_threshold = 10          # 0-100, early bridge relink while loading
# interface_name = "__REACT_WEB_VIEW_BRIDGE"

[navigation]
# blacklist = ["intent:#Intent;action=com.ledger.android.u2f.bridge.AUTHENTICATE"]

[surface]
# default_user_agent = "Mozilla/5.0 ..."
# debug_console = false
"##
    .to_string()
}
