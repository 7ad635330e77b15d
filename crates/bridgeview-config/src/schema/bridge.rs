//! Message bridge settings.

use serde::{Deserialize, Serialize};

/// Reserved global under which the native bridge object is exposed to page script.
pub const DEFAULT_INTERFACE_NAME: &str = "__REACT_WEB_VIEW_BRIDGE";

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BridgeConfig {
    /// Load progress (percent) at which the bridge is speculatively relinked
    /// before the page finishes (valid range: 0-100).
    pub relink_progress_threshold: u32,
    /// Name of the callable object installed in the page's script context.
    pub interface_name: String,
}

impl Default for BridgeConfig {
    fn default() -> Self {
        Self {
            relink_progress_threshold: 10,
            interface_name: DEFAULT_INTERFACE_NAME.to_string(),
        }
    }
}
