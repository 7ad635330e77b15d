//! Navigation gating settings.

use serde::{Deserialize, Serialize};

/// Custom-scheme URLs known to crash or hijack the host when loaded.
pub const DEFAULT_BLACKLIST: &[&str] =
    &["intent:#Intent;action=com.ledger.android.u2f.bridge.AUTHENTICATE"];

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct NavigationConfig {
    /// Any navigation whose URL contains one of these strings is swallowed.
    pub blacklist: Vec<String>,
}

impl Default for NavigationConfig {
    fn default() -> Self {
        Self {
            blacklist: DEFAULT_BLACKLIST.iter().map(|s| s.to_string()).collect(),
        }
    }
}
