//! Defaults applied to every surface at creation.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
#[derive(Default)]
pub struct SurfaceDefaults {
    /// User agent applied before the host sets one. `None` keeps the engine's own.
    pub default_user_agent: Option<String>,
    /// Forward page console messages to the engine's log instead of swallowing them.
    pub debug_console: bool,
}
