//! Configuration schema types for bridgeview.
//!
//! All structs use `serde(default)` so partial configs work correctly.

mod bridge;
mod interception;
mod navigation;
mod surface;
mod system;

pub use bridge::*;
pub use interception::*;
pub use navigation::*;
pub use surface::*;
pub use system::*;

use serde::{Deserialize, Serialize};

/// Current config schema version.
pub const CONFIG_SCHEMA_VERSION: u32 = 1;

/// Root engine configuration.
///
/// Only override what you want to change.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
#[derive(Default)]
pub struct BridgeviewConfig {
    pub logging: LoggingConfig,
    pub interception: InterceptionConfig,
    pub bridge: BridgeConfig,
    pub navigation: NavigationConfig,
    pub surface: SurfaceDefaults,
}
