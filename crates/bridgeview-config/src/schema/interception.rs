//! Response interception settings.

use serde::{Deserialize, Serialize};

/// Controls the out-of-band fetch that rewrites HTML responses.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct InterceptionConfig {
    /// Master switch. When off, every request goes to the render surface's own loader.
    pub enabled: bool,
    /// Only intercept main-frame requests from the page client.
    /// Service-worker requests are never restricted.
    pub main_frame_only: bool,
    /// TCP connect timeout in seconds (valid range: 1-120).
    pub connect_timeout_secs: u32,
    /// Whole-request timeout in seconds (valid range: 1-600).
    pub timeout_secs: u32,
    /// Bytes the injector may hold back while looking for `<head>`
    /// (valid range: 1024-16777216).
    pub head_search_window: u32,
    /// Idle pooled connections kept per host (valid range: 0-256).
    pub pool_max_idle_per_host: u32,
}

impl Default for InterceptionConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            main_frame_only: true,
            connect_timeout_secs: 10,
            timeout_secs: 30,
            head_search_window: 64 * 1024,
            pool_max_idle_per_host: 8,
        }
    }
}
