//! Engine settings and the immutable per-surface configuration snapshot.

use serde::{Deserialize, Serialize};

use crate::classify::OriginWhitelist;

/// Policy for loading insecure sub-resources into a secure page.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
#[derive(Default)]
pub enum MixedContentMode {
    #[default]
    Never,
    Always,
    Compatibility,
}

/// Settings pushed down to the rendering engine as one unit.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WebSettings {
    pub javascript_enabled: bool,
    pub third_party_cookies_enabled: bool,
    /// Inverse of the host's `scalesPageToFit`.
    pub use_wide_view_port: bool,
    pub dom_storage_enabled: bool,
    pub media_playback_requires_user_gesture: bool,
    pub allow_universal_access_from_file_urls: bool,
    pub allow_file_access_from_file_urls: bool,
    pub allow_file_access: bool,
    pub allow_content_access: bool,
    pub save_form_data: bool,
    pub geolocation_enabled: bool,
    pub mixed_content_mode: MixedContentMode,
    pub builtin_zoom_controls: bool,
    pub display_zoom_controls: bool,
    pub load_with_overview_mode: bool,
    pub loads_images_automatically: bool,
    pub content_debugging: bool,
}

impl Default for WebSettings {
    fn default() -> Self {
        Self {
            javascript_enabled: false,
            third_party_cookies_enabled: false,
            use_wide_view_port: false,
            dom_storage_enabled: true,
            media_playback_requires_user_gesture: true,
            allow_universal_access_from_file_urls: false,
            allow_file_access_from_file_urls: false,
            allow_file_access: true,
            allow_content_access: true,
            save_form_data: true,
            geolocation_enabled: false,
            mixed_content_mode: MixedContentMode::Never,
            builtin_zoom_controls: true,
            display_zoom_controls: false,
            load_with_overview_mode: true,
            loads_images_automatically: true,
            content_debugging: true,
        }
    }
}

/// Everything lifecycle transitions and interception threads read.
///
/// Never mutated in place: an update builds a new snapshot and publishes
/// it, so a reader always sees one consistent configuration.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SurfaceConfig {
    pub user_agent: String,
    pub settings: WebSettings,
    pub injected_javascript: Option<String>,
    pub injected_on_start_loading_javascript: Option<String>,
    pub messaging_enabled: bool,
    pub origin_whitelist: OriginWhitelist,
    pub url_prefixes_for_default_intent: Vec<String>,
    pub content_size_events: bool,
}

impl SurfaceConfig {
    /// The on-finish script, if JavaScript is on and the script is non-empty.
    pub fn runnable_injected_javascript(&self) -> Option<&str> {
        if !self.settings.javascript_enabled {
            return None;
        }
        self.injected_javascript
            .as_deref()
            .filter(|js| !js.is_empty())
    }

    /// The on-start-loading script, if non-empty.
    pub fn start_loading_script(&self) -> Option<&str> {
        self.injected_on_start_loading_javascript
            .as_deref()
            .filter(|js| !js.is_empty())
    }
}
