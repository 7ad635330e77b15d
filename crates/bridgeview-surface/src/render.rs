//! The render-surface capability set.
//!
//! The rendering engine is opaque to this crate: everything the core needs
//! from it is expressed by [`RenderSurface`]. Lifecycle notifications travel
//! the other way as [`RenderCallback`] values delivered on the UI context.

use std::collections::BTreeMap;
use std::sync::Arc;

use bridgeview_common::SurfaceError;

use crate::guard::NavigationRequest;
use crate::intercept::{InjectedResponse, ResourceRequest};
use crate::settings::WebSettings;

/// Extra request headers for a URL load.
pub type Headers = BTreeMap<String, String>;

/// A response interceptor. Returning `None` defers to the engine's own fetch.
pub type Interceptor = Arc<dyn Fn(&ResourceRequest) -> Option<InjectedResponse> + Send + Sync>;

/// Which request stream an interceptor is attached to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum InterceptScope {
    /// Requests issued by the page itself.
    PageClient,
    /// Requests issued by the page's service workers.
    ServiceWorker,
}

/// Operations the core drives on the embedded rendering engine.
///
/// All methods are called from the UI context only.
pub trait RenderSurface {
    fn load_url(&mut self, url: &str, headers: &Headers) -> Result<(), SurfaceError>;

    fn load_data(
        &mut self,
        data: &str,
        mime_type: &str,
        encoding: &str,
        base_url: Option<&str>,
    ) -> Result<(), SurfaceError>;

    fn post_url(&mut self, url: &str, body: &[u8]) -> Result<(), SurfaceError>;

    /// Evaluate script in the page context, fire-and-forget.
    fn evaluate_script(&mut self, script: &str) -> Result<(), SurfaceError>;

    /// Whether [`evaluate_script`](Self::evaluate_script) is available.
    /// Queried once when the surface is built.
    fn supports_script_evaluation(&self) -> bool {
        true
    }

    /// Whether navigation requests carry a reliable redirect flag.
    /// Queried once when the surface is built.
    fn supports_redirect_detection(&self) -> bool {
        true
    }

    /// Load progress, 0-100.
    fn progress(&self) -> u8;
    fn title(&self) -> String;
    fn can_go_back(&self) -> bool;
    fn can_go_forward(&self) -> bool;

    fn go_back(&mut self) -> Result<(), SurfaceError>;
    fn go_forward(&mut self) -> Result<(), SurfaceError>;
    fn reload(&mut self) -> Result<(), SurfaceError>;
    fn stop_loading(&mut self) -> Result<(), SurfaceError>;

    fn user_agent(&self) -> String;
    fn set_user_agent(&mut self, user_agent: &str);
    fn apply_settings(&mut self, settings: &WebSettings);

    /// Install a named callable object into the page's script context.
    fn add_script_interface(&mut self, name: &str) -> Result<(), SurfaceError>;
    fn remove_script_interface(&mut self, name: &str) -> Result<(), SurfaceError>;

    fn register_interceptor(&mut self, scope: InterceptScope, interceptor: Interceptor);

    fn set_scrollbars_enabled(&mut self, enabled: bool);
    fn set_hardware_accelerated(&mut self);
    fn set_content_size_reporting(&mut self, enabled: bool);

    /// Drop lifecycle callbacks and release the engine.
    fn destroy(&mut self);
}

/// A lifecycle notification from the rendering engine.
#[derive(Debug, Clone, PartialEq)]
pub enum RenderCallback {
    PageStarted {
        url: String,
    },
    PageFinished {
        url: String,
    },
    ReceivedError {
        code: i32,
        description: String,
        failing_url: String,
    },
    HistoryUpdated {
        url: String,
        is_reload: bool,
    },
    ProgressChanged(u8),
    BridgeMessage(String),
    ContentSizeChanged {
        width: u32,
        height: u32,
    },
    /// A navigation the engine has already held back. The surface loads it
    /// in place unless the guard overrides it.
    NavigationRequested(NavigationRequest),
}
