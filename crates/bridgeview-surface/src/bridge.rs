//! The page/host message bridge.
//!
//! Messages flow in both directions:
//! - **Page -> host**: page script calls `window.postMessageToNative(data)`,
//!   which serializes `data` and hands the string to the named interface
//!   object installed by [`BridgeChannel::set_enabled`].
//! - **Host -> page**: [`post_message_script`] builds a script that
//!   dispatches a `message` event on the page's `document`.
//!
//! Payloads are opaque strings. The bridge never parses them.

use bridgeview_common::SurfaceError;
use tracing::{debug, warn};

use crate::render::{Headers, RenderSurface};
use crate::script::EvaluationStrategy;

/// Neutral destination used to discard page script and bindings.
pub const BLANK_URL: &str = "about:blank";

/// Page-global function the link script defines.
pub const PAGE_DISPATCH_FUNCTION: &str = "window.postMessageToNative";

/// Bridge state for one surface.
///
/// The interface binding is present in the page iff `enabled` is true.
#[derive(Debug, Clone)]
pub struct BridgeChannel {
    enabled: bool,
    interface_name: String,
}

impl BridgeChannel {
    pub fn new(interface_name: impl Into<String>) -> Self {
        Self {
            enabled: false,
            interface_name: interface_name.into(),
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    pub fn interface_name(&self) -> &str {
        &self.interface_name
    }

    /// Install or remove the interface binding. No-op when unchanged.
    pub fn set_enabled(
        &mut self,
        render: &mut dyn RenderSurface,
        enabled: bool,
    ) -> Result<(), SurfaceError> {
        if self.enabled == enabled {
            return Ok(());
        }
        if enabled {
            render.add_script_interface(&self.interface_name)?;
        } else {
            render.remove_script_interface(&self.interface_name)?;
        }
        self.enabled = enabled;
        debug!(interface = %self.interface_name, enabled, "bridge binding changed");
        Ok(())
    }

    /// Define the page-global dispatch function. Safe to repeat.
    pub fn link(
        &self,
        render: &mut dyn RenderSurface,
        strategy: EvaluationStrategy,
    ) -> Result<(), SurfaceError> {
        if !self.enabled {
            return Ok(());
        }
        strategy.evaluate(render, &self.link_script())
    }

    /// Navigate to a blank page, dropping any running script and bindings.
    pub fn unlink(&self, render: &mut dyn RenderSurface) -> Result<(), SurfaceError> {
        debug!("unlinking bridge");
        render.load_url(BLANK_URL, &Headers::new())
    }

    /// An inbound message from the page, if the bridge is accepting them.
    pub fn receive(&self, message: String) -> Option<String> {
        if self.enabled {
            Some(message)
        } else {
            warn!(len = message.len(), "bridge message received while disabled");
            None
        }
    }

    fn link_script(&self) -> String {
        format!(
            "({PAGE_DISPATCH_FUNCTION} = function(data) {{{}.postMessage(JSON.stringify(data));}})",
            self.interface_name
        )
    }
}

/// Script that dispatches `payload` to the page as a `message` event.
///
/// Uses the `MessageEvent` constructor when present and falls back to
/// `document.createEvent` on older engines.
pub fn post_message_script(payload: &str) -> String {
    let init = serde_json::json!({ "data": payload });
    format!(
        "(function () {{\
         var event;\
         var data = {init};\
         try {{\
         event = new MessageEvent('message', data);\
         }} catch (e) {{\
         event = document.createEvent('MessageEvent');\
         event.initMessageEvent('message', true, true, data.data, data.origin, data.lastEventId, data.source);\
         }}\
         document.dispatchEvent(event);\
         }})();"
    )
}
