//! Desktop render surface over a `wry::WebView`.
//!
//! wry exposes a smaller capability set than a mobile browser view:
//! - history and stop are driven by script;
//! - POST is an auto-submitting form;
//! - settings and user agent are fixed once the view is built;
//! - http(s) responses cannot be intercepted in place, so intercepted
//!   loads go through the `bridgeview://` proxy scheme instead
//!   (see [`proxy_url`]).
//!
//! Engine callbacks reach the surface through a [`WryLink`], which is
//! connected once the [`Surface`] exists.

use std::borrow::Cow;
use std::collections::HashMap;
use std::io::Read;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use bridgeview_common::SurfaceError;
use encoding_rs::{Encoding, UTF_8};
use tokio::sync::watch;
use tracing::{debug, warn};
use wry::http::{HeaderMap, HeaderName, HeaderValue, Response};
use wry::raw_window_handle;
use wry::{PageLoadEvent, WebView, WebViewBuilder};

use crate::bridge::BLANK_URL;
use crate::guard::{NavigationDecision, NavigationGuard, NavigationRequest};
use crate::inject::encode_text;
use crate::intercept::{InjectedResponse, ResourceRequest};
use crate::render::{Headers, InterceptScope, Interceptor, RenderCallback, RenderSurface};
use crate::settings::{SurfaceConfig, WebSettings};
use crate::queue::UiTaskSender;
use crate::surface::Surface;

/// Custom scheme that routes a load through the page-client interceptor.
pub const PROXY_SCHEME: &str = "bridgeview";

/// The proxy URL that loads `url` through interception.
pub fn proxy_url(url: &str) -> String {
    format!("{PROXY_SCHEME}://proxy/?url={}", urlencoding::encode(url))
}

/// Options fixed when the view is built.
#[derive(Debug, Clone)]
pub struct WryOptions {
    pub url: Option<String>,
    pub html: Option<String>,
    pub user_agent: Option<String>,
    pub devtools: bool,
    /// Name of the bridge interface object defined in every page.
    pub interface_name: String,
}

impl Default for WryOptions {
    fn default() -> Self {
        Self {
            url: None,
            html: None,
            user_agent: None,
            devtools: cfg!(debug_assertions),
            interface_name: bridgeview_config::schema::DEFAULT_INTERFACE_NAME.to_string(),
        }
    }
}

#[derive(Default)]
struct PageState {
    progress: u8,
    title: String,
    user_agent: String,
}

struct Connection {
    sender: UiTaskSender,
    guard: NavigationGuard,
    config: watch::Receiver<Arc<SurfaceConfig>>,
}

/// Late binding between the view's handlers and the surface that owns it.
#[derive(Clone, Default)]
pub struct WryLink {
    inner: Arc<Mutex<Option<Connection>>>,
}

impl WryLink {
    /// Start delivering engine callbacks to `surface`.
    pub fn connect(&self, surface: &Surface) {
        if let Ok(mut inner) = self.inner.lock() {
            *inner = Some(Connection {
                sender: surface.task_sender(),
                guard: surface.guard().clone(),
                config: surface.subscribe_config(),
            });
        }
    }

    fn post(&self, callback: RenderCallback) {
        if let Ok(inner) = self.inner.lock() {
            if let Some(connection) = inner.as_ref() {
                connection.sender.post_callback(callback);
            }
        }
    }

    /// Synchronous navigation gate: false cancels the engine's own load.
    fn allow_navigation(&self, url: String) -> bool {
        let Ok(inner) = self.inner.lock() else {
            return true;
        };
        let Some(connection) = inner.as_ref() else {
            return true;
        };
        let request = NavigationRequest::main_frame(url);
        let decision = {
            let config = connection.config.borrow();
            connection.guard.decide(&request, &config)
        };
        match decision {
            NavigationDecision::Default => true,
            NavigationDecision::Swallow => false,
            NavigationDecision::LoadDirect(_) | NavigationDecision::Delegate(_) => {
                connection
                    .sender
                    .post_callback(RenderCallback::NavigationRequested(request));
                false
            }
        }
    }
}

/// A [`RenderSurface`] backed by a child `wry::WebView`.
pub struct WryRenderSurface {
    webview: WebView,
    state: Arc<Mutex<PageState>>,
    bridge_enabled: Arc<AtomicBool>,
    interceptors: Arc<Mutex<HashMap<InterceptScope, Interceptor>>>,
    link: WryLink,
}

impl WryRenderSurface {
    /// Build the view as a child of `window`.
    pub fn build<W: raw_window_handle::HasWindowHandle>(
        window: &W,
        bounds: wry::Rect,
        options: WryOptions,
    ) -> Result<Self, SurfaceError> {
        let state = Arc::new(Mutex::new(PageState {
            user_agent: options.user_agent.clone().unwrap_or_default(),
            ..Default::default()
        }));
        let bridge_enabled = Arc::new(AtomicBool::new(false));
        let interceptors: Arc<Mutex<HashMap<InterceptScope, Interceptor>>> = Arc::default();
        let link = WryLink::default();

        let mut builder = WebViewBuilder::new()
            .with_bounds(bounds)
            .with_devtools(options.devtools)
            .with_initialization_script(&interface_script(&options.interface_name));

        if let Some(ua) = &options.user_agent {
            builder = builder.with_user_agent(ua);
        }

        builder = attach_ipc_handler(builder, link.clone(), Arc::clone(&bridge_enabled));
        builder = attach_page_load_handler(builder, link.clone(), Arc::clone(&state));
        builder = attach_title_handler(builder, Arc::clone(&state));
        builder = attach_navigation_handler(builder, link.clone());
        builder = attach_proxy_protocol(builder, Arc::clone(&interceptors));

        builder = match (&options.url, &options.html) {
            (Some(url), _) => builder.with_url(url),
            (None, Some(html)) => builder.with_html(html),
            (None, None) => builder.with_url(BLANK_URL),
        };

        let webview = builder.build_as_child(window).map_err(render_error)?;
        debug!("wry render surface created");

        Ok(Self {
            webview,
            state,
            bridge_enabled,
            interceptors,
            link,
        })
    }

    /// Handle for connecting the view's callbacks to its [`Surface`].
    pub fn link(&self) -> WryLink {
        self.link.clone()
    }

    pub fn inner(&self) -> &WebView {
        &self.webview
    }

    fn run_script(&self, script: &str) -> Result<(), SurfaceError> {
        self.webview.evaluate_script(script).map_err(render_error)
    }
}

fn render_error(e: wry::Error) -> SurfaceError {
    SurfaceError::Render(e.to_string())
}

/// Defines the bridge interface object. It forwards to wry's IPC channel;
/// the native side drops messages while the bridge is disabled.
fn interface_script(name: &str) -> String {
    let name = serde_json::to_string(name).unwrap_or_else(|_| "\"\"".to_string());
    format!(
        "window[{name}] = {{ postMessage: function(message) {{ window.ipc.postMessage(String(message)); }} }};"
    )
}

fn escape_html(value: &str) -> String {
    value
        .replace('&', "&amp;")
        .replace('"', "&quot;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
}

/// A page that immediately POSTs `body` (form-encoded pairs) to `url`.
fn auto_submit_form(url: &str, body: &[u8]) -> String {
    let fields: String = url::form_urlencoded::parse(body)
        .map(|(name, value)| {
            format!(
                "<input type=\"hidden\" name=\"{}\" value=\"{}\">",
                escape_html(&name),
                escape_html(&value)
            )
        })
        .collect();
    format!(
        "<html><body><form id=\"f\" method=\"POST\" action=\"{}\">{fields}</form>\
         <script>document.getElementById('f').submit();</script></body></html>",
        escape_html(url)
    )
}

fn attach_ipc_handler<'a>(
    builder: WebViewBuilder<'a>,
    link: WryLink,
    enabled: Arc<AtomicBool>,
) -> WebViewBuilder<'a> {
    builder.with_ipc_handler(move |request| {
        let body = request.body().to_string();
        if !enabled.load(Ordering::Acquire) {
            warn!(body_len = body.len(), "bridge message dropped: bridge disabled");
            return;
        }
        link.post(RenderCallback::BridgeMessage(body));
    })
}

fn attach_page_load_handler<'a>(
    builder: WebViewBuilder<'a>,
    link: WryLink,
    state: Arc<Mutex<PageState>>,
) -> WebViewBuilder<'a> {
    builder.with_on_page_load_handler(move |event, url| {
        let progress = match event {
            PageLoadEvent::Started => 0,
            PageLoadEvent::Finished => 100,
        };
        if let Ok(mut state) = state.lock() {
            state.progress = progress;
        }
        link.post(RenderCallback::ProgressChanged(progress));
        match event {
            PageLoadEvent::Started => link.post(RenderCallback::PageStarted { url }),
            PageLoadEvent::Finished => link.post(RenderCallback::PageFinished { url }),
        }
    })
}

fn attach_title_handler<'a>(
    builder: WebViewBuilder<'a>,
    state: Arc<Mutex<PageState>>,
) -> WebViewBuilder<'a> {
    builder.with_document_title_changed_handler(move |title| {
        if let Ok(mut state) = state.lock() {
            state.title = title;
        }
    })
}

fn attach_navigation_handler<'a>(builder: WebViewBuilder<'a>, link: WryLink) -> WebViewBuilder<'a> {
    builder.with_navigation_handler(move |url| link.allow_navigation(url))
}

fn attach_proxy_protocol<'a>(
    builder: WebViewBuilder<'a>,
    interceptors: Arc<Mutex<HashMap<InterceptScope, Interceptor>>>,
) -> WebViewBuilder<'a> {
    builder.with_asynchronous_custom_protocol(PROXY_SCHEME.to_string(), move |_id, request, responder| {
        let target = url::Url::parse(&request.uri().to_string())
            .ok()
            .and_then(|u| u.query_pairs().find(|(k, _)| k == "url").map(|(_, v)| v.into_owned()));
        let interceptor = interceptors
            .lock()
            .ok()
            .and_then(|map| map.get(&InterceptScope::PageClient).cloned());

        // The fetch blocks, so it runs off the UI thread.
        std::thread::spawn(move || {
            let intercepted = match (&target, interceptor) {
                (Some(target), Some(interceptor)) => interceptor(&ResourceRequest::new(target.clone(), true)),
                _ => None,
            };
            let response = proxy_response(target.as_deref(), intercepted).or_else(|e| {
                warn!(error = %e, "proxy response build failed");
                empty_response(502)
            });
            match response {
                Ok(response) => responder.respond(response),
                Err(e) => warn!(error = %e, "proxy response build failed"),
            }
        });
    })
}

type ProxyResponse = wry::http::Result<Response<Cow<'static, [u8]>>>;

fn empty_response(status: u16) -> ProxyResponse {
    Response::builder().status(status).body(Cow::from(Vec::new()))
}

/// The answer to a `bridgeview://proxy/` load of `target`.
///
/// Declined loads redirect to the target itself. Intercepted documents get a
/// `<base>` pointing at the target so relative links resolve against it
/// rather than the proxy URL.
fn proxy_response(target: Option<&str>, intercepted: Option<InjectedResponse>) -> ProxyResponse {
    let Some(target) = target else {
        return empty_response(400);
    };
    let Some(mut intercepted) = intercepted else {
        let location = url::Url::parse(target).map_or_else(|_| target.to_string(), String::from);
        debug!(url = %location, "proxy declined; redirecting");
        return Response::builder()
            .status(307)
            .header("Location", location)
            .body(Cow::from(Vec::new()));
    };

    let mut body = Vec::new();
    if let Err(e) = intercepted.body.read_to_end(&mut body) {
        warn!(url = %target, error = %e, "proxied body read failed");
        return empty_response(502);
    }
    let encoding = Encoding::for_label(intercepted.charset.as_bytes()).unwrap_or(UTF_8);
    let at = base_offset(&body, encoding);
    let base = encode_text(&format!("<base href=\"{}\">", escape_html(target)), encoding);
    body.splice(at..at, base);

    Response::builder()
        .status(intercepted.status)
        .header(
            "Content-Type",
            format!("{}; charset={}", intercepted.mime_type, intercepted.charset),
        )
        .body(Cow::from(body))
}

/// Byte offset for the `<base>` element: past any BOM, leading whitespace
/// and doctype, so the document keeps its rendering mode.
fn base_offset(body: &[u8], encoding: &'static Encoding) -> usize {
    let (text, _) = encoding.decode_without_bom_handling(&body[..body.len().min(1024)]);
    let lead = text.len()
        - text
            .trim_start_matches(|c: char| c == '\u{FEFF}' || c.is_whitespace())
            .len();
    let rest = &text[lead..];
    let prefix = match rest.get(.."<!doctype".len()) {
        Some(p) if p.eq_ignore_ascii_case("<!doctype") => match rest.find('>') {
            Some(end) => &text[..lead + end + 1],
            None => &text[..lead],
        },
        _ => &text[..lead],
    };
    encode_text(prefix, encoding).len()
}

impl RenderSurface for WryRenderSurface {
    fn load_url(&mut self, url: &str, headers: &Headers) -> Result<(), SurfaceError> {
        if headers.is_empty() {
            return self.webview.load_url(url).map_err(render_error);
        }
        let mut map = HeaderMap::new();
        for (name, value) in headers {
            let name = HeaderName::from_bytes(name.as_bytes())
                .map_err(|e| SurfaceError::InvalidPayload(format!("header name '{name}': {e}")))?;
            let value = HeaderValue::from_str(value)
                .map_err(|e| SurfaceError::InvalidPayload(format!("header value: {e}")))?;
            map.insert(name, value);
        }
        self.webview
            .load_url_with_headers(url, map)
            .map_err(render_error)
    }

    fn load_data(
        &mut self,
        data: &str,
        _mime_type: &str,
        _encoding: &str,
        base_url: Option<&str>,
    ) -> Result<(), SurfaceError> {
        if let Some(base_url) = base_url {
            debug!(base_url = %base_url, "base URL not supported by wry; loading without it");
        }
        self.webview.load_html(data).map_err(render_error)
    }

    fn post_url(&mut self, url: &str, body: &[u8]) -> Result<(), SurfaceError> {
        self.webview
            .load_html(&auto_submit_form(url, body))
            .map_err(render_error)
    }

    fn evaluate_script(&mut self, script: &str) -> Result<(), SurfaceError> {
        self.run_script(script)
    }

    fn supports_redirect_detection(&self) -> bool {
        false
    }

    fn progress(&self) -> u8 {
        self.state.lock().map(|s| s.progress).unwrap_or(0)
    }

    fn title(&self) -> String {
        self.state.lock().map(|s| s.title.clone()).unwrap_or_default()
    }

    fn can_go_back(&self) -> bool {
        false
    }

    fn can_go_forward(&self) -> bool {
        false
    }

    fn go_back(&mut self) -> Result<(), SurfaceError> {
        self.run_script("history.back();")
    }

    fn go_forward(&mut self) -> Result<(), SurfaceError> {
        self.run_script("history.forward();")
    }

    fn reload(&mut self) -> Result<(), SurfaceError> {
        self.run_script("location.reload();")
    }

    fn stop_loading(&mut self) -> Result<(), SurfaceError> {
        self.run_script("window.stop();")
    }

    fn user_agent(&self) -> String {
        self.state
            .lock()
            .map(|s| s.user_agent.clone())
            .unwrap_or_default()
    }

    fn set_user_agent(&mut self, user_agent: &str) {
        warn!(user_agent = %user_agent, "wry fixes the user agent at build time; recorded for interception only");
        if let Ok(mut state) = self.state.lock() {
            state.user_agent = user_agent.to_string();
        }
    }

    fn apply_settings(&mut self, settings: &WebSettings) {
        debug!(?settings, "wry applies engine settings at build time only");
    }

    fn add_script_interface(&mut self, name: &str) -> Result<(), SurfaceError> {
        self.bridge_enabled.store(true, Ordering::Release);
        self.run_script(&interface_script(name))
    }

    fn remove_script_interface(&mut self, name: &str) -> Result<(), SurfaceError> {
        self.bridge_enabled.store(false, Ordering::Release);
        let name = serde_json::to_string(name).unwrap_or_else(|_| "\"\"".to_string());
        self.run_script(&format!("delete window[{name}];"))
    }

    fn register_interceptor(&mut self, scope: InterceptScope, interceptor: Interceptor) {
        if let Ok(mut interceptors) = self.interceptors.lock() {
            interceptors.insert(scope, interceptor);
        }
    }

    fn set_scrollbars_enabled(&mut self, _enabled: bool) {}

    fn set_hardware_accelerated(&mut self) {}

    fn set_content_size_reporting(&mut self, enabled: bool) {
        debug!(enabled, "content size reporting is not available on wry");
    }

    fn destroy(&mut self) {
        if let Ok(mut inner) = self.link.inner.lock() {
            inner.take();
        }
        if let Ok(mut interceptors) = self.interceptors.lock() {
            interceptors.clear();
        }
        if let Err(e) = self.webview.set_visible(false) {
            warn!(error = %e, "failed to hide webview on destroy");
        }
    }
}
