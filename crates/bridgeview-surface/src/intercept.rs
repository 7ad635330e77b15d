//! HTTP response interception.
//!
//! The render surface calls the registered interceptor on its own
//! per-request background thread. [`InterceptionPipeline`] re-fetches the
//! resource out of band (redirects disabled, the surface's user agent sent)
//! and, for HTML answered with `200 OK`, wraps the body in a
//! [`ResponseInjector`]. Every failure declines with `None` so the engine
//! falls back to its own fetch.

use std::fmt;
use std::io::Read;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use bridgeview_common::SurfaceError;
use bridgeview_config::schema::InterceptionConfig;
use reqwest::header::{HeaderMap, USER_AGENT};
use tokio::sync::watch;
use tracing::{debug, warn};

use crate::assets::{resolve_script, ScriptAssets};
use crate::classify::{self, MIME_TEXT_HTML};
use crate::inject::{resolve_charset, ResponseInjector, DEFAULT_HEAD_SEARCH_WINDOW};
use crate::render::Interceptor;
use crate::settings::SurfaceConfig;

const STATUS_OK: u16 = 200;

/// A request the engine is about to make.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResourceRequest {
    pub url: String,
    pub is_main_frame: bool,
}

impl ResourceRequest {
    pub fn new(url: impl Into<String>, is_main_frame: bool) -> Self {
        Self {
            url: url.into(),
            is_main_frame,
        }
    }
}

/// The replacement response handed back to the engine.
pub struct InjectedResponse {
    /// Upstream status code.
    pub status: u16,
    /// Always `text/html`.
    pub mime_type: String,
    /// Canonical name of the resolved charset.
    pub charset: String,
    pub body: Box<dyn Read + Send>,
    /// Whether `body` carries the spliced script.
    pub injected: bool,
}

impl fmt::Debug for InjectedResponse {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("InjectedResponse")
            .field("status", &self.status)
            .field("mime_type", &self.mime_type)
            .field("charset", &self.charset)
            .field("injected", &self.injected)
            .finish_non_exhaustive()
    }
}

/// A raw upstream response.
pub struct FetchedResponse {
    pub status: u16,
    pub headers: HeaderMap,
    pub body: Box<dyn Read + Send>,
}

/// Performs the out-of-band fetch. Must not follow redirects.
pub trait Fetcher: Send + Sync {
    fn fetch(&self, url: &str, user_agent: &str) -> Result<FetchedResponse, SurfaceError>;
}

/// Blocking HTTP fetcher over a pooled `reqwest` client.
pub struct HttpFetcher {
    client: reqwest::blocking::Client,
}

impl HttpFetcher {
    pub fn new(config: &InterceptionConfig) -> Result<Self, SurfaceError> {
        let client = reqwest::blocking::Client::builder()
            .redirect(reqwest::redirect::Policy::none())
            .connect_timeout(Duration::from_secs(u64::from(config.connect_timeout_secs)))
            .timeout(Duration::from_secs(u64::from(config.timeout_secs)))
            .pool_max_idle_per_host(config.pool_max_idle_per_host as usize)
            .build()
            .map_err(|e| SurfaceError::Fetch(format!("failed to build HTTP client: {e}")))?;
        Ok(Self { client })
    }

    /// Use a preconfigured client. It should have redirects disabled.
    pub fn with_client(client: reqwest::blocking::Client) -> Self {
        Self { client }
    }
}

impl Fetcher for HttpFetcher {
    fn fetch(&self, url: &str, user_agent: &str) -> Result<FetchedResponse, SurfaceError> {
        let response = self
            .client
            .get(url)
            .header(USER_AGENT, user_agent)
            .send()
            .map_err(|e| SurfaceError::Fetch(e.to_string()))?;
        Ok(FetchedResponse {
            status: response.status().as_u16(),
            headers: response.headers().clone(),
            body: Box::new(response),
        })
    }
}

/// Decides and performs interception for one surface.
///
/// Shared across request threads; reads only the published config
/// snapshot and the torn-down flag.
pub struct InterceptionPipeline {
    fetcher: Arc<dyn Fetcher>,
    config: watch::Receiver<Arc<SurfaceConfig>>,
    torn_down: Arc<AtomicBool>,
    window: usize,
    assets: Option<Arc<ScriptAssets>>,
}

impl InterceptionPipeline {
    pub fn new(
        fetcher: Arc<dyn Fetcher>,
        config: watch::Receiver<Arc<SurfaceConfig>>,
        torn_down: Arc<AtomicBool>,
    ) -> Self {
        Self {
            fetcher,
            config,
            torn_down,
            window: DEFAULT_HEAD_SEARCH_WINDOW,
            assets: None,
        }
    }

    /// Bytes of look-ahead the injector may hold while finding `<head>`.
    pub fn with_head_search_window(mut self, window: usize) -> Self {
        self.window = window;
        self
    }

    pub fn with_assets(mut self, assets: Option<Arc<ScriptAssets>>) -> Self {
        self.assets = assets;
        self
    }

    fn is_torn_down(&self) -> bool {
        self.torn_down.load(Ordering::Acquire)
    }

    /// Intercept one request, or `None` to let the engine fetch it.
    pub fn intercept(&self, request: &ResourceRequest, main_frame_only: bool) -> Option<InjectedResponse> {
        if self.is_torn_down() {
            return None;
        }
        if main_frame_only && !request.is_main_frame {
            return None;
        }
        if classify::looks_invalid(&request.url) {
            debug!(url = %request.url, "not intercepting invalid URL");
            return None;
        }

        let config = Arc::clone(&self.config.borrow());
        let fetched = match self.fetcher.fetch(&request.url, &config.user_agent) {
            Ok(fetched) => fetched,
            Err(e) => {
                warn!(url = %request.url, error = %e, "interception fetch failed; deferring to engine");
                return None;
            }
        };

        if self.is_torn_down() {
            debug!(url = %request.url, "discarding fetch result after teardown");
            return None;
        }

        let is_redirect = classify::is_redirect_status(fetched.status);
        if !classify::requires_injection(&fetched.headers, is_redirect) {
            debug!(url = %request.url, status = fetched.status, "response passed to engine");
            return None;
        }

        let charset = resolve_charset(Some(classify::content_type(&fetched.headers)));
        let script = config
            .start_loading_script()
            .filter(|_| fetched.status == STATUS_OK);

        let (body, injected): (Box<dyn Read + Send>, bool) = match script {
            Some(script) => {
                let code = resolve_script(script, self.assets.as_deref());
                let injector = ResponseInjector::with_window(fetched.body, &code, charset, self.window);
                (Box::new(injector), true)
            }
            None => (fetched.body, false),
        };

        debug!(
            url = %request.url,
            status = fetched.status,
            charset = charset.name(),
            injected,
            "response intercepted"
        );
        Some(InjectedResponse {
            status: fetched.status,
            mime_type: MIME_TEXT_HTML.to_string(),
            charset: charset.name().to_string(),
            body,
            injected,
        })
    }

    /// An engine interceptor backed by this pipeline.
    pub fn interceptor(self: &Arc<Self>, main_frame_only: bool) -> Interceptor {
        let pipeline = Arc::clone(self);
        Arc::new(move |request: &ResourceRequest| pipeline.intercept(request, main_frame_only))
    }
}
