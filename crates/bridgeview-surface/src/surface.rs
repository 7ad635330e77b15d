//! The surface entity: one render engine plus the state that drives it.
//!
//! A [`Surface`] owns its [`RenderSurface`] and is mutated only on the UI
//! context. Configuration lives in an immutable [`SurfaceConfig`] snapshot
//! published through a `watch` channel, which is what interception threads
//! read.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use bridgeview_common::{SurfaceError, TargetId};
use bridgeview_config::BridgeviewConfig;
use serde_json::Value;
use tokio::sync::watch;
use tracing::{debug, info, warn};

use crate::assets::ScriptAssets;
use crate::bridge::{post_message_script, BridgeChannel};
use crate::classify::OriginWhitelist;
use crate::command::SurfaceCommand;
use crate::events::{EventQueue, LoadError, NavigationState, SurfaceEvent};
use crate::guard::{ExternalHandler, NavigationDecision, NavigationGuard, NavigationRequest};
use crate::intercept::{Fetcher, HttpFetcher, InterceptionPipeline};
use crate::lifecycle::{LifecycleStep, PageLifecycle};
use crate::props::{
    parse_mixed_content_mode, SourceLoad, SurfaceProp, SurfaceProps, HTML_ENCODING, HTML_MIME_TYPE,
};
use crate::queue::{UiTaskQueue, UiTaskSender};
use crate::render::{Headers, InterceptScope, RenderCallback, RenderSurface};
use crate::script::{wrap_iife, EvaluationStrategy};
use crate::settings::{SurfaceConfig, WebSettings};

/// Host process lifecycle notifications.
pub trait HostLifecycle {
    fn on_host_resume(&mut self);
    fn on_host_pause(&mut self);
    fn on_host_destroy(&mut self);
}

/// Builds a [`Surface`] with its creation defaults applied.
pub struct SurfaceBuilder {
    target: TargetId,
    engine: BridgeviewConfig,
    fetcher: Option<Arc<dyn Fetcher>>,
    assets: Option<Arc<ScriptAssets>>,
    external: Option<Arc<dyn ExternalHandler>>,
    events: EventQueue,
}

impl SurfaceBuilder {
    pub fn new(target: impl Into<TargetId>) -> Self {
        Self {
            target: target.into(),
            engine: BridgeviewConfig::default(),
            fetcher: None,
            assets: None,
            external: None,
            events: EventQueue::new(),
        }
    }

    pub fn engine_config(mut self, engine: BridgeviewConfig) -> Self {
        self.engine = engine;
        self
    }

    /// Fetcher for interception. Defaults to an [`HttpFetcher`].
    pub fn fetcher(mut self, fetcher: Arc<dyn Fetcher>) -> Self {
        self.fetcher = Some(fetcher);
        self
    }

    pub fn assets(mut self, assets: Arc<ScriptAssets>) -> Self {
        self.assets = Some(assets);
        self
    }

    pub fn external_handler(mut self, handler: Arc<dyn ExternalHandler>) -> Self {
        self.external = Some(handler);
        self
    }

    /// Event sink to push into, typically shared by a registry.
    pub fn events(mut self, events: EventQueue) -> Self {
        self.events = events;
        self
    }

    pub fn build(self, mut render: Box<dyn RenderSurface>) -> Result<Surface, SurfaceError> {
        let Self {
            target,
            engine,
            fetcher,
            assets,
            external,
            events,
        } = self;

        let strategy = EvaluationStrategy::detect(render.as_ref());

        let settings = WebSettings::default();
        render.apply_settings(&settings);
        if let Some(ua) = &engine.surface.default_user_agent {
            render.set_user_agent(ua);
        }

        let config = SurfaceConfig {
            user_agent: render.user_agent(),
            settings,
            ..Default::default()
        };
        let (config_tx, config_rx) = watch::channel(Arc::new(config));
        let torn_down = Arc::new(AtomicBool::new(false));

        if engine.interception.enabled {
            let fetcher = match fetcher {
                Some(fetcher) => fetcher,
                None => Arc::new(HttpFetcher::new(&engine.interception)?),
            };
            let pipeline = Arc::new(
                InterceptionPipeline::new(fetcher, config_rx, Arc::clone(&torn_down))
                    .with_head_search_window(engine.interception.head_search_window as usize)
                    .with_assets(assets),
            );
            render.register_interceptor(
                InterceptScope::PageClient,
                pipeline.interceptor(engine.interception.main_frame_only),
            );
            render.register_interceptor(InterceptScope::ServiceWorker, pipeline.interceptor(false));
        }

        let guard = NavigationGuard::new(
            engine.navigation.blacklist.clone(),
            render.supports_redirect_detection(),
        )
        .with_delegation(external.is_some());
        let bridge = BridgeChannel::new(engine.bridge.interface_name.clone());

        debug!(surface = %target, strategy = ?strategy, "surface created");

        Ok(Surface {
            target,
            render,
            strategy,
            guard,
            bridge,
            lifecycle: PageLifecycle::new(),
            config_tx,
            relink_threshold: engine.bridge.relink_progress_threshold.min(100) as u8,
            debug_console: engine.surface.debug_console,
            external,
            events,
            tasks: UiTaskQueue::new(),
            torn_down,
            current_url: String::new(),
        })
    }
}

/// One hosted render surface.
pub struct Surface {
    target: TargetId,
    render: Box<dyn RenderSurface>,
    strategy: EvaluationStrategy,
    guard: NavigationGuard,
    bridge: BridgeChannel,
    lifecycle: PageLifecycle,
    config_tx: watch::Sender<Arc<SurfaceConfig>>,
    relink_threshold: u8,
    debug_console: bool,
    external: Option<Arc<dyn ExternalHandler>>,
    events: EventQueue,
    tasks: UiTaskQueue,
    torn_down: Arc<AtomicBool>,
    current_url: String,
}

impl Surface {
    pub fn target(&self) -> TargetId {
        self.target
    }

    pub fn current_url(&self) -> &str {
        &self.current_url
    }

    pub fn strategy(&self) -> EvaluationStrategy {
        self.strategy
    }

    pub fn lifecycle(&self) -> &PageLifecycle {
        &self.lifecycle
    }

    pub fn bridge(&self) -> &BridgeChannel {
        &self.bridge
    }

    pub fn guard(&self) -> &NavigationGuard {
        &self.guard
    }

    /// The current configuration snapshot.
    pub fn config(&self) -> Arc<SurfaceConfig> {
        Arc::clone(&self.config_tx.borrow())
    }

    /// Observe configuration snapshots as they are published.
    pub fn subscribe_config(&self) -> watch::Receiver<Arc<SurfaceConfig>> {
        self.config_tx.subscribe()
    }

    pub fn events(&self) -> &EventQueue {
        &self.events
    }

    pub fn drain_events(&self) -> Vec<SurfaceEvent> {
        self.events.drain()
    }

    /// Handle for posting work onto this surface's UI context.
    pub fn task_sender(&self) -> UiTaskSender {
        self.tasks.sender()
    }

    pub fn is_torn_down(&self) -> bool {
        self.torn_down.load(Ordering::Acquire)
    }

    /// Run every queued UI task. Tasks still queued at teardown are dropped.
    pub fn run_pending_tasks(&mut self) -> usize {
        let mut ran = 0;
        while !self.is_torn_down() {
            let Some(task) = self.tasks.try_next() else {
                break;
            };
            task(self);
            ran += 1;
        }
        ran
    }

    // -- engine callbacks --

    /// Route an engine callback to its handler.
    pub fn handle_callback(&mut self, callback: RenderCallback) {
        match callback {
            RenderCallback::PageStarted { url } => self.on_page_started(&url),
            RenderCallback::PageFinished { url } => self.on_page_finished(&url),
            RenderCallback::ReceivedError {
                code,
                description,
                failing_url,
            } => self.on_received_error(code, &description, &failing_url),
            RenderCallback::HistoryUpdated { url, is_reload } => {
                self.on_history_updated(&url, is_reload)
            }
            RenderCallback::ProgressChanged(progress) => self.on_progress_changed(progress),
            RenderCallback::BridgeMessage(message) => self.on_bridge_message(message),
            RenderCallback::ContentSizeChanged { width, height } => {
                self.on_content_size_changed(width, height)
            }
            RenderCallback::NavigationRequested(request) => {
                if !self.should_override_url_loading(&request) {
                    if let Err(e) = self.render.load_url(&request.url, &Headers::new()) {
                        warn!(surface = %self.target, url = %request.url, error = %e, "held navigation load failed");
                    }
                }
            }
        }
    }

    pub fn on_page_started(&mut self, url: &str) {
        if self.is_torn_down() {
            return;
        }
        self.current_url = url.to_string();
        let steps = self.lifecycle.on_started(url);
        self.run_steps(steps);
    }

    pub fn on_page_finished(&mut self, url: &str) {
        if self.is_torn_down() {
            return;
        }
        let steps = self.lifecycle.on_finished(url);
        self.run_steps(steps);
    }

    pub fn on_received_error(&mut self, code: i32, description: &str, failing_url: &str) {
        if self.is_torn_down() {
            return;
        }
        let steps = self.lifecycle.on_error(code, description, failing_url);
        self.run_steps(steps);
    }

    pub fn on_history_updated(&mut self, url: &str, is_reload: bool) {
        if self.is_torn_down() {
            return;
        }
        debug!(surface = %self.target, url = %url, is_reload, "visited history updated");
        self.current_url = url.to_string();
        let steps = self.lifecycle.on_history_update(url);
        self.run_steps(steps);
    }

    pub fn on_progress_changed(&mut self, progress: u8) {
        if self.is_torn_down() {
            return;
        }
        let steps = self.lifecycle.on_progress(progress, self.relink_threshold);
        self.run_steps(steps);
    }

    /// A string posted by page script through the bridge interface.
    pub fn on_bridge_message(&mut self, message: String) {
        if self.is_torn_down() {
            return;
        }
        if let Some(message) = self.bridge.receive(message) {
            self.events.push(SurfaceEvent::Message {
                target: self.target,
                message,
            });
        }
    }

    pub fn on_content_size_changed(&mut self, width: u32, height: u32) {
        if self.is_torn_down() || !self.config().content_size_events {
            return;
        }
        self.events.push(SurfaceEvent::ContentSizeChange {
            target: self.target,
            width,
            height,
        });
    }

    /// Gate an outgoing navigation. True when the engine must not load it.
    pub fn should_override_url_loading(&mut self, request: &NavigationRequest) -> bool {
        if self.is_torn_down() {
            return true;
        }
        let config = self.config();
        match self.guard.decide(request, &config) {
            NavigationDecision::Swallow => true,
            NavigationDecision::LoadDirect(url) => {
                if let Err(e) = self.render.load_url(&url, &Headers::new()) {
                    warn!(surface = %self.target, url = %url, error = %e, "redirect load failed");
                }
                true
            }
            NavigationDecision::Delegate(url) => match &self.external {
                Some(handler) => {
                    if let Err(e) = handler.open(&url) {
                        warn!(surface = %self.target, url = %url, error = %e, "no external handler for URL");
                    }
                    true
                }
                None => false,
            },
            NavigationDecision::Default => false,
        }
    }

    /// Geolocation permission for `origin`. Granted iff geolocation is enabled.
    pub fn on_geolocation_prompt(&self, origin: &str) -> bool {
        let granted = self.config().settings.geolocation_enabled;
        debug!(surface = %self.target, origin = %origin, granted, "geolocation prompt");
        granted
    }

    /// A page console message. Returns true when it was forwarded to the log.
    pub fn on_console_message(&self, message: &str) -> bool {
        if self.debug_console {
            info!(surface = %self.target, console = %message, "page console");
        }
        self.debug_console
    }

    fn navigation_state(&self, url: &str, loading: bool) -> NavigationState {
        NavigationState {
            target: self.target,
            url: url.to_string(),
            loading,
            title: self.render.title(),
            can_go_back: self.render.can_go_back(),
            can_go_forward: self.render.can_go_forward(),
        }
    }

    fn run_steps(&mut self, steps: Vec<LifecycleStep>) {
        for step in steps {
            if let Err(e) = self.run_step(step) {
                warn!(surface = %self.target, error = %e, "lifecycle step failed");
            }
        }
    }

    fn run_step(&mut self, step: LifecycleStep) -> Result<(), SurfaceError> {
        match step {
            LifecycleStep::EmitStart { url } => {
                let state = self.navigation_state(&url, true);
                self.events.push(SurfaceEvent::LoadingStart(state));
            }
            LifecycleStep::EmitHistory { url } => {
                let loading = self.lifecycle.loading(self.render.progress());
                let state = self.navigation_state(&url, loading);
                self.events.push(SurfaceEvent::LoadingStart(state));
            }
            LifecycleStep::RunInjectedScript => {
                let config = self.config();
                if let Some(script) = config.runnable_injected_javascript() {
                    self.strategy
                        .evaluate(self.render.as_mut(), &wrap_iife(script))?;
                }
            }
            LifecycleStep::RestoreScrollbars => self.render.set_scrollbars_enabled(true),
            LifecycleStep::PromoteHardwareRendering => self.render.set_hardware_accelerated(),
            LifecycleStep::EmitFinish { url } => {
                let loading = self.lifecycle.loading(self.render.progress());
                let state = self.navigation_state(&url, loading);
                self.events.push(SurfaceEvent::LoadingFinish(state));
            }
            LifecycleStep::EmitError {
                url,
                code,
                description,
            } => {
                let loading = self.lifecycle.loading(self.render.progress());
                let state = self.navigation_state(&url, loading);
                self.events.push(SurfaceEvent::LoadingError(LoadError {
                    state,
                    code,
                    description,
                }));
            }
            LifecycleStep::EmitProgress(progress) => {
                self.events.push(SurfaceEvent::Progress {
                    target: self.target,
                    progress,
                });
            }
            LifecycleStep::LinkBridge => {
                self.bridge.link(self.render.as_mut(), self.strategy)?;
            }
        }
        Ok(())
    }

    // -- host props --

    /// Apply a batch of props in order. Every prop is attempted; the first
    /// failure is returned.
    pub fn apply_props(&mut self, props: SurfaceProps) -> Result<(), SurfaceError> {
        let mut first_error = None;
        for prop in props.into_updates() {
            let name = prop.name();
            if let Err(e) = self.apply_prop(prop) {
                warn!(surface = %self.target, prop = name, error = %e, "prop rejected");
                first_error.get_or_insert(e);
            }
        }
        first_error.map_or(Ok(()), Err)
    }

    /// Apply one prop and publish the resulting snapshot.
    ///
    /// A rejected prop leaves the previous snapshot in place.
    pub fn apply_prop(&mut self, prop: SurfaceProp) -> Result<(), SurfaceError> {
        if self.is_torn_down() {
            return Err(SurfaceError::TornDown);
        }
        let mut next = SurfaceConfig::clone(&self.config());
        let mut settings_changed = false;
        let mut load = None;

        match prop {
            SurfaceProp::JavaScriptEnabled(enabled) => {
                next.settings.javascript_enabled = enabled;
                settings_changed = true;
            }
            SurfaceProp::ThirdPartyCookiesEnabled(enabled) => {
                next.settings.third_party_cookies_enabled = enabled;
                settings_changed = true;
            }
            SurfaceProp::ScalesPageToFit(scales) => {
                next.settings.use_wide_view_port = !scales;
                settings_changed = true;
            }
            SurfaceProp::DomStorageEnabled(enabled) => {
                next.settings.dom_storage_enabled = enabled;
                settings_changed = true;
            }
            SurfaceProp::UserAgent(user_agent) => {
                if let Some(ua) = user_agent {
                    self.render.set_user_agent(&ua);
                    next.user_agent = ua;
                }
            }
            SurfaceProp::MediaPlaybackRequiresUserAction(requires) => {
                next.settings.media_playback_requires_user_gesture = requires;
                settings_changed = true;
            }
            SurfaceProp::AllowUniversalAccessFromFileUrls(allow) => {
                next.settings.allow_universal_access_from_file_urls = allow;
                settings_changed = true;
            }
            SurfaceProp::SaveFormDataDisabled(disabled) => {
                next.settings.save_form_data = !disabled;
                settings_changed = true;
            }
            SurfaceProp::InjectedJavaScript(script) => next.injected_javascript = script,
            SurfaceProp::InjectedOnStartLoadingJavaScript(script) => {
                next.injected_on_start_loading_javascript = script
            }
            SurfaceProp::MessagingEnabled(enabled) => {
                self.bridge.set_enabled(self.render.as_mut(), enabled)?;
                next.messaging_enabled = enabled;
            }
            SurfaceProp::OnContentSizeChange(enabled) => {
                self.render.set_content_size_reporting(enabled);
                next.content_size_events = enabled;
            }
            SurfaceProp::MixedContentMode(mode) => match parse_mixed_content_mode(mode.as_deref()) {
                Some(mode) => {
                    next.settings.mixed_content_mode = mode;
                    settings_changed = true;
                }
                None => warn!(surface = %self.target, mode = ?mode, "unknown mixed content mode ignored"),
            },
            SurfaceProp::UrlPrefixesForDefaultIntent(prefixes) => {
                if let Some(prefixes) = prefixes {
                    next.url_prefixes_for_default_intent = prefixes;
                }
            }
            SurfaceProp::GeolocationEnabled(enabled) => {
                next.settings.geolocation_enabled = enabled.unwrap_or(false);
                settings_changed = true;
            }
            SurfaceProp::OriginWhitelist(patterns) => {
                if let Some(patterns) = patterns {
                    next.origin_whitelist = OriginWhitelist::compile(&patterns)?;
                }
            }
            SurfaceProp::Source(source) => {
                let plan = SourceLoad::plan(source.as_ref());
                if let SourceLoad::Url {
                    user_agent: Some(ua),
                    ..
                } = &plan
                {
                    self.render.set_user_agent(ua);
                    next.user_agent = ua.clone();
                }
                load = Some(plan);
            }
        }

        if settings_changed {
            self.render.apply_settings(&next.settings);
        }
        self.config_tx.send_replace(Arc::new(next));

        match load {
            Some(plan) => self.load_source(plan),
            None => Ok(()),
        }
    }

    fn load_source(&mut self, plan: SourceLoad) -> Result<(), SurfaceError> {
        debug!(surface = %self.target, plan = ?plan, "loading source");
        match plan {
            SourceLoad::Html { html, base_url } => {
                self.render
                    .load_data(&html, HTML_MIME_TYPE, HTML_ENCODING, base_url.as_deref())
            }
            SourceLoad::Post { url, body } => self.render.post_url(&url, &body),
            SourceLoad::Url { url, headers, .. } => self.render.load_url(&url, &headers),
            SourceLoad::Blank => self
                .render
                .load_url(crate::bridge::BLANK_URL, &Headers::new()),
        }
    }

    // -- host commands --

    pub fn dispatch(&mut self, command: SurfaceCommand) -> Result<(), SurfaceError> {
        if self.is_torn_down() {
            return Err(SurfaceError::TornDown);
        }
        debug!(surface = %self.target, command = command.name(), "dispatching command");
        match command {
            SurfaceCommand::GoBack => self.render.go_back(),
            SurfaceCommand::GoForward => self.render.go_forward(),
            SurfaceCommand::Reload => self.render.reload(),
            SurfaceCommand::StopLoading => self.render.stop_loading(),
            SurfaceCommand::PostMessage(payload) => self
                .strategy
                .evaluate(self.render.as_mut(), &post_message_script(&payload)),
            SurfaceCommand::InjectJavaScript(script) => {
                self.strategy.evaluate(self.render.as_mut(), &script)
            }
        }
    }

    /// Parse and dispatch a command sent by name.
    pub fn dispatch_named(&mut self, name: &str, args: &[Value]) -> Result<(), SurfaceError> {
        let command = SurfaceCommand::parse(name, args)?;
        self.dispatch(command)
    }

    // -- teardown --

    /// Navigate to a blank page, releasing page script and bridge bindings.
    pub fn unlink_bridge(&mut self) -> Result<(), SurfaceError> {
        if self.is_torn_down() {
            return Err(SurfaceError::TornDown);
        }
        self.bridge.unlink(self.render.as_mut())
    }

    /// Tear down: stop interception, drop queued tasks, release the engine.
    /// Safe to call more than once.
    pub fn destroy(&mut self) {
        if self.torn_down.swap(true, Ordering::AcqRel) {
            return;
        }
        let dropped = self.tasks.close();
        self.render.destroy();
        debug!(surface = %self.target, dropped_tasks = dropped, "surface torn down");
    }
}

impl HostLifecycle for Surface {
    fn on_host_resume(&mut self) {}

    fn on_host_pause(&mut self) {}

    fn on_host_destroy(&mut self) {
        self.destroy();
    }
}
