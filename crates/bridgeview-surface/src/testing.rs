//! Test doubles: a recording render surface and a scripted fetcher.

use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex};

use bridgeview_common::SurfaceError;
use reqwest::header::{HeaderMap, HeaderValue, CONTENT_TYPE, LOCATION};

use crate::intercept::{FetchedResponse, Fetcher};
use crate::render::{Headers, InterceptScope, Interceptor, RenderSurface};
use crate::settings::WebSettings;

/// One observable call made on the fake surface.
#[derive(Debug, Clone, PartialEq)]
pub(crate) enum Call {
    LoadUrl(String, Headers),
    LoadData {
        data: String,
        mime_type: String,
        encoding: String,
        base_url: Option<String>,
    },
    PostUrl(String, Vec<u8>),
    Evaluate(String),
    GoBack,
    GoForward,
    Reload,
    StopLoading,
    SetUserAgent(String),
    ApplySettings(WebSettings),
    AddInterface(String),
    RemoveInterface(String),
    RegisterInterceptor(InterceptScope),
    Scrollbars(bool),
    HardwareAccelerated,
    ContentSizeReporting(bool),
    Destroy,
}

/// Observable state shared between a [`FakeSurface`] and the test body.
#[derive(Default)]
pub(crate) struct FakeState {
    pub calls: Vec<Call>,
    pub progress: u8,
    pub title: String,
    pub can_go_back: bool,
    pub can_go_forward: bool,
    pub user_agent: String,
    pub interceptors: HashMap<InterceptScope, Interceptor>,
}

#[derive(Clone)]
pub(crate) struct FakeHandle(pub Arc<Mutex<FakeState>>);

impl FakeHandle {
    pub fn calls(&self) -> Vec<Call> {
        self.0.lock().unwrap().calls.clone()
    }

    pub fn clear(&self) {
        self.0.lock().unwrap().calls.clear();
    }

    pub fn set_progress(&self, progress: u8) {
        self.0.lock().unwrap().progress = progress;
    }

    pub fn set_title(&self, title: &str) {
        self.0.lock().unwrap().title = title.to_string();
    }

    pub fn set_history(&self, back: bool, forward: bool) {
        let mut state = self.0.lock().unwrap();
        state.can_go_back = back;
        state.can_go_forward = forward;
    }

    pub fn interceptor(&self, scope: InterceptScope) -> Option<Interceptor> {
        self.0.lock().unwrap().interceptors.get(&scope).cloned()
    }

    pub fn evaluated(&self) -> Vec<String> {
        self.calls()
            .into_iter()
            .filter_map(|c| match c {
                Call::Evaluate(script) => Some(script),
                _ => None,
            })
            .collect()
    }
}

/// A render surface that records every call.
pub(crate) struct FakeSurface {
    state: Arc<Mutex<FakeState>>,
    script_evaluation: bool,
    redirect_detection: bool,
}

impl FakeSurface {
    pub fn new() -> (Self, FakeHandle) {
        let state = Arc::new(Mutex::new(FakeState {
            user_agent: "FakeEngine/1.0".to_string(),
            ..Default::default()
        }));
        let surface = Self {
            state: Arc::clone(&state),
            script_evaluation: true,
            redirect_detection: true,
        };
        (surface, FakeHandle(state))
    }

    /// A surface on the older tier without direct script evaluation.
    pub fn legacy() -> (Self, FakeHandle) {
        let (mut surface, handle) = Self::new();
        surface.script_evaluation = false;
        surface.redirect_detection = false;
        (surface, handle)
    }

    fn record(&self, call: Call) {
        self.state.lock().unwrap().calls.push(call);
    }
}

impl RenderSurface for FakeSurface {
    fn load_url(&mut self, url: &str, headers: &Headers) -> Result<(), SurfaceError> {
        self.record(Call::LoadUrl(url.to_string(), headers.clone()));
        Ok(())
    }

    fn load_data(
        &mut self,
        data: &str,
        mime_type: &str,
        encoding: &str,
        base_url: Option<&str>,
    ) -> Result<(), SurfaceError> {
        self.record(Call::LoadData {
            data: data.to_string(),
            mime_type: mime_type.to_string(),
            encoding: encoding.to_string(),
            base_url: base_url.map(String::from),
        });
        Ok(())
    }

    fn post_url(&mut self, url: &str, body: &[u8]) -> Result<(), SurfaceError> {
        self.record(Call::PostUrl(url.to_string(), body.to_vec()));
        Ok(())
    }

    fn evaluate_script(&mut self, script: &str) -> Result<(), SurfaceError> {
        self.record(Call::Evaluate(script.to_string()));
        Ok(())
    }

    fn supports_script_evaluation(&self) -> bool {
        self.script_evaluation
    }

    fn supports_redirect_detection(&self) -> bool {
        self.redirect_detection
    }

    fn progress(&self) -> u8 {
        self.state.lock().unwrap().progress
    }

    fn title(&self) -> String {
        self.state.lock().unwrap().title.clone()
    }

    fn can_go_back(&self) -> bool {
        self.state.lock().unwrap().can_go_back
    }

    fn can_go_forward(&self) -> bool {
        self.state.lock().unwrap().can_go_forward
    }

    fn go_back(&mut self) -> Result<(), SurfaceError> {
        self.record(Call::GoBack);
        Ok(())
    }

    fn go_forward(&mut self) -> Result<(), SurfaceError> {
        self.record(Call::GoForward);
        Ok(())
    }

    fn reload(&mut self) -> Result<(), SurfaceError> {
        self.record(Call::Reload);
        Ok(())
    }

    fn stop_loading(&mut self) -> Result<(), SurfaceError> {
        self.record(Call::StopLoading);
        Ok(())
    }

    fn user_agent(&self) -> String {
        self.state.lock().unwrap().user_agent.clone()
    }

    fn set_user_agent(&mut self, user_agent: &str) {
        self.state.lock().unwrap().user_agent = user_agent.to_string();
        self.record(Call::SetUserAgent(user_agent.to_string()));
    }

    fn apply_settings(&mut self, settings: &WebSettings) {
        self.record(Call::ApplySettings(settings.clone()));
    }

    fn add_script_interface(&mut self, name: &str) -> Result<(), SurfaceError> {
        self.record(Call::AddInterface(name.to_string()));
        Ok(())
    }

    fn remove_script_interface(&mut self, name: &str) -> Result<(), SurfaceError> {
        self.record(Call::RemoveInterface(name.to_string()));
        Ok(())
    }

    fn register_interceptor(&mut self, scope: InterceptScope, interceptor: Interceptor) {
        self.state
            .lock()
            .unwrap()
            .interceptors
            .insert(scope, interceptor);
        self.record(Call::RegisterInterceptor(scope));
    }

    fn set_scrollbars_enabled(&mut self, enabled: bool) {
        self.record(Call::Scrollbars(enabled));
    }

    fn set_hardware_accelerated(&mut self) {
        self.record(Call::HardwareAccelerated);
    }

    fn set_content_size_reporting(&mut self, enabled: bool) {
        self.record(Call::ContentSizeReporting(enabled));
    }

    fn destroy(&mut self) {
        self.record(Call::Destroy);
    }
}

/// A canned upstream response.
#[derive(Clone)]
pub(crate) struct Canned {
    pub status: u16,
    pub content_type: Option<&'static str>,
    pub location: Option<&'static str>,
    pub body: Vec<u8>,
}

impl Canned {
    pub fn html(status: u16, body: &str) -> Self {
        Self {
            status,
            content_type: Some("text/html; charset=utf-8"),
            location: None,
            body: body.as_bytes().to_vec(),
        }
    }
}

/// A fetcher that replays canned responses and records each request.
#[derive(Default)]
pub(crate) struct ScriptedFetcher {
    responses: Mutex<VecDeque<Result<Canned, SurfaceError>>>,
    pub requests: Mutex<Vec<(String, String)>>,
}

impl ScriptedFetcher {
    pub fn with(responses: Vec<Result<Canned, SurfaceError>>) -> Self {
        Self {
            responses: Mutex::new(responses.into()),
            requests: Mutex::new(Vec::new()),
        }
    }

    pub fn request_count(&self) -> usize {
        self.requests.lock().unwrap().len()
    }
}

impl Fetcher for ScriptedFetcher {
    fn fetch(&self, url: &str, user_agent: &str) -> Result<FetchedResponse, SurfaceError> {
        self.requests
            .lock()
            .unwrap()
            .push((url.to_string(), user_agent.to_string()));
        let canned = self
            .responses
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Err(SurfaceError::Fetch("no canned response".into())))?;
        let mut headers = HeaderMap::new();
        if let Some(ct) = canned.content_type {
            headers.insert(CONTENT_TYPE, HeaderValue::from_static(ct));
        }
        if let Some(location) = canned.location {
            headers.insert(LOCATION, HeaderValue::from_static(location));
        }
        Ok(FetchedResponse {
            status: canned.status,
            headers,
            body: Box::new(std::io::Cursor::new(canned.body)),
        })
    }
}
