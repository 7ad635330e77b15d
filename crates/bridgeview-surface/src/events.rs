//! Host-visible surface events.

use std::sync::{Arc, Mutex};

use bridgeview_common::TargetId;
use serde::{Deserialize, Serialize};

/// Navigation state carried by the loading events.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NavigationState {
    pub target: TargetId,
    pub url: String,
    pub loading: bool,
    pub title: String,
    pub can_go_back: bool,
    pub can_go_forward: bool,
}

/// Payload of `loadingError`: the navigation state plus the failure.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LoadError {
    #[serde(flatten)]
    pub state: NavigationState,
    pub code: i32,
    pub description: String,
}

/// Events emitted by a surface, serialized as `{"event": ..., "payload": ...}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "event", content = "payload", rename_all = "camelCase")]
pub enum SurfaceEvent {
    LoadingStart(NavigationState),
    LoadingFinish(NavigationState),
    LoadingError(LoadError),
    /// A bridge message from page script. The payload is not interpreted.
    Message { target: TargetId, message: String },
    Progress { target: TargetId, progress: u8 },
    #[serde(rename_all = "camelCase")]
    ContentSizeChange {
        target: TargetId,
        width: u32,
        height: u32,
    },
}

impl SurfaceEvent {
    /// Host-facing event name.
    pub fn name(&self) -> &'static str {
        match self {
            Self::LoadingStart(_) => "loadingStart",
            Self::LoadingFinish(_) => "loadingFinish",
            Self::LoadingError(_) => "loadingError",
            Self::Message { .. } => "message",
            Self::Progress { .. } => "progress",
            Self::ContentSizeChange { .. } => "contentSizeChange",
        }
    }

    pub fn target(&self) -> TargetId {
        match self {
            Self::LoadingStart(state) | Self::LoadingFinish(state) => state.target,
            Self::LoadingError(error) => error.state.target,
            Self::Message { target, .. }
            | Self::Progress { target, .. }
            | Self::ContentSizeChange { target, .. } => *target,
        }
    }
}

/// Event sink shared by every surface; the host drains it on its own loop.
#[derive(Debug, Clone, Default)]
pub struct EventQueue {
    events: Arc<Mutex<Vec<SurfaceEvent>>>,
}

impl EventQueue {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&self, event: SurfaceEvent) {
        if let Ok(mut events) = self.events.lock() {
            events.push(event);
        }
    }

    /// Take all pending events in emission order.
    pub fn drain(&self) -> Vec<SurfaceEvent> {
        match self.events.lock() {
            Ok(mut events) => std::mem::take(&mut *events),
            Err(_) => Vec::new(),
        }
    }

    pub fn len(&self) -> usize {
        self.events.lock().map(|e| e.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
