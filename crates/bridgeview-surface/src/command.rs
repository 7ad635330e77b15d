//! Host commands dispatched to a surface.

use bridgeview_common::SurfaceError;
use serde_json::Value;

/// An action the host asks the active surface to perform.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SurfaceCommand {
    GoBack,
    GoForward,
    Reload,
    StopLoading,
    /// Deliver a message to page script as a `message` event.
    PostMessage(String),
    /// Evaluate arbitrary script in the page.
    InjectJavaScript(String),
}

/// Host command names and their numeric ids, in id order.
pub const COMMAND_NAMES: &[(&str, u32)] = &[
    ("goBack", 1),
    ("goForward", 2),
    ("reload", 3),
    ("stopLoading", 4),
    ("postMessage", 5),
    ("injectJavaScript", 6),
];

impl SurfaceCommand {
    /// Parse a command by name with its host-supplied arguments.
    pub fn parse(name: &str, args: &[Value]) -> Result<Self, SurfaceError> {
        match name {
            "goBack" => Ok(Self::GoBack),
            "goForward" => Ok(Self::GoForward),
            "reload" => Ok(Self::Reload),
            "stopLoading" => Ok(Self::StopLoading),
            "postMessage" => string_arg(name, args).map(Self::PostMessage),
            "injectJavaScript" => string_arg(name, args).map(Self::InjectJavaScript),
            other => Err(SurfaceError::InvalidCommand(format!(
                "unknown command '{other}'"
            ))),
        }
    }

    /// Parse a command by numeric id.
    pub fn from_id(id: u32, args: &[Value]) -> Result<Self, SurfaceError> {
        let name = COMMAND_NAMES
            .iter()
            .find(|(_, command_id)| *command_id == id)
            .map(|(name, _)| *name)
            .ok_or_else(|| SurfaceError::InvalidCommand(format!("unknown command id {id}")))?;
        Self::parse(name, args)
    }

    pub fn name(&self) -> &'static str {
        match self {
            Self::GoBack => "goBack",
            Self::GoForward => "goForward",
            Self::Reload => "reload",
            Self::StopLoading => "stopLoading",
            Self::PostMessage(_) => "postMessage",
            Self::InjectJavaScript(_) => "injectJavaScript",
        }
    }

    pub fn id(&self) -> u32 {
        COMMAND_NAMES
            .iter()
            .find(|(name, _)| *name == self.name())
            .map(|(_, id)| *id)
            .unwrap_or_default()
    }
}

fn string_arg(command: &str, args: &[Value]) -> Result<String, SurfaceError> {
    match args.first() {
        Some(Value::String(s)) => Ok(s.clone()),
        Some(other) => Err(SurfaceError::InvalidCommand(format!(
            "{command} expects a string argument, got {other}"
        ))),
        None => Err(SurfaceError::InvalidCommand(format!(
            "{command} requires 1 argument"
        ))),
    }
}
