use std::path::PathBuf;

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("config file not found: {0}")]
    FileNotFound(PathBuf),

    #[error("config parse error: {0}")]
    ParseError(String),

    #[error("config validation error: {0}")]
    ValidationError(String),
}

#[derive(Debug, thiserror::Error)]
pub enum SurfaceError {
    #[error("render surface error: {0}")]
    Render(String),

    #[error("fetch error: {0}")]
    Fetch(String),

    #[error("invalid origin pattern '{pattern}': {reason}")]
    InvalidPattern { pattern: String, reason: String },

    #[error("invalid command: {0}")]
    InvalidCommand(String),

    #[error("invalid payload: {0}")]
    InvalidPayload(String),

    #[error("asset error: {0}")]
    Asset(String),

    #[error("surface has been torn down")]
    TornDown,
}

#[derive(Debug, thiserror::Error)]
pub enum BridgeviewError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Surface(#[from] SurfaceError),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error("{0}")]
    Other(String),
}
