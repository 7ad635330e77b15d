pub mod errors;
pub mod types;

pub use errors::{BridgeviewError, ConfigError, SurfaceError};
pub use types::TargetId;

pub type Result<T> = std::result::Result<T, BridgeviewError>;
