//! Reading an engine config from disk.

use crate::schema::BridgeviewConfig;
use crate::validation;
use bridgeview_common::ConfigError;
use std::path::Path;
use tracing::{debug, info, warn};

use super::paths::{create_default_config, default_config_path};

/// Parse the TOML file at `path`. Missing fields take their defaults.
///
/// Validation problems are logged, not returned; callers that need a
/// strict check run [`validation::validate`] themselves.
pub fn load_from_path(path: &Path) -> Result<BridgeviewConfig, ConfigError> {
    let content = match std::fs::read_to_string(path) {
        Ok(content) => content,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            return Err(ConfigError::FileNotFound(path.to_path_buf()))
        }
        Err(e) => {
            return Err(ConfigError::ParseError(format!(
                "cannot read {}: {e}",
                path.display()
            )))
        }
    };

    let config: BridgeviewConfig = toml::from_str(&content)
        .map_err(|e| ConfigError::ParseError(format!("{}: {e}", path.display())))?;

    if let Err(e) = validation::validate(&config) {
        warn!(path = %path.display(), "config has invalid values: {e}");
    }

    debug!(path = %path.display(), "config loaded");
    Ok(config)
}

/// Load the config from [`default_config_path`], writing the commented
/// default first when no file exists yet.
pub fn load_default() -> Result<BridgeviewConfig, ConfigError> {
    let path = default_config_path()?;

    match load_from_path(&path) {
        Err(ConfigError::FileNotFound(_)) => {
            info!(path = %path.display(), "no config file; writing defaults");
            create_default_config(&path)?;
            Ok(BridgeviewConfig::default())
        }
        other => other,
    }
}
