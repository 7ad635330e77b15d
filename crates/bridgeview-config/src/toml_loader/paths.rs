//! Where the engine config lives, and writing the commented default.

use bridgeview_common::ConfigError;
use std::ffi::OsString;
use std::path::{Path, PathBuf};
use tracing::info;

use super::template::default_config_toml;

/// Environment variable that points at an alternative config file.
pub const CONFIG_PATH_ENV: &str = "BRIDGEVIEW_CONFIG";

/// The config file path: `$BRIDGEVIEW_CONFIG` when set and non-empty,
/// otherwise `<config dir>/bridgeview/config.toml`.
pub fn default_config_path() -> Result<PathBuf, ConfigError> {
    config_path_from(std::env::var_os(CONFIG_PATH_ENV), dirs::config_dir())
}

fn config_path_from(
    override_path: Option<OsString>,
    config_dir: Option<PathBuf>,
) -> Result<PathBuf, ConfigError> {
    if let Some(path) = override_path.filter(|p| !p.is_empty()) {
        return Ok(PathBuf::from(path));
    }
    config_dir
        .map(|dir| dir.join("bridgeview").join("config.toml"))
        .ok_or_else(|| ConfigError::ParseError("no platform config directory".into()))
}

/// Write the commented default config to `path`, creating parent dirs.
pub fn create_default_config(path: &Path) -> Result<(), ConfigError> {
    let write_failed =
        |what: &str, e: std::io::Error| ConfigError::ParseError(format!("{what} {}: {e}", path.display()));

    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent).map_err(|e| write_failed("cannot create directory for", e))?;
    }
    std::fs::write(path, default_config_toml()).map_err(|e| write_failed("cannot write", e))?;

    info!(path = %path.display(), "default config written");
    Ok(())
}
