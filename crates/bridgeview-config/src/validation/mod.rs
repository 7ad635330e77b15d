//! Full configuration validation.
//!
//! Each section has its own validator; this orchestrator calls them all
//! and collects errors into a single `ConfigError`.

mod helpers;
mod sections;

#[cfg(test)]
mod tests;

use crate::schema::BridgeviewConfig;
use bridgeview_common::ConfigError;

/// Run all validations on a config, collecting all errors.
pub fn validate(config: &BridgeviewConfig) -> Result<(), ConfigError> {
    let mut errors: Vec<String> = Vec::new();

    sections::validate_interception(&mut errors, config);
    sections::validate_bridge(&mut errors, config);
    sections::validate_navigation(&mut errors, config);

    if errors.is_empty() {
        Ok(())
    } else {
        Err(ConfigError::ValidationError(errors.join("; ")))
    }
}
