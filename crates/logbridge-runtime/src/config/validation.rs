//! Configuration validation utilities.

use std::collections::HashSet;

use logbridge_core::Level;

use super::error::{ConfigError, ConfigResult};
use super::schema::{DestinationConfig, LogOutput, LogbridgeConfig};

/// Validates the entire configuration.
pub fn validate_config(config: &LogbridgeConfig) -> ConfigResult<()> {
    validate_logging_config(config)?;
    validate_diagnostics_level(&config.diagnostics.level)?;
    validate_destinations_config(&config.destinations)?;
    Ok(())
}

/// Validates logging settings.
fn validate_logging_config(config: &LogbridgeConfig) -> ConfigResult<()> {
    if config.logging.output == LogOutput::File && config.logging.file_path.is_none() {
        return Err(ConfigError::missing_field("logging.file_path"));
    }
    Ok(())
}

/// Validates the diagnostics level spelling.
pub fn validate_diagnostics_level(level: &str) -> ConfigResult<Level> {
    level
        .parse()
        .map_err(|_| ConfigError::InvalidDiagnosticsLevel(level.to_string()))
}

/// Validates all destination configurations.
fn validate_destinations_config(destinations: &[DestinationConfig]) -> ConfigResult<()> {
    let mut seen_ids = HashSet::new();

    for destination in destinations {
        validate_destination_config(destination)?;

        if !seen_ids.insert(&destination.id) {
            return Err(ConfigError::DuplicateDestinationId(destination.id.clone()));
        }
    }

    Ok(())
}

/// Validates a single destination configuration.
fn validate_destination_config(destination: &DestinationConfig) -> ConfigResult<()> {
    if destination.id.is_empty() {
        return Err(ConfigError::missing_field("destination.id"));
    }

    if destination.id.contains(char::is_whitespace) {
        return Err(ConfigError::validation(format!(
            "Destination ID cannot contain whitespace: {:?}",
            destination.id
        )));
    }

    if destination.class.is_empty() {
        return Err(ConfigError::missing_field(format!(
            "destinations.{}.class",
            destination.id
        )));
    }

    if let Some(name) = destination.options.keys().find(|name| name.is_empty()) {
        return Err(ConfigError::validation(format!(
            "Destination {} has an option with an empty name {name:?}",
            destination.id
        )));
    }

    Ok(())
}
