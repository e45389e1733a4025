//! Host configuration: loading, schema and validation.

pub mod error;
pub mod loader;
pub mod schema;
pub mod validation;

pub use error::{ConfigError, ConfigResult};
pub use loader::{ConfigLoader, Profile, load_config, load_config_from_file};
pub use schema::{
    DestinationConfig, DiagnosticsConfig, LogFormat, LogLevel, LogOutput, LogbridgeConfig,
    LoggingConfig,
};
pub use validation::{validate_config, validate_diagnostics_level};
