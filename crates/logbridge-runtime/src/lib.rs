//! Logbridge Runtime - Host layer for logbridge destinations.
//!
//! This crate provides:
//! - Layered configuration (`ConfigLoader`): defaults, profile and main
//!   files, then `LOGBRIDGE_` environment variables
//! - Logging setup on `tracing-subscriber` (`LoggingBuilder`)
//! - The destination class registry (`DestinationRegistry`)
//! - Runtime orchestration (`BridgeRuntime`): builds the configured
//!   destinations and drives them through their lifecycle
//!
//! # Configuration Formats
//!
//! File formats follow the enabled cargo features:
//!
//! - `toml-config` (default): `logbridge.toml`, `config.toml`
//! - `yaml-config`: `logbridge.yaml`, `config.yaml`
//! - `json-log`: enables the JSON log format
//!
//! ```toml
//! [logging]
//! level = "debug"
//!
//! [diagnostics]
//! level = "info"
//!
//! [[destinations]]
//! id = "audit"
//! class = "line-writer"
//! options = { path = "/var/log/audit.log", flush_lines = 16 }
//! ```
//!
//! ```ignore
//! use logbridge_runtime::BridgeRuntime;
//!
//! fn main() -> anyhow::Result<()> {
//!     let mut runtime = BridgeRuntime::builder()
//!         .register(line_writer::DESCRIPTOR)
//!         .build()?;
//!
//!     let stats = runtime.start()?;
//!     tracing::info!(opened = stats.opened, "ready");
//!
//!     runtime.stop();
//!     Ok(())
//! }
//! ```

pub mod config;
pub mod error;
pub mod logging;
pub mod registry;
pub mod runtime;

// Re-exports
pub use config::{
    ConfigError, ConfigLoader, ConfigResult, DestinationConfig, DiagnosticsConfig,
    LogbridgeConfig, LoggingConfig, Profile,
};
pub use error::{RuntimeError, RuntimeResult};
pub use logging::LoggingBuilder;
pub use registry::DestinationRegistry;
pub use runtime::{BridgeRuntime, RuntimeBuilder, RuntimeStats, install_diagnostics};

// Re-export tracing for use by other crates
pub use tracing;
pub use tracing_subscriber;

/// Prelude module for convenient imports.
///
/// This provides all the commonly used logging macros:
/// - `trace!`, `debug!`, `info!`, `warn!`, `error!`
/// - `span`, `event`
/// - `instrument` attribute
/// - `Level` for span creation
pub mod prelude {
    pub use tracing::{Level, debug, error, event, info, instrument, span, trace, warn};
}
