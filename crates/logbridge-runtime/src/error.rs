//! Runtime error types.

use thiserror::Error;

use crate::config::ConfigError;

/// Errors that can occur during runtime operations.
#[derive(Error, Debug)]
pub enum RuntimeError {
    /// Configuration could not be loaded or is invalid.
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// No descriptor is registered for the class.
    #[error("Unknown destination class: {0}")]
    UnknownClass(String),

    /// A descriptor with the same class name is already registered.
    #[error("Destination class already registered: {0}")]
    DuplicateClass(String),

    /// The descriptor was built against an incompatible API version.
    #[error("Destination class {class} uses API version {version:#010x}, which this host does not support")]
    IncompatibleApi { class: String, version: u32 },

    /// The destination could not be constructed.
    #[error("Failed to construct destination {id}: {source}")]
    Construct {
        id: String,
        #[source]
        source: logbridge_framework::LifecycleError,
    },

    /// No destination with that ID is running.
    #[error("Destination not found: {0}")]
    DestinationNotFound(String),

    /// A native handle could not be acquired.
    #[error("Native engine error: {0}")]
    Native(#[from] logbridge_core::BridgeError),
}

/// Result type for runtime operations.
pub type RuntimeResult<T> = Result<T, RuntimeError>;
