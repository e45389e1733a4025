//! Error types for options and the destination lifecycle.

use thiserror::Error;

use crate::destination::{DestinationState, Operation};

/// Boxed error returned by plugin hooks.
pub type DestinationError = Box<dyn std::error::Error + Send + Sync>;

/// A configuration value is missing or invalid.
///
/// The `Display` text is what ends up in the diagnostics channel, so every
/// variant names the offending option.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum OptionError {
    #[error("option {name} is a required option")]
    Required { name: String },

    #[error("option {name} must be an integer, got `{value}`")]
    NotInteger { name: String, value: String },

    #[error("option {name} must be a boolean (yes/no, true/false, on/off, 1/0), got `{value}`")]
    NotBoolean { name: String, value: String },

    #[error("option {name} must be between {min} and {max}, got {value}")]
    OutOfRange {
        name: String,
        value: i64,
        min: i64,
        max: i64,
    },

    #[error("option {name} must be a valid port number (1-65535), got {value}")]
    InvalidPort { name: String, value: i64 },

    #[error("option {name} must be one of [{allowed}], got `{value}`")]
    NotAllowed {
        name: String,
        value: String,
        allowed: String,
    },

    #[error("option {name} cannot be used together with option {other}")]
    MutuallyExclusive { name: String, other: String },

    #[error("option {name} must not contain empty list items")]
    EmptyListItem { name: String },

    #[error("option {name}: failed to compile template: {reason}")]
    Template { name: String, reason: String },

    #[error("option {name} is declared more than once")]
    Duplicate { name: String },
}

impl OptionError {
    /// Creates a required-option error.
    pub fn required(name: impl Into<String>) -> Self {
        Self::Required { name: name.into() }
    }
}

/// Result type for option operations.
pub type OptionResult<T> = Result<T, OptionError>;

/// A lifecycle call failed or was not allowed.
#[derive(Debug, Error)]
pub enum LifecycleError {
    /// The call does not match the current state.
    #[error("cannot {operation} destination {name} in state {state}")]
    InvalidTransition {
        name: String,
        operation: Operation,
        state: DestinationState,
    },

    /// A previous `init` failed; the instance stays unusable.
    #[error("destination {name} failed to initialize and cannot be used")]
    Unusable { name: String },

    /// A configured option was rejected.
    #[error("destination {name}: {source}")]
    Option {
        name: String,
        #[source]
        source: OptionError,
    },

    /// A plugin hook reported an error.
    #[error("destination {name} failed to {operation}: {source}")]
    Hook {
        name: String,
        operation: Operation,
        #[source]
        source: DestinationError,
    },
}

/// Result type for lifecycle operations.
pub type LifecycleResult<T> = Result<T, LifecycleError>;
