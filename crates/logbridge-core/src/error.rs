//! Error types for the native boundary.
//!
//! Option and lifecycle errors live in `logbridge-framework`; this module only
//! covers what can go wrong when talking to native objects.

use thiserror::Error;

/// Errors raised by handle wrappers and [`NativeEngine`](crate::NativeEngine)
/// implementations.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BridgeError {
    /// `format` was called before a successful `compile`.
    #[error("template is not compiled")]
    TemplateNotCompiled,

    /// `compile` was called on a template that already holds a compiled form.
    #[error("template is already compiled")]
    TemplateAlreadyCompiled,

    /// The native side rejected the template text.
    #[error("error compiling template: {0}")]
    TemplateCompile(String),

    /// The native side does not know the handle (stale or never issued).
    #[error("unknown {kind} handle {raw:#x}")]
    UnknownHandle {
        /// Resource kind, e.g. `"template"`.
        kind: &'static str,
        /// Raw handle value.
        raw: u64,
    },

    /// Any other native failure.
    #[error("native call failed: {0}")]
    Native(String),
}

impl BridgeError {
    /// Creates an unknown-handle error.
    pub fn unknown_handle(kind: &'static str, raw: u64) -> Self {
        Self::UnknownHandle { kind, raw }
    }
}

/// Result type for native boundary operations.
pub type BridgeResult<T> = Result<T, BridgeError>;
