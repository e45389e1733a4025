//! The native services a destination plugin may call.
//!
//! [`NativeEngine`] is the whole surface the managed side consumes: template
//! management, message reference counting and message field access. The
//! engine owns every object behind a handle; the managed side only ever holds
//! handles and must keep acquire/release balanced.
//!
//! ```text
//! ManagedDestination ──► LogTemplate ──┐
//!                    ──► LogMessage  ──┼──► Arc<dyn NativeEngine> ──► native objects
//!                    ──► Diagnostics ──┘ (separate sink)
//! ```

use std::fmt;
use std::sync::Arc;

use crate::diagnostics::Diagnostics;
use crate::error::BridgeResult;
use crate::handle::{ConfigHandle, MessageHandle, TemplateHandle, TemplateOptionsHandle};

/// Time zone selection when rendering date macros.
#[repr(i32)]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum TimeZone {
    /// The local time zone of the machine (or the template options override).
    Local = 0,
    /// The time zone embedded in the message's send timestamp.
    #[default]
    Send = 1,
}

impl TimeZone {
    /// Maps the native integer constant to a variant.
    pub fn from_raw(raw: i32) -> Option<Self> {
        match raw {
            0 => Some(Self::Local),
            1 => Some(Self::Send),
            _ => None,
        }
    }

    /// Returns the native integer constant.
    pub fn as_raw(self) -> i32 {
        self as i32
    }
}

/// Native template and message services.
///
/// Implementations must be thread-safe: distinct destination instances may be
/// driven from different native worker threads.
pub trait NativeEngine: Send + Sync {
    /// Creates a new, uncompiled template bound to `config` with a reference
    /// count of one.
    fn new_template(&self, config: ConfigHandle) -> BridgeResult<TemplateHandle>;

    /// Compiles `text` into the template.
    fn compile_template(&self, template: TemplateHandle, text: &str) -> BridgeResult<()>;

    /// Renders the template against a message. Must not mutate the message.
    fn format_template(
        &self,
        template: TemplateHandle,
        message: MessageHandle,
        options: Option<TemplateOptionsHandle>,
        time_zone: TimeZone,
        seqnum: u32,
    ) -> BridgeResult<String>;

    /// Drops one reference to the template.
    fn unref_template(&self, template: TemplateHandle);

    /// Looks up a name-value pair on the message.
    fn message_value(&self, message: MessageHandle, name: &str) -> Option<String>;

    /// Drops the reference the managed side holds on a message.
    fn unref_message(&self, message: MessageHandle);
}

/// Everything a destination needs from its native host, bundled for
/// injection.
#[derive(Clone)]
pub struct NativeContext {
    engine: Arc<dyn NativeEngine>,
    config: ConfigHandle,
    diagnostics: Diagnostics,
}

impl NativeContext {
    /// Creates a context using the process-wide diagnostics channel.
    pub fn new(engine: Arc<dyn NativeEngine>, config: ConfigHandle) -> Self {
        Self {
            engine,
            config,
            diagnostics: Diagnostics::global(),
        }
    }

    /// Replaces the diagnostics channel (tests inject a capturing sink here).
    pub fn with_diagnostics(mut self, diagnostics: Diagnostics) -> Self {
        self.diagnostics = diagnostics;
        self
    }

    /// Returns the native engine.
    pub fn engine(&self) -> &Arc<dyn NativeEngine> {
        &self.engine
    }

    /// Returns the native configuration handle templates are created against.
    pub fn config_handle(&self) -> ConfigHandle {
        self.config
    }

    /// Returns the diagnostics channel.
    pub fn diagnostics(&self) -> &Diagnostics {
        &self.diagnostics
    }
}

impl fmt::Debug for NativeContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NativeContext")
            .field("config", &self.config)
            .field("diagnostics", &self.diagnostics)
            .finish()
    }
}
