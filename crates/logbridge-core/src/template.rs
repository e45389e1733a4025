//! Managed wrapper around native templates.
//!
//! # Example
//!
//! ```rust,ignore
//! let mut template = LogTemplate::new(native.engine().clone(), native.config_handle())?;
//! template.compile("${HOST} ${MESSAGE}")?;
//!
//! let line = template.format(&message)?;
//! let stamped = template.format_with(
//!     &message,
//!     FormatOptions::new().time_zone(TimeZone::Local).seqnum(42),
//! )?;
//! ```

use std::fmt;
use std::sync::Arc;

use tracing::trace;

use crate::error::{BridgeError, BridgeResult};
use crate::handle::{ConfigHandle, TemplateHandle, TemplateOptionsHandle};
use crate::message::LogMessage;
use crate::native::{NativeEngine, TimeZone};

/// Optional arguments of [`LogTemplate::format_with`].
///
/// Defaults: no template options, [`TimeZone::Send`], sequence number 0.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FormatOptions {
    template_options: Option<TemplateOptionsHandle>,
    time_zone: TimeZone,
    seqnum: u32,
}

impl FormatOptions {
    pub fn new() -> Self {
        Self::default()
    }

    /// Native template options (precision, local time-zone override).
    pub fn template_options(mut self, handle: TemplateOptionsHandle) -> Self {
        self.template_options = Some(handle);
        self
    }

    pub fn time_zone(mut self, time_zone: TimeZone) -> Self {
        self.time_zone = time_zone;
        self
    }

    pub fn seqnum(mut self, seqnum: u32) -> Self {
        self.seqnum = seqnum;
        self
    }
}

/// A reference-counted native template.
///
/// Creating a `LogTemplate` acquires one native reference; the reference is
/// returned exactly once, by [`release`](Self::release) or on drop. A
/// template is compiled once and may then be formatted any number of times.
pub struct LogTemplate {
    engine: Arc<dyn NativeEngine>,
    config: ConfigHandle,
    handle: TemplateHandle,
    source: Option<String>,
}

impl LogTemplate {
    /// Creates a new template instance against the native configuration.
    pub fn new(engine: Arc<dyn NativeEngine>, config: ConfigHandle) -> BridgeResult<Self> {
        let handle = engine.new_template(config)?;
        trace!(template = %handle, config = %config, "Template created");
        Ok(Self {
            engine,
            config,
            handle,
            source: None,
        })
    }

    /// Compiles the template text.
    ///
    /// A template compiles once; compiling again returns
    /// [`BridgeError::TemplateAlreadyCompiled`] and leaves the existing compiled
    /// form untouched.
    pub fn compile(&mut self, text: &str) -> BridgeResult<()> {
        if self.source.is_some() {
            return Err(BridgeError::TemplateAlreadyCompiled);
        }
        self.engine.compile_template(self.handle, text)?;
        self.source = Some(text.to_string());
        Ok(())
    }

    /// Returns `true` once [`compile`](Self::compile) has succeeded.
    pub fn is_compiled(&self) -> bool {
        self.source.is_some()
    }

    /// Returns the compiled template text.
    pub fn source(&self) -> Option<&str> {
        self.source.as_deref()
    }

    /// Returns the configuration handle the template was created against.
    pub fn config_handle(&self) -> ConfigHandle {
        self.config
    }

    /// Formats `message` with default options: no template options, send
    /// time zone, sequence number 0.
    pub fn format(&self, message: &LogMessage) -> BridgeResult<String> {
        self.format_with(message, FormatOptions::default())
    }

    /// Formats `message` with explicit options.
    pub fn format_with(&self, message: &LogMessage, options: FormatOptions) -> BridgeResult<String> {
        if self.source.is_none() {
            return Err(BridgeError::TemplateNotCompiled);
        }
        self.engine.format_template(
            self.handle,
            message.handle(),
            options.template_options,
            options.time_zone,
            options.seqnum,
        )
    }

    /// Releases the native reference.
    pub fn release(self) {
        drop(self);
    }
}

impl Drop for LogTemplate {
    fn drop(&mut self) {
        trace!(template = %self.handle, "Template released");
        self.engine.unref_template(self.handle);
    }
}

impl fmt::Debug for LogTemplate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LogTemplate")
            .field("handle", &self.handle)
            .field("config", &self.config)
            .field("source", &self.source)
            .finish()
    }
}
