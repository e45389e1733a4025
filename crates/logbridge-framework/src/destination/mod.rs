//! The destination plugin contract and its managed lifecycle.
//!
//! Plugin authors implement [`Destination`]; the host wraps each instance in
//! a [`ManagedDestination`], which owns the declared [`Options`], enforces
//! the [`DestinationState`] transitions, reports failures through the
//! diagnostics channel and releases every message it is handed.

mod managed;
mod state;

use std::fmt;
use std::sync::Arc;

use logbridge_core::LogMessage;

use crate::context::DestinationContext;
use crate::error::{DestinationError, OptionResult};
use crate::options::Options;

pub use managed::ManagedDestination;
pub use state::{DestinationState, Operation};

// ─── SendStatus ───────────────────────────────────────────────────────────────

/// Outcome of a `send` or `flush`, as understood by the native engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(i32)]
pub enum SendStatus {
    /// The message was delivered.
    Success = 0,
    /// Delivery failed; the engine applies its retry policy.
    Error = 1,
    /// The message was dropped deliberately and must not be retried.
    Drop = 2,
    /// The destination is not connected; the engine should reopen it.
    NotConnected = 3,
    /// The message was accepted into a batch; a later `flush` delivers it.
    Queued = 4,
}

impl SendStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Success => "success",
            Self::Error => "error",
            Self::Drop => "drop",
            Self::NotConnected => "not-connected",
            Self::Queued => "queued",
        }
    }

    /// `true` for statuses that leave nothing to retry.
    pub fn is_delivered(self) -> bool {
        matches!(self, Self::Success | Self::Queued | Self::Drop)
    }
}

impl fmt::Display for SendStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ─── Destination ──────────────────────────────────────────────────────────────

/// A destination plugin.
///
/// Every hook except [`send`](Self::send) has a default, so a minimal
/// destination only implements delivery. Hooks receive the initialized
/// [`Options`] they declared in [`declare_options`](Self::declare_options).
///
/// The host never calls a hook out of order: [`ManagedDestination`] rejects
/// calls that do not match the current state before they reach the plugin.
///
/// # Example
///
/// ```rust,ignore
/// struct Stdout;
///
/// impl Destination for Stdout {
///     fn declare_options(
///         &mut self,
///         ctx: &Arc<DestinationContext>,
///         options: &mut Options,
///     ) -> OptionResult<()> {
///         options.put(TemplateOption::with_default(ctx.clone(), "template", "$MSG"))
///     }
///
///     fn send(&mut self, message: &LogMessage, options: &Options) -> SendStatus {
///         match options.template("template").map(|t| t.format(message)) {
///             Some(Ok(line)) => {
///                 println!("{line}");
///                 SendStatus::Success
///             }
///             _ => SendStatus::Error,
///         }
///     }
/// }
/// ```
pub trait Destination: Send {
    /// Declares the options this destination reads. Called once, at
    /// construction.
    fn declare_options(
        &mut self,
        context: &Arc<DestinationContext>,
        options: &mut Options,
    ) -> OptionResult<()> {
        let _ = (context, options);
        Ok(())
    }

    /// A stable label for this instance, available before `init`.
    ///
    /// Hosts use it to tell instances apart across restarts, so it should be
    /// derived from the options that make the instance unique.
    fn name_by_uniq_options(&self, context: &DestinationContext) -> String {
        format!("{}#{}", context.class_name(), context.handle().as_raw())
    }

    /// Called after every declared option initialized successfully.
    fn init(&mut self, options: &Options) -> Result<(), DestinationError> {
        let _ = options;
        Ok(())
    }

    /// Connects to the target. May be called again after a failure or after
    /// `close`.
    fn open(&mut self, options: &Options) -> Result<(), DestinationError> {
        let _ = options;
        Ok(())
    }

    /// Whether the underlying target is currently usable.
    fn is_opened(&self) -> bool {
        true
    }

    /// Delivers one message. The message is released by the caller after
    /// this returns.
    fn send(&mut self, message: &LogMessage, options: &Options) -> SendStatus;

    /// Delivers anything queued by earlier `send` calls.
    fn flush(&mut self, options: &Options) -> SendStatus {
        let _ = options;
        SendStatus::Success
    }

    /// Disconnects from the target.
    fn close(&mut self) -> Result<(), DestinationError> {
        Ok(())
    }

    /// Releases resources acquired in `init`.
    fn deinit(&mut self) {}
}

/// A type-erased destination.
pub type BoxedDestination = Box<dyn Destination>;

impl<D: Destination + ?Sized> Destination for Box<D> {
    fn declare_options(
        &mut self,
        context: &Arc<DestinationContext>,
        options: &mut Options,
    ) -> OptionResult<()> {
        (**self).declare_options(context, options)
    }

    fn name_by_uniq_options(&self, context: &DestinationContext) -> String {
        (**self).name_by_uniq_options(context)
    }

    fn init(&mut self, options: &Options) -> Result<(), DestinationError> {
        (**self).init(options)
    }

    fn open(&mut self, options: &Options) -> Result<(), DestinationError> {
        (**self).open(options)
    }

    fn is_opened(&self) -> bool {
        (**self).is_opened()
    }

    fn send(&mut self, message: &LogMessage, options: &Options) -> SendStatus {
        (**self).send(message, options)
    }

    fn flush(&mut self, options: &Options) -> SendStatus {
        (**self).flush(options)
    }

    fn close(&mut self) -> Result<(), DestinationError> {
        (**self).close()
    }

    fn deinit(&mut self) {
        (**self).deinit()
    }
}
