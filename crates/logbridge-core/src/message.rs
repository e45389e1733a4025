//! Borrowed native log messages.

use std::fmt;
use std::sync::Arc;

use crate::handle::MessageHandle;
use crate::native::NativeEngine;

/// A native log message handed to a destination.
///
/// The native engine transfers one message reference to the managed side for
/// the duration of a `send` call. `LogMessage` owns that reference and gives
/// it back exactly once: either explicitly through [`release`](Self::release),
/// which consumes the value, or implicitly when it is dropped (early return,
/// `?`, panic unwinding). Since the type is neither `Copy` nor `Clone`, a
/// second release cannot be expressed.
pub struct LogMessage {
    handle: MessageHandle,
    engine: Arc<dyn NativeEngine>,
}

impl LogMessage {
    /// Takes ownership of one native reference to `handle`.
    pub fn new(engine: Arc<dyn NativeEngine>, handle: MessageHandle) -> Self {
        Self { handle, engine }
    }

    /// Returns the opaque handle, e.g. for template formatting.
    pub fn handle(&self) -> MessageHandle {
        self.handle
    }

    /// Looks up a name-value pair on the message.
    pub fn value(&self, name: &str) -> Option<String> {
        self.engine.message_value(self.handle, name)
    }

    /// Gives the reference back to the native engine.
    pub fn release(self) {
        drop(self);
    }
}

impl Drop for LogMessage {
    fn drop(&mut self) {
        self.engine.unref_message(self.handle);
    }
}

impl fmt::Debug for LogMessage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LogMessage")
            .field("handle", &self.handle)
            .finish()
    }
}
