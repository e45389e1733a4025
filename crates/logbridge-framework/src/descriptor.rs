//! Destination descriptor: the static, `Copy` handle to a destination class.

use std::sync::Arc;

use crate::context::DestinationContext;
use crate::destination::{BoxedDestination, ManagedDestination};
use crate::error::LifecycleResult;

// ─── API versioning ───────────────────────────────────────────────────────────

/// Current destination API version (1.0).
pub const LOGBRIDGE_DESTINATION_API_VERSION: u32 = 0x0001_0000;

// ─── DestinationDescriptor ────────────────────────────────────────────────────

/// Identifies a destination class and creates instances of it.
///
/// Descriptors are plain data and can live in a `static`:
///
/// ```rust,ignore
/// pub static LINE_WRITER: DestinationDescriptor =
///     DestinationDescriptor::new("line_writer", || Box::new(LineWriter::default()));
/// ```
#[derive(Debug, Clone, Copy)]
pub struct DestinationDescriptor {
    /// API version this descriptor was compiled against.
    pub api_version: u32,

    /// Class name, as referenced by host configuration.
    pub class_name: &'static str,

    /// One-line human-readable description.
    pub description: &'static str,

    /// Creates a fresh, unconfigured plugin instance.
    pub create: fn() -> BoxedDestination,
}

impl DestinationDescriptor {
    /// A descriptor for the current API version.
    pub const fn new(class_name: &'static str, create: fn() -> BoxedDestination) -> Self {
        Self {
            api_version: LOGBRIDGE_DESTINATION_API_VERSION,
            class_name,
            description: "",
            create,
        }
    }

    pub const fn with_description(mut self, description: &'static str) -> Self {
        self.description = description;
        self
    }

    /// Returns `true` if this descriptor's API version is compatible with the
    /// running framework.
    ///
    /// The major part must match exactly; the descriptor's minor part must be
    /// ≤ the host's minor part.
    pub fn is_compatible(&self) -> bool {
        let host_major = LOGBRIDGE_DESTINATION_API_VERSION >> 16;
        let host_minor = LOGBRIDGE_DESTINATION_API_VERSION & 0xFFFF;
        let desc_major = self.api_version >> 16;
        let desc_minor = self.api_version & 0xFFFF;
        desc_major == host_major && desc_minor <= host_minor
    }

    /// Creates an unmanaged plugin instance.
    #[inline]
    pub fn instantiate(&self) -> BoxedDestination {
        (self.create)()
    }

    /// Creates a plugin instance and wraps it for lifecycle management.
    pub fn manage(
        &self,
        context: Arc<DestinationContext>,
    ) -> LifecycleResult<ManagedDestination<BoxedDestination>> {
        ManagedDestination::new(self.instantiate(), context)
    }
}
