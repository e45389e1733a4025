//! # logbridge core
//!
//! The native boundary of the logbridge destination framework.
//!
//! A native log pipeline hands destinations opaque integral handles and
//! expects every reference it lends to come back exactly once. This crate
//! turns those handles into owned Rust values:
//!
//! - **Handles**: one `Copy` newtype per resource kind ([`ConfigHandle`],
//!   [`DestinationHandle`], [`TemplateHandle`], [`TemplateOptionsHandle`],
//!   [`MessageHandle`]).
//! - **Native services**: the [`NativeEngine`] trait, bundled with a config
//!   handle and diagnostics into a [`NativeContext`].
//! - **Owned wrappers**: [`LogTemplate`] and [`LogMessage`] hold one native
//!   reference each and release it exactly once, on `release()` or drop.
//! - **Diagnostics**: the fire-and-forget [`Diagnostics`] channel with six
//!   fixed [`Level`]s.
//! - **In-process engine**: [`InProcessEngine`], a complete in-memory
//!   [`NativeEngine`] used by the standalone runtime and by tests.
//!
//! ```text
//! native engine ──handles──► LogMessage / LogTemplate ──► destination code
//!        ▲                           │ (release once)
//!        └───────────────────────────┘
//! ```

pub mod diagnostics;
pub mod error;
pub mod handle;
pub mod inprocess;
pub mod message;
pub mod native;
pub mod template;

pub use diagnostics::{Diagnostics, DiagnosticsSink, Level, MemorySink, TracingSink};
pub use error::{BridgeError, BridgeResult};
pub use handle::{ConfigHandle, DestinationHandle, MessageHandle, TemplateHandle, TemplateOptionsHandle};
pub use inprocess::{InProcessEngine, TemplateOptions};
pub use message::LogMessage;
pub use native::{NativeContext, NativeEngine, TimeZone};
pub use template::{FormatOptions, LogTemplate};
