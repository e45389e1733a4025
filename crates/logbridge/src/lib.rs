//! # Logbridge
//!
//! Write destinations for a native log pipeline in safe Rust.
//!
//! ## Overview
//!
//! The native engine owns messages, templates and configuration; a
//! destination receives messages one at a time and must hand every reference
//! back exactly once. Logbridge wraps that contract in owned Rust types and
//! drives each destination through a checked lifecycle.
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────────┐     ┌──────────────────────┐     ┌──────────────────────┐
//! │ Native engine│────▶│ ManagedDestination   │────▶│ Destination (plugin) │
//! │  (handles)   │◀────│ state + Options      │     │ init/open/send/...   │
//! └──────────────┘     └──────────────────────┘     └──────────────────────┘
//!        ▲                       │
//!        └──── Diagnostics ◀─────┘
//! ```
//!
//! - **Core**: handles, [`LogMessage`](core::LogMessage),
//!   [`LogTemplate`](core::LogTemplate), the diagnostics channel
//! - **Framework**: options and decorators, the [`Destination`] trait, the
//!   lifecycle state machine, descriptors
//! - **Runtime**: configuration, logging, the class registry and
//!   [`BridgeRuntime`]
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use logbridge::prelude::*;
//!
//! struct Stdout;
//!
//! impl Destination for Stdout {
//!     fn declare_options(
//!         &mut self,
//!         context: &Arc<DestinationContext>,
//!         options: &mut Options,
//!     ) -> OptionResult<()> {
//!         options.put(TemplateOption::with_default(context.clone(), "template", "$MSG"))
//!     }
//!
//!     fn send(&mut self, message: &LogMessage, options: &Options) -> SendStatus {
//!         match options.template("template").map(|t| t.format(message)) {
//!             Some(Ok(line)) => {
//!                 println!("{line}");
//!                 SendStatus::Success
//!             }
//!             _ => SendStatus::Error,
//!         }
//!     }
//! }
//!
//! pub const DESCRIPTOR: DestinationDescriptor =
//!     DestinationDescriptor::new("stdout", || Box::new(Stdout));
//! ```
//!
//! ## Features
//!
//! - `toml-config`: TOML configuration files (default)
//! - `yaml-config`: YAML configuration files
//! - `json-log`: JSON log output

pub use logbridge_core as core;
pub use logbridge_framework as framework;
pub use logbridge_runtime as runtime;

pub use logbridge_framework::Destination;
pub use logbridge_runtime::BridgeRuntime;

/// Prelude module for convenient imports.
///
/// ```rust,ignore
/// use logbridge::prelude::*;
/// ```
pub mod prelude {
    pub use std::sync::Arc;

    // Runtime - host entry point
    pub use logbridge_runtime::{BridgeRuntime, LogbridgeConfig};

    // Destination contract
    pub use logbridge_framework::{
        Destination, DestinationContext, DestinationDescriptor, DestinationError,
        DestinationState, ManagedDestination, SendStatus,
    };

    // Options and decorators
    pub use logbridge_framework::{
        BooleanOptionDecorator, DestinationOption, EnumOptionDecorator, ExclusiveOptionDecorator,
        IntegerOptionDecorator, ListOptionDecorator, OptionError, OptionResult, OptionValue,
        Options, PortOptionDecorator, RangeOptionDecorator, RequiredOptionDecorator, StringOption,
        TemplateOption,
    };

    // Native values
    pub use logbridge_core::{Diagnostics, FormatOptions, Level, LogMessage, LogTemplate};
}
