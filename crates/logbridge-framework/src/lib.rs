//! # logbridge framework
//!
//! The destination plugin contract built on top of `logbridge-core`.
//!
//! This layer provides:
//! - Typed options composed from decorators (required-ness, coercion, range
//!   and membership checks, mutual exclusion, compiled templates)
//! - The [`Destination`] trait plugin authors implement
//! - [`ManagedDestination`], which drives a plugin through
//!   init → open → send / flush → close → deinit and reports failures on the
//!   diagnostics channel
//! - [`DestinationDescriptor`] for registering destination classes with a host

pub mod context;
pub mod descriptor;
pub mod destination;
pub mod error;
pub mod options;

pub use context::{DestinationContext, OptionSet};
pub use descriptor::{DestinationDescriptor, LOGBRIDGE_DESTINATION_API_VERSION};
pub use destination::{
    BoxedDestination, Destination, DestinationState, ManagedDestination, Operation, SendStatus,
};
pub use error::{DestinationError, LifecycleError, LifecycleResult, OptionError, OptionResult};
pub use options::{
    BooleanOptionDecorator, BoxedOption, DestinationOption, EnumOptionDecorator,
    ExclusiveOptionDecorator, IntegerOptionDecorator, ListOptionDecorator, OptionValue, Options,
    PortOptionDecorator, RangeOptionDecorator, RequiredOptionDecorator, StringOption,
    TemplateOption,
};
