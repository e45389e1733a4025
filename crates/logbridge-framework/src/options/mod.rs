//! Typed, validated destination options.
//!
//! An option turns one raw string from the [`OptionSet`](crate::OptionSet)
//! into a typed [`OptionValue`]. Options are composed from a base option and
//! any number of decorators, each adding one policy:
//!
//! ```rust,ignore
//! let port = RequiredOptionDecorator::new(PortOptionDecorator::new(
//!     StringOption::with_default(ctx.clone(), "port", "514"),
//! ));
//! ```
//!
//! # Decorator contract
//!
//! A decorator owns the option it wraps. Its `init`:
//!
//! 1. delegates to the wrapped option's `init` first,
//! 2. applies its own check only if the delegate succeeded,
//! 3. fails with its own [`OptionError`](crate::OptionError) variant,
//! 4. commits its own state only when its check passes.
//!
//! Everything else (`name`, `context`, `deinit`, `template`) is forwarded to
//! the wrapped option unchanged. A missing value (no key, no default) passes
//! through every decorator except [`RequiredOptionDecorator`].
//!
//! | Decorator | Policy |
//! |-----------|--------|
//! | [`RequiredOptionDecorator`] | a value must exist |
//! | [`IntegerOptionDecorator`] | coerces to `i64` |
//! | [`BooleanOptionDecorator`] | coerces yes/no, true/false, on/off, 1/0 |
//! | [`ListOptionDecorator`] | splits on commas |
//! | [`RangeOptionDecorator`] | integer within an inclusive range |
//! | [`PortOptionDecorator`] | integer within 1–65535 |
//! | [`EnumOptionDecorator`] | one of an allowed set, case-insensitive |
//! | [`ExclusiveOptionDecorator`] | conflicts with another option |

mod check;
mod coerce;
mod collection;
mod required;
mod string;
mod template;

use std::fmt;
use std::sync::Arc;

use logbridge_core::LogTemplate;

use crate::context::DestinationContext;
use crate::error::OptionResult;

pub use check::{EnumOptionDecorator, ExclusiveOptionDecorator, PortOptionDecorator, RangeOptionDecorator};
pub use coerce::{BooleanOptionDecorator, IntegerOptionDecorator, ListOptionDecorator};
pub use collection::Options;
pub use required::RequiredOptionDecorator;
pub use string::StringOption;
pub use template::TemplateOption;

/// A parsed option value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OptionValue {
    String(String),
    Integer(i64),
    Boolean(bool),
    List(Vec<String>),
}

impl OptionValue {
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_integer(&self) -> Option<i64> {
        match self {
            Self::Integer(n) => Some(*n),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Self::Boolean(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_list(&self) -> Option<&[String]> {
        match self {
            Self::List(items) => Some(items),
            _ => None,
        }
    }

    /// Reads the value as an integer, parsing strings.
    pub(crate) fn to_integer(&self) -> Option<i64> {
        match self {
            Self::Integer(n) => Some(*n),
            Self::String(s) => s.trim().parse().ok(),
            _ => None,
        }
    }
}

impl fmt::Display for OptionValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::String(s) => f.write_str(s),
            Self::Integer(n) => write!(f, "{n}"),
            Self::Boolean(b) => write!(f, "{b}"),
            Self::List(items) => f.write_str(&items.join(",")),
        }
    }
}

/// One named destination option.
///
/// Implemented by base options ([`StringOption`], [`TemplateOption`]) and by
/// every decorator.
pub trait DestinationOption: Send {
    /// Option name, as used in the [`OptionSet`](crate::OptionSet).
    fn name(&self) -> &str;

    /// The destination context this option belongs to.
    fn context(&self) -> &Arc<DestinationContext>;

    /// Parses and validates the raw value. Called once.
    fn init(&mut self) -> OptionResult<()>;

    /// The parsed value; `None` when absent or not yet initialized.
    fn value(&self) -> Option<&OptionValue>;

    /// Releases resources held by the option.
    fn deinit(&mut self) {}

    /// The compiled template, for template-valued options.
    fn template(&self) -> Option<&LogTemplate> {
        None
    }
}

/// A type-erased option.
pub type BoxedOption = Box<dyn DestinationOption>;

impl<O: DestinationOption + ?Sized> DestinationOption for Box<O> {
    fn name(&self) -> &str {
        (**self).name()
    }

    fn context(&self) -> &Arc<DestinationContext> {
        (**self).context()
    }

    fn init(&mut self) -> OptionResult<()> {
        (**self).init()
    }

    fn value(&self) -> Option<&OptionValue> {
        (**self).value()
    }

    fn deinit(&mut self) {
        (**self).deinit()
    }

    fn template(&self) -> Option<&LogTemplate> {
        (**self).template()
    }
}

/// Implements the forwarded part of [`DestinationOption`] for a decorator
/// with an `inner` field.
macro_rules! forward_to_inner {
    () => {
        fn name(&self) -> &str {
            self.inner.name()
        }

        fn context(&self) -> &std::sync::Arc<$crate::context::DestinationContext> {
            self.inner.context()
        }

        fn deinit(&mut self) {
            self.inner.deinit()
        }

        fn template(&self) -> Option<&logbridge_core::LogTemplate> {
            self.inner.template()
        }
    };
}
pub(crate) use forward_to_inner;

#[cfg(test)]
pub(crate) mod testing {
    use std::sync::Arc;

    use logbridge_core::{DestinationHandle, InProcessEngine, Level, MemorySink, NativeContext};

    use crate::context::{DestinationContext, OptionSet};

    /// A destination context over the in-process engine with a capturing
    /// diagnostics sink.
    pub(crate) fn context(options: OptionSet) -> (Arc<DestinationContext>, Arc<MemorySink>) {
        context_on(&InProcessEngine::new(), options)
    }

    /// Same as [`context`], over a caller-owned engine.
    pub(crate) fn context_on(
        engine: &Arc<InProcessEngine>,
        options: OptionSet,
    ) -> (Arc<DestinationContext>, Arc<MemorySink>) {
        let config = engine.new_config();
        let sink = MemorySink::new(Level::Debug);
        let native =
            NativeContext::new(engine.clone(), config).with_diagnostics(sink.diagnostics());
        let handle = DestinationHandle::from_raw(1).unwrap();
        (DestinationContext::new("test", handle, options, native), sink)
    }
}
