//! Validating decorators.
//!
//! These check the wrapped value without changing its type, so they compose
//! with the coercing decorators in either order. [`EnumOptionDecorator`] is
//! the exception: it normalizes the spelling of an accepted value.

use std::ops::RangeInclusive;

use super::{DestinationOption, OptionValue, forward_to_inner};
use crate::error::{OptionError, OptionResult};

fn integer_of<O: DestinationOption>(inner: &O, raw: &OptionValue) -> OptionResult<i64> {
    raw.to_integer().ok_or_else(|| OptionError::NotInteger {
        name: inner.name().to_string(),
        value: raw.to_string(),
    })
}

// ─── Range ────────────────────────────────────────────────────────────────────

/// Accepts integers within an inclusive range.
pub struct RangeOptionDecorator<O> {
    inner: O,
    range: RangeInclusive<i64>,
}

impl<O: DestinationOption> RangeOptionDecorator<O> {
    pub fn new(inner: O, range: RangeInclusive<i64>) -> Self {
        Self { inner, range }
    }

    pub fn range(&self) -> &RangeInclusive<i64> {
        &self.range
    }
}

impl<O: DestinationOption> DestinationOption for RangeOptionDecorator<O> {
    forward_to_inner!();

    fn init(&mut self) -> OptionResult<()> {
        self.inner.init()?;
        let Some(raw) = self.inner.value() else {
            return Ok(());
        };
        let value = integer_of(&self.inner, raw)?;
        if !self.range.contains(&value) {
            return Err(OptionError::OutOfRange {
                name: self.inner.name().to_string(),
                value,
                min: *self.range.start(),
                max: *self.range.end(),
            });
        }
        Ok(())
    }

    fn value(&self) -> Option<&OptionValue> {
        self.inner.value()
    }
}

// ─── Port ─────────────────────────────────────────────────────────────────────

/// Accepts a TCP/UDP port number, 1 through 65535.
pub struct PortOptionDecorator<O> {
    inner: O,
}

impl<O: DestinationOption> PortOptionDecorator<O> {
    pub fn new(inner: O) -> Self {
        Self { inner }
    }
}

impl<O: DestinationOption> DestinationOption for PortOptionDecorator<O> {
    forward_to_inner!();

    fn init(&mut self) -> OptionResult<()> {
        self.inner.init()?;
        let Some(raw) = self.inner.value() else {
            return Ok(());
        };
        let value = integer_of(&self.inner, raw)?;
        if !(1..=i64::from(u16::MAX)).contains(&value) {
            return Err(OptionError::InvalidPort {
                name: self.inner.name().to_string(),
                value,
            });
        }
        Ok(())
    }

    fn value(&self) -> Option<&OptionValue> {
        self.inner.value()
    }
}

// ─── Enum ─────────────────────────────────────────────────────────────────────

/// Accepts one of a fixed set of values, ignoring case.
///
/// The committed value uses the allowed set's spelling, so `TCP` configured
/// against `["tcp", "udp"]` reads back as `tcp`.
pub struct EnumOptionDecorator<O> {
    inner: O,
    allowed: Vec<String>,
    normalized: Option<OptionValue>,
}

impl<O: DestinationOption> EnumOptionDecorator<O> {
    pub fn new<I, S>(inner: O, allowed: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            inner,
            allowed: allowed.into_iter().map(Into::into).collect(),
            normalized: None,
        }
    }

    pub fn allowed(&self) -> &[String] {
        &self.allowed
    }
}

impl<O: DestinationOption> DestinationOption for EnumOptionDecorator<O> {
    forward_to_inner!();

    fn init(&mut self) -> OptionResult<()> {
        self.inner.init()?;
        let Some(raw) = self.inner.value() else {
            return Ok(());
        };
        let text = raw.to_string();
        match self
            .allowed
            .iter()
            .find(|candidate| candidate.eq_ignore_ascii_case(text.trim()))
        {
            Some(canonical) => {
                self.normalized = Some(OptionValue::String(canonical.clone()));
                Ok(())
            }
            None => Err(OptionError::NotAllowed {
                name: self.inner.name().to_string(),
                value: text,
                allowed: self.allowed.join(", "),
            }),
        }
    }

    fn value(&self) -> Option<&OptionValue> {
        self.normalized.as_ref().or_else(|| self.inner.value())
    }
}

// ─── Exclusive ────────────────────────────────────────────────────────────────

/// Rejects configurations that set both this option and `other`.
///
/// Only explicitly configured keys conflict; a default on either side does
/// not.
pub struct ExclusiveOptionDecorator<O> {
    inner: O,
    other: String,
}

impl<O: DestinationOption> ExclusiveOptionDecorator<O> {
    pub fn new(inner: O, other: impl Into<String>) -> Self {
        Self {
            inner,
            other: other.into(),
        }
    }

    pub fn other(&self) -> &str {
        &self.other
    }
}

impl<O: DestinationOption> DestinationOption for ExclusiveOptionDecorator<O> {
    forward_to_inner!();

    fn init(&mut self) -> OptionResult<()> {
        self.inner.init()?;
        let context = self.inner.context();
        let name = self.inner.name();
        if context.get_option(name).is_some() && context.get_option(&self.other).is_some() {
            return Err(OptionError::MutuallyExclusive {
                name: name.to_string(),
                other: self.other.clone(),
            });
        }
        Ok(())
    }

    fn value(&self) -> Option<&OptionValue> {
        self.inner.value()
    }
}
