//! Type-coercing decorators.
//!
//! Each one replaces the wrapped option's value with a typed one. The wrapped
//! value stays untouched; a failed coercion leaves the decorator without a
//! value of its own.

use super::{DestinationOption, OptionValue, forward_to_inner};
use crate::error::{OptionError, OptionResult};

/// Yields the coerced value if one was committed, the wrapped value otherwise.
fn coerced_or_inner<'a, O: DestinationOption>(
    coerced: &'a Option<OptionValue>,
    inner: &'a O,
) -> Option<&'a OptionValue> {
    coerced.as_ref().or_else(|| inner.value())
}

// ─── Integer ──────────────────────────────────────────────────────────────────

/// Coerces the value to a signed 64-bit integer.
pub struct IntegerOptionDecorator<O> {
    inner: O,
    coerced: Option<OptionValue>,
}

impl<O: DestinationOption> IntegerOptionDecorator<O> {
    pub fn new(inner: O) -> Self {
        Self {
            inner,
            coerced: None,
        }
    }
}

impl<O: DestinationOption> DestinationOption for IntegerOptionDecorator<O> {
    forward_to_inner!();

    fn init(&mut self) -> OptionResult<()> {
        self.inner.init()?;
        let Some(raw) = self.inner.value() else {
            return Ok(());
        };
        match raw.to_integer() {
            Some(n) => {
                self.coerced = Some(OptionValue::Integer(n));
                Ok(())
            }
            None => Err(OptionError::NotInteger {
                name: self.inner.name().to_string(),
                value: raw.to_string(),
            }),
        }
    }

    fn value(&self) -> Option<&OptionValue> {
        coerced_or_inner(&self.coerced, &self.inner)
    }
}

// ─── Boolean ──────────────────────────────────────────────────────────────────

fn parse_bool(raw: &str) -> Option<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "yes" | "true" | "on" | "1" => Some(true),
        "no" | "false" | "off" | "0" => Some(false),
        _ => None,
    }
}

/// Coerces yes/no, true/false, on/off and 1/0 (any case) to a boolean.
pub struct BooleanOptionDecorator<O> {
    inner: O,
    coerced: Option<OptionValue>,
}

impl<O: DestinationOption> BooleanOptionDecorator<O> {
    pub fn new(inner: O) -> Self {
        Self {
            inner,
            coerced: None,
        }
    }
}

impl<O: DestinationOption> DestinationOption for BooleanOptionDecorator<O> {
    forward_to_inner!();

    fn init(&mut self) -> OptionResult<()> {
        self.inner.init()?;
        let Some(raw) = self.inner.value() else {
            return Ok(());
        };
        let parsed = match raw {
            OptionValue::Boolean(b) => Some(*b),
            OptionValue::Integer(0) => Some(false),
            OptionValue::Integer(1) => Some(true),
            OptionValue::String(s) => parse_bool(s),
            _ => None,
        };
        match parsed {
            Some(b) => {
                self.coerced = Some(OptionValue::Boolean(b));
                Ok(())
            }
            None => Err(OptionError::NotBoolean {
                name: self.inner.name().to_string(),
                value: raw.to_string(),
            }),
        }
    }

    fn value(&self) -> Option<&OptionValue> {
        coerced_or_inner(&self.coerced, &self.inner)
    }
}

// ─── List ─────────────────────────────────────────────────────────────────────

/// Splits a comma-separated value into trimmed items.
///
/// An empty string yields an empty list; an empty item between commas is
/// rejected.
pub struct ListOptionDecorator<O> {
    inner: O,
    coerced: Option<OptionValue>,
}

impl<O: DestinationOption> ListOptionDecorator<O> {
    pub fn new(inner: O) -> Self {
        Self {
            inner,
            coerced: None,
        }
    }
}

impl<O: DestinationOption> DestinationOption for ListOptionDecorator<O> {
    forward_to_inner!();

    fn init(&mut self) -> OptionResult<()> {
        self.inner.init()?;
        let Some(raw) = self.inner.value() else {
            return Ok(());
        };
        if let OptionValue::List(_) = raw {
            return Ok(());
        }

        let text = raw.to_string();
        if text.trim().is_empty() {
            self.coerced = Some(OptionValue::List(Vec::new()));
            return Ok(());
        }

        let items: Vec<String> = text.split(',').map(|item| item.trim().to_string()).collect();
        if items.iter().any(String::is_empty) {
            return Err(OptionError::EmptyListItem {
                name: self.inner.name().to_string(),
            });
        }
        self.coerced = Some(OptionValue::List(items));
        Ok(())
    }

    fn value(&self) -> Option<&OptionValue> {
        coerced_or_inner(&self.coerced, &self.inner)
    }
}
