use super::{DestinationOption, OptionValue, forward_to_inner};
use crate::error::{OptionError, OptionResult};

/// Requires the wrapped option to produce a value.
///
/// A default on the wrapped option always satisfies the requirement: the
/// check only looks at whether a value exists after the delegate ran.
pub struct RequiredOptionDecorator<O> {
    inner: O,
}

impl<O: DestinationOption> RequiredOptionDecorator<O> {
    pub fn new(inner: O) -> Self {
        Self { inner }
    }
}

impl<O: DestinationOption> DestinationOption for RequiredOptionDecorator<O> {
    forward_to_inner!();

    fn init(&mut self) -> OptionResult<()> {
        self.inner.init()?;
        if self.inner.value().is_none() {
            return Err(OptionError::required(self.inner.name()));
        }
        Ok(())
    }

    fn value(&self) -> Option<&OptionValue> {
        self.inner.value()
    }
}
