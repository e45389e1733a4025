use logbridge_core::LogTemplate;
use tracing::{debug, trace};

use super::{BoxedOption, DestinationOption, OptionValue};
use crate::error::{OptionError, OptionResult};

/// The options a destination declares, in declaration order.
///
/// `init` runs each option in turn and stops at the first failure. `deinit`
/// releases every option's resources and may be called any number of times.
#[derive(Default)]
pub struct Options {
    entries: Vec<BoxedOption>,
}

impl Options {
    pub fn new() -> Self {
        Self::default()
    }

    /// Declares an option. Names must be unique.
    pub fn put<O>(&mut self, option: O) -> OptionResult<()>
    where
        O: DestinationOption + 'static,
    {
        if self.get(option.name()).is_some() {
            return Err(OptionError::Duplicate {
                name: option.name().to_string(),
            });
        }
        trace!(option = %option.name(), "Option declared");
        self.entries.push(Box::new(option));
        Ok(())
    }

    pub fn get(&self, name: &str) -> Option<&dyn DestinationOption> {
        self.entries
            .iter()
            .find(|option| option.name() == name)
            .map(|option| &**option)
    }

    /// Returns the parsed value of option `name`.
    pub fn value(&self, name: &str) -> Option<&OptionValue> {
        self.get(name).and_then(|option| option.value())
    }

    pub fn string(&self, name: &str) -> Option<&str> {
        self.value(name).and_then(OptionValue::as_str)
    }

    pub fn integer(&self, name: &str) -> Option<i64> {
        self.value(name).and_then(OptionValue::to_integer)
    }

    pub fn boolean(&self, name: &str) -> Option<bool> {
        self.value(name).and_then(OptionValue::as_bool)
    }

    pub fn list(&self, name: &str) -> Option<&[String]> {
        self.value(name).and_then(OptionValue::as_list)
    }

    /// Returns the compiled template of a template-valued option.
    pub fn template(&self, name: &str) -> Option<&LogTemplate> {
        self.get(name).and_then(|option| option.template())
    }

    /// Option names in declaration order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|option| option.name())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Initializes every option, stopping at the first failure.
    pub fn init(&mut self) -> OptionResult<()> {
        for option in &mut self.entries {
            option.init()?;
            debug!(option = %option.name(), value = ?option.value(), "Option initialized");
        }
        Ok(())
    }

    /// Releases resources held by every option.
    pub fn deinit(&mut self) {
        for option in &mut self.entries {
            option.deinit();
        }
    }
}

impl std::fmt::Debug for Options {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_map()
            .entries(self.entries.iter().map(|o| (o.name(), o.value())))
            .finish()
    }
}
