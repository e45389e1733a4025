use std::sync::Arc;

use tracing::trace;

use super::{DestinationOption, OptionValue};
use crate::context::DestinationContext;
use crate::error::OptionResult;

/// The base option: reads the raw string, falling back to a default.
pub struct StringOption {
    context: Arc<DestinationContext>,
    name: String,
    default: Option<String>,
    value: Option<OptionValue>,
}

impl StringOption {
    /// An option without a default; absent keys yield no value.
    pub fn new(context: Arc<DestinationContext>, name: impl Into<String>) -> Self {
        Self {
            context,
            name: name.into(),
            default: None,
            value: None,
        }
    }

    /// An option that uses `default` when the key is absent.
    pub fn with_default(
        context: Arc<DestinationContext>,
        name: impl Into<String>,
        default: impl Into<String>,
    ) -> Self {
        Self {
            default: Some(default.into()),
            ..Self::new(context, name)
        }
    }

    /// Returns the configured default.
    pub fn default_value(&self) -> Option<&str> {
        self.default.as_deref()
    }
}

impl DestinationOption for StringOption {
    fn name(&self) -> &str {
        &self.name
    }

    fn context(&self) -> &Arc<DestinationContext> {
        &self.context
    }

    fn init(&mut self) -> OptionResult<()> {
        let raw = self
            .context
            .get_option(&self.name)
            .map(str::to_string)
            .or_else(|| self.default.clone());
        trace!(option = %self.name, value = ?raw, "String option initialized");
        self.value = raw.map(OptionValue::String);
        Ok(())
    }

    fn value(&self) -> Option<&OptionValue> {
        self.value.as_ref()
    }
}
