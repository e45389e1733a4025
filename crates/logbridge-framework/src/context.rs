//! Per-instance destination context shared by the destination and its options.

use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use logbridge_core::{
    BridgeResult, ConfigHandle, DestinationHandle, Diagnostics, LogTemplate, NativeContext,
};

// ─── OptionSet ────────────────────────────────────────────────────────────────

/// Raw destination configuration: option name → string value.
///
/// Supplied once when the destination is constructed and never modified
/// afterwards. Names are unique; inserting a name twice keeps the last value.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OptionSet {
    entries: BTreeMap<String, String>,
}

impl OptionSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the raw value for `name`.
    pub fn get(&self, name: &str) -> Option<&str> {
        self.entries.get(name).map(String::as_str)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.entries.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Iterates over `(name, value)` pairs in name order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }
}

impl<K, V> FromIterator<(K, V)> for OptionSet
where
    K: Into<String>,
    V: Into<String>,
{
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self {
            entries: iter.into_iter().map(|(k, v)| (k.into(), v.into())).collect(),
        }
    }
}

impl<K, V, const N: usize> From<[(K, V); N]> for OptionSet
where
    K: Into<String>,
    V: Into<String>,
{
    fn from(entries: [(K, V); N]) -> Self {
        entries.into_iter().collect()
    }
}

// ─── DestinationContext ───────────────────────────────────────────────────────

/// State shared between a [`ManagedDestination`] and the options it declares.
///
/// Available from construction onwards: raw option lookup through
/// [`get_option`](Self::get_option) never depends on `init` having run.
///
/// [`ManagedDestination`]: crate::destination::ManagedDestination
pub struct DestinationContext {
    class_name: String,
    handle: DestinationHandle,
    options: OptionSet,
    native: NativeContext,
}

impl DestinationContext {
    pub fn new(
        class_name: impl Into<String>,
        handle: DestinationHandle,
        options: OptionSet,
        native: NativeContext,
    ) -> Arc<Self> {
        Arc::new(Self {
            class_name: class_name.into(),
            handle,
            options,
            native,
        })
    }

    /// Returns the plugin class this instance was created from.
    pub fn class_name(&self) -> &str {
        &self.class_name
    }

    /// Returns the non-owning native destination handle.
    pub fn handle(&self) -> DestinationHandle {
        self.handle
    }

    /// Returns the raw value of option `name`.
    pub fn get_option(&self, name: &str) -> Option<&str> {
        self.options.get(name)
    }

    /// Returns the full raw option set.
    pub fn options(&self) -> &OptionSet {
        &self.options
    }

    pub fn native(&self) -> &NativeContext {
        &self.native
    }

    pub fn diagnostics(&self) -> &Diagnostics {
        self.native.diagnostics()
    }

    pub fn config_handle(&self) -> ConfigHandle {
        self.native.config_handle()
    }

    /// Creates an uncompiled template against this destination's
    /// configuration.
    pub fn new_template(&self) -> BridgeResult<LogTemplate> {
        LogTemplate::new(self.native.engine().clone(), self.native.config_handle())
    }
}

impl fmt::Debug for DestinationContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DestinationContext")
            .field("class_name", &self.class_name)
            .field("handle", &self.handle)
            .field("options", &self.options)
            .finish()
    }
}
