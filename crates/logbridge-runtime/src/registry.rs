//! Registry of destination classes.
//!
//! Maps class names from the host configuration to the
//! [`DestinationDescriptor`]s that create them.

use std::collections::BTreeMap;

use logbridge_core::{DestinationHandle, NativeContext};
use logbridge_framework::{
    BoxedDestination, DestinationContext, DestinationDescriptor, ManagedDestination, OptionSet,
};
use tracing::{debug, warn};

use crate::config::DestinationConfig;
use crate::error::{RuntimeError, RuntimeResult};

/// Registry of destination classes, keyed by class name.
#[derive(Debug, Default)]
pub struct DestinationRegistry {
    descriptors: BTreeMap<&'static str, DestinationDescriptor>,
}

impl DestinationRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a destination class.
    ///
    /// Fails if the descriptor's API version is incompatible or the class name
    /// is taken.
    pub fn register(&mut self, descriptor: DestinationDescriptor) -> RuntimeResult<()> {
        if !descriptor.is_compatible() {
            warn!(
                class = descriptor.class_name,
                api_version = descriptor.api_version,
                "Rejecting incompatible destination class"
            );
            return Err(RuntimeError::IncompatibleApi {
                class: descriptor.class_name.to_string(),
                version: descriptor.api_version,
            });
        }
        if self.descriptors.contains_key(descriptor.class_name) {
            return Err(RuntimeError::DuplicateClass(
                descriptor.class_name.to_string(),
            ));
        }

        debug!(class = descriptor.class_name, "Registered destination class");
        self.descriptors.insert(descriptor.class_name, descriptor);
        Ok(())
    }

    pub fn get(&self, class: &str) -> Option<&DestinationDescriptor> {
        self.descriptors.get(class)
    }

    pub fn contains(&self, class: &str) -> bool {
        self.descriptors.contains_key(class)
    }

    /// Registered class names, sorted.
    pub fn classes(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.descriptors.keys().copied()
    }

    pub fn len(&self) -> usize {
        self.descriptors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.descriptors.is_empty()
    }

    /// Creates the configured destination, ready for `init`.
    pub fn build(
        &self,
        config: &DestinationConfig,
        handle: DestinationHandle,
        native: NativeContext,
    ) -> RuntimeResult<ManagedDestination<BoxedDestination>> {
        let descriptor = self
            .get(&config.class)
            .ok_or_else(|| RuntimeError::UnknownClass(config.class.clone()))?;

        let options: OptionSet = config
            .options
            .iter()
            .map(|(k, v)| (k.as_str(), v.as_str()))
            .collect();
        let context = DestinationContext::new(descriptor.class_name, handle, options, native);

        descriptor
            .manage(context)
            .map_err(|source| RuntimeError::Construct {
                id: config.id.clone(),
                source,
            })
    }
}
