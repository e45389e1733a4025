//! Host runtime: configuration, diagnostics and the configured destinations.
//!
//! # Quick Start
//!
//! ```rust,ignore
//! use logbridge_runtime::BridgeRuntime;
//!
//! let mut runtime = BridgeRuntime::builder()
//!     .config_file("logbridge.toml")
//!     .register(line_writer::DESCRIPTOR)
//!     .build()?;
//!
//! runtime.start()?;
//! runtime.send("audit", message)?;
//! runtime.stop();
//! ```

use std::num::NonZeroU64;
use std::sync::Arc;

use logbridge_core::{
    ConfigHandle, DestinationHandle, Diagnostics, InProcessEngine, LogMessage, NativeContext,
    NativeEngine, TracingSink,
};
use logbridge_framework::{
    BoxedDestination, DestinationDescriptor, DestinationState, ManagedDestination, SendStatus,
};
use tracing::{debug, info, warn};

use crate::config::{ConfigLoader, LogbridgeConfig, validate_config, validate_diagnostics_level};
use crate::error::{RuntimeError, RuntimeResult};
use crate::logging;
use crate::registry::DestinationRegistry;

/// Installs a [`TracingSink`] at the configured level as the process-wide
/// diagnostics default and returns a handle to it.
pub fn install_diagnostics(config: &LogbridgeConfig) -> RuntimeResult<Diagnostics> {
    let level = validate_diagnostics_level(&config.diagnostics.level)?;
    let diagnostics = Diagnostics::new(Arc::new(TracingSink::new(level)));
    Diagnostics::set_global(diagnostics.clone());
    debug!(level = %level, "Diagnostics sink installed");
    Ok(diagnostics)
}

// =============================================================================
// BridgeRuntime
// =============================================================================

struct Running {
    id: String,
    destination: ManagedDestination<BoxedDestination>,
}

/// Counts of destinations by state.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RuntimeStats {
    pub configured: usize,
    pub opened: usize,
    pub initialized: usize,
    pub closed: usize,
    /// Failed `init`; kept until `stop`.
    pub failed: usize,
}

/// Owns the native engine handle, the destination registry and every
/// configured destination instance.
pub struct BridgeRuntime {
    config: LogbridgeConfig,
    registry: DestinationRegistry,
    engine: Arc<dyn NativeEngine>,
    config_handle: ConfigHandle,
    diagnostics: Diagnostics,
    destinations: Vec<Running>,
}

impl BridgeRuntime {
    /// Creates a runtime builder.
    pub fn builder() -> RuntimeBuilder {
        RuntimeBuilder::new()
    }

    /// Creates a runtime over the in-process engine.
    pub fn from_config(config: LogbridgeConfig) -> RuntimeResult<Self> {
        let engine = InProcessEngine::new();
        let config_handle = engine.new_config();
        Self::with_engine(config, engine, config_handle)
    }

    /// Creates a runtime over an existing native engine.
    ///
    /// Initializes logging and installs the tracing diagnostics sink.
    pub fn with_engine(
        config: LogbridgeConfig,
        engine: Arc<dyn NativeEngine>,
        config_handle: ConfigHandle,
    ) -> RuntimeResult<Self> {
        validate_config(&config)?;
        logging::init_from_config(&config.logging);
        let diagnostics = install_diagnostics(&config)?;

        info!(
            log_level = %config.logging.level,
            diagnostics_level = %config.diagnostics.level,
            destinations = config.destinations.len(),
            "Runtime initialized from configuration"
        );

        Ok(Self {
            config,
            registry: DestinationRegistry::new(),
            engine,
            config_handle,
            diagnostics,
            destinations: Vec::new(),
        })
    }

    /// Replaces the diagnostics handle given to destinations built afterwards.
    pub fn set_diagnostics(&mut self, diagnostics: Diagnostics) {
        self.diagnostics = diagnostics;
    }

    pub fn config(&self) -> &LogbridgeConfig {
        &self.config
    }

    pub fn registry(&self) -> &DestinationRegistry {
        &self.registry
    }

    /// Registers a destination class.
    pub fn register(&mut self, descriptor: DestinationDescriptor) -> RuntimeResult<()> {
        self.registry.register(descriptor)
    }

    /// Builds every enabled destination, then initializes and opens each.
    ///
    /// An unknown class or a failed construction aborts the start. A
    /// destination whose `init` or `open` fails is kept and reported by
    /// [`stats`](Self::stats); the engine may retry `open` later.
    pub fn start(&mut self) -> RuntimeResult<RuntimeStats> {
        if !self.destinations.is_empty() {
            warn!("Runtime already started");
            return Ok(self.stats());
        }

        let mut built = Vec::new();
        for (index, config) in self.config.destinations.iter().enumerate() {
            if !config.enabled {
                debug!(id = %config.id, "Destination disabled, skipping");
                continue;
            }
            let native = NativeContext::new(self.engine.clone(), self.config_handle)
                .with_diagnostics(self.diagnostics.clone());
            let destination = self
                .registry
                .build(config, destination_handle(index), native)?;
            built.push(Running {
                id: config.id.clone(),
                destination,
            });
        }

        for running in &mut built {
            let dest = &mut running.destination;
            if dest.init() && dest.open() {
                info!(id = %running.id, "Destination started");
            } else {
                warn!(id = %running.id, state = %dest.state(), "Destination failed to start");
            }
        }
        self.destinations = built;

        let stats = self.stats();
        info!(
            opened = stats.opened,
            failed = stats.failed,
            "Runtime started"
        );
        Ok(stats)
    }

    /// Sends one message to destination `id`.
    pub fn send(&mut self, id: &str, message: LogMessage) -> RuntimeResult<SendStatus> {
        Ok(self.destination_mut(id)?.send(message))
    }

    /// Flushes every opened destination.
    pub fn flush_all(&mut self) -> Vec<(String, SendStatus)> {
        self.destinations
            .iter_mut()
            .filter(|running| running.destination.state() == DestinationState::Opened)
            .map(|running| (running.id.clone(), running.destination.flush()))
            .collect()
    }

    /// Reopens usable destinations that are not open, including opened ones
    /// whose plugin lost its target.
    pub fn reopen(&mut self) -> usize {
        let mut reopened = 0;
        for running in &mut self.destinations {
            let dest = &mut running.destination;
            if !dest.is_usable() || dest.is_opened() {
                continue;
            }
            let reopenable = matches!(
                dest.state(),
                DestinationState::Initialized
                    | DestinationState::Closed
                    | DestinationState::Opened
            );
            if reopenable && dest.open() {
                debug!(id = %running.id, "Destination reopened");
                reopened += 1;
            }
        }
        reopened
    }

    pub fn destination(&self, id: &str) -> Option<&ManagedDestination<BoxedDestination>> {
        self.destinations
            .iter()
            .find(|running| running.id == id)
            .map(|running| &running.destination)
    }

    pub fn destination_mut(
        &mut self,
        id: &str,
    ) -> RuntimeResult<&mut ManagedDestination<BoxedDestination>> {
        self.destinations
            .iter_mut()
            .find(|running| running.id == id)
            .map(|running| &mut running.destination)
            .ok_or_else(|| RuntimeError::DestinationNotFound(id.to_string()))
    }

    /// IDs of the running destinations, in start order.
    pub fn ids(&self) -> impl Iterator<Item = &str> {
        self.destinations.iter().map(|running| running.id.as_str())
    }

    pub fn stats(&self) -> RuntimeStats {
        let mut stats = RuntimeStats {
            configured: self.destinations.len(),
            ..Default::default()
        };
        for running in &self.destinations {
            let dest = &running.destination;
            if !dest.is_usable() {
                stats.failed += 1;
                continue;
            }
            match dest.state() {
                DestinationState::Opened => stats.opened += 1,
                DestinationState::Initialized => stats.initialized += 1,
                DestinationState::Closed => stats.closed += 1,
                DestinationState::Uninitialized | DestinationState::Deinitialized => {}
            }
        }
        stats
    }

    /// Closes and deinitializes every destination, in reverse start order.
    pub fn stop(&mut self) {
        while let Some(mut running) = self.destinations.pop() {
            running.destination.close();
            running.destination.deinit();
            debug!(id = %running.id, "Destination stopped");
        }
        info!("Runtime stopped");
    }
}

impl Drop for BridgeRuntime {
    fn drop(&mut self) {
        if !self.destinations.is_empty() {
            self.stop();
        }
    }
}

/// Handles are assigned from the destination's position in the
/// configuration, starting at 1.
fn destination_handle(index: usize) -> DestinationHandle {
    let raw = NonZeroU64::MIN.saturating_add(index as u64);
    DestinationHandle::from_nonzero(raw)
}

// =============================================================================
// RuntimeBuilder
// =============================================================================

/// Builder for a [`BridgeRuntime`] with custom configuration.
pub struct RuntimeBuilder {
    config_loader: ConfigLoader,
    descriptors: Vec<DestinationDescriptor>,
}

impl RuntimeBuilder {
    pub fn new() -> Self {
        Self {
            config_loader: ConfigLoader::new().with_current_dir(),
            descriptors: Vec::new(),
        }
    }

    /// Sets a specific configuration file to load.
    pub fn config_file<P: AsRef<std::path::Path>>(mut self, path: P) -> Self {
        self.config_loader = self.config_loader.file(path);
        self
    }

    pub fn profile(mut self, profile: impl Into<String>) -> Self {
        self.config_loader = self.config_loader.profile(profile);
        self
    }

    pub fn search_path<P: AsRef<std::path::Path>>(mut self, path: P) -> Self {
        self.config_loader = self.config_loader.search_path(path);
        self
    }

    pub fn without_env(mut self) -> Self {
        self.config_loader = self.config_loader.without_env();
        self
    }

    /// Merges additional configuration programmatically.
    pub fn merge(mut self, config: LogbridgeConfig) -> Self {
        self.config_loader = self.config_loader.merge(config);
        self
    }

    /// Registers a destination class when the runtime is built.
    pub fn register(mut self, descriptor: DestinationDescriptor) -> Self {
        self.descriptors.push(descriptor);
        self
    }

    /// Loads the configuration and builds the runtime over the in-process
    /// engine.
    pub fn build(self) -> RuntimeResult<BridgeRuntime> {
        let config = self.config_loader.load()?;
        let mut runtime = BridgeRuntime::from_config(config)?;
        for descriptor in self.descriptors {
            runtime.register(descriptor)?;
        }
        Ok(runtime)
    }
}

impl Default for RuntimeBuilder {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;

    use logbridge_core::{Level, MemorySink};
    use logbridge_framework::{
        DestinationContext, Destination, OptionResult, Options, RequiredOptionDecorator,
        StringOption,
    };

    use super::*;
    use crate::config::DestinationConfig;

    struct Null;

    impl Destination for Null {
        fn send(&mut self, _: &LogMessage, _: &Options) -> SendStatus {
            SendStatus::Success
        }
    }

    /// Requires a `target` option.
    struct Strict;

    impl Destination for Strict {
        fn declare_options(
            &mut self,
            context: &Arc<DestinationContext>,
            options: &mut Options,
        ) -> OptionResult<()> {
            options.put(RequiredOptionDecorator::new(StringOption::new(
                context.clone(),
                "target",
            )))
        }

        fn send(&mut self, _: &LogMessage, _: &Options) -> SendStatus {
            SendStatus::Success
        }
    }

    /// Loses its target on the first send.
    #[derive(Default)]
    struct Flaky {
        connected: bool,
        sends: u32,
    }

    impl Destination for Flaky {
        fn open(&mut self, _: &Options) -> Result<(), logbridge_framework::DestinationError> {
            self.connected = true;
            Ok(())
        }

        fn is_opened(&self) -> bool {
            self.connected
        }

        fn send(&mut self, _: &LogMessage, _: &Options) -> SendStatus {
            self.sends += 1;
            if self.sends == 1 {
                self.connected = false;
                return SendStatus::NotConnected;
            }
            SendStatus::Success
        }
    }

    const NULL: DestinationDescriptor = DestinationDescriptor::new("null", || Box::new(Null));
    const FLAKY: DestinationDescriptor =
        DestinationDescriptor::new("flaky", || Box::new(Flaky::default()));
    const STRICT: DestinationDescriptor = DestinationDescriptor::new("strict", || Box::new(Strict));

    fn destination(id: &str, class: &str, options: &[(&str, &str)]) -> DestinationConfig {
        DestinationConfig {
            id: id.into(),
            class: class.into(),
            enabled: true,
            options: options
                .iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect::<BTreeMap<_, _>>(),
        }
    }

    fn fixture(
        destinations: Vec<DestinationConfig>,
    ) -> (BridgeRuntime, Arc<InProcessEngine>, Arc<MemorySink>) {
        let config = LogbridgeConfig {
            destinations,
            ..Default::default()
        };
        let engine = InProcessEngine::new();
        let config_handle = engine.new_config();
        let mut runtime = BridgeRuntime::with_engine(config, engine.clone(), config_handle).unwrap();

        let sink = MemorySink::new(Level::Debug);
        runtime.set_diagnostics(sink.diagnostics());
        runtime.register(NULL).unwrap();
        runtime.register(STRICT).unwrap();
        runtime.register(FLAKY).unwrap();
        (runtime, engine, sink)
    }

    fn message(engine: &Arc<InProcessEngine>) -> (LogMessage, logbridge_core::MessageHandle) {
        let handle = engine.new_message([("MSG", "hello")]);
        (LogMessage::new(engine.clone(), handle), handle)
    }

    #[test]
    fn test_start_send_stop() {
        let (mut runtime, engine, _) = fixture(vec![destination("out", "null", &[])]);

        let stats = runtime.start().unwrap();
        assert_eq!(stats.configured, 1);
        assert_eq!(stats.opened, 1);

        let (msg, handle) = message(&engine);
        assert_eq!(runtime.send("out", msg).unwrap(), SendStatus::Success);
        assert_eq!(engine.message_release_count(handle), 1);

        runtime.stop();
        assert_eq!(runtime.ids().count(), 0);
    }

    #[test]
    fn test_failed_init_is_reported() {
        let (mut runtime, engine, sink) = fixture(vec![
            destination("good", "strict", &[("target", "x")]),
            destination("bad", "strict", &[]),
        ]);

        let stats = runtime.start().unwrap();
        assert_eq!(stats.opened, 1);
        assert_eq!(stats.failed, 1);
        assert!(sink.contains("option target is a required option"));
        assert_eq!(
            runtime.destination("bad").unwrap().state(),
            DestinationState::Uninitialized
        );

        let (msg, handle) = message(&engine);
        assert_eq!(runtime.send("bad", msg).unwrap(), SendStatus::Error);
        assert_eq!(engine.message_release_count(handle), 1);
    }

    #[test]
    fn test_disabled_destination_skipped() {
        let mut disabled = destination("off", "null", &[]);
        disabled.enabled = false;
        let (mut runtime, _, _) = fixture(vec![destination("on", "null", &[]), disabled]);

        runtime.start().unwrap();
        assert_eq!(runtime.ids().collect::<Vec<_>>(), ["on"]);
        assert!(runtime.destination("off").is_none());
    }

    #[test]
    fn test_handles_follow_config_position() {
        let mut disabled = destination("off", "null", &[]);
        disabled.enabled = false;
        let (mut runtime, _, _) = fixture(vec![disabled, destination("on", "null", &[])]);

        runtime.start().unwrap();
        assert_eq!(
            runtime.destination("on").unwrap().name_by_uniq_options(),
            "null#2"
        );
    }

    #[test]
    fn test_unknown_class_aborts_start() {
        let (mut runtime, _, _) = fixture(vec![destination("out", "kafka", &[])]);

        assert!(matches!(
            runtime.start(),
            Err(RuntimeError::UnknownClass(class)) if class == "kafka"
        ));
        assert_eq!(runtime.stats(), RuntimeStats::default());
    }

    #[test]
    fn test_send_to_unknown_destination() {
        let (mut runtime, engine, _) = fixture(vec![]);
        runtime.start().unwrap();

        let (msg, handle) = message(&engine);
        assert!(matches!(
            runtime.send("missing", msg),
            Err(RuntimeError::DestinationNotFound(id)) if id == "missing"
        ));
        assert_eq!(engine.message_release_count(handle), 1);
    }

    #[test]
    fn test_flush_and_reopen() {
        let (mut runtime, _, _) = fixture(vec![destination("out", "null", &[])]);
        runtime.start().unwrap();

        assert_eq!(
            runtime.flush_all(),
            [("out".to_string(), SendStatus::Success)]
        );

        runtime.destination_mut("out").unwrap().close();
        assert!(runtime.flush_all().is_empty());
        assert_eq!(runtime.stats().closed, 1);

        assert_eq!(runtime.reopen(), 1);
        assert_eq!(runtime.stats().opened, 1);
    }

    #[test]
    fn test_reopen_after_lost_target() {
        let (mut runtime, engine, sink) = fixture(vec![destination("net", "flaky", &[])]);
        runtime.start().unwrap();

        let (msg, _) = message(&engine);
        assert_eq!(runtime.send("net", msg).unwrap(), SendStatus::NotConnected);
        assert!(!runtime.destination("net").unwrap().is_opened());

        assert_eq!(runtime.reopen(), 1);
        assert!(runtime.destination("net").unwrap().is_opened());
        assert!(!sink.contains("cannot open"));

        let (msg, _) = message(&engine);
        assert_eq!(runtime.send("net", msg).unwrap(), SendStatus::Success);
        assert_eq!(runtime.reopen(), 0);
    }

    #[test]
    fn test_invalid_config_rejected() {
        let config = LogbridgeConfig {
            destinations: vec![destination("a", "null", &[]), destination("a", "null", &[])],
            ..Default::default()
        };

        assert!(matches!(
            BridgeRuntime::from_config(config),
            Err(RuntimeError::Config(_))
        ));
    }
}
