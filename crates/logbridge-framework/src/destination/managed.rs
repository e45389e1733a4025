use std::sync::Arc;

use logbridge_core::{Diagnostics, LogMessage};
use tracing::{debug, warn};

use super::{Destination, DestinationState, Operation, SendStatus};
use crate::context::DestinationContext;
use crate::error::{LifecycleError, LifecycleResult};
use crate::options::Options;

/// A destination plugin driven through the lifecycle state machine.
///
/// Every lifecycle call is checked against the current [`DestinationState`]
/// first; calls that do not fit are rejected and reported, never forwarded to
/// the plugin. Failures surface as `false` or a [`SendStatus`] plus a
/// diagnostic, and the most recent one is kept in
/// [`last_error`](Self::last_error).
///
/// A failed `init` makes the instance permanently unusable: every later call
/// except `deinit` is rejected.
///
/// Dropping a `ManagedDestination` that was not deinitialized runs `deinit`.
pub struct ManagedDestination<D: Destination> {
    plugin: D,
    context: Arc<DestinationContext>,
    options: Options,
    state: DestinationState,
    failed: bool,
    last_error: Option<LifecycleError>,
}

impl<D: Destination> ManagedDestination<D> {
    /// Wraps `plugin` and lets it declare its options.
    pub fn new(mut plugin: D, context: Arc<DestinationContext>) -> LifecycleResult<Self> {
        let mut options = Options::new();
        if let Err(source) = plugin.declare_options(&context, &mut options) {
            return Err(LifecycleError::Option {
                name: plugin.name_by_uniq_options(&context),
                source,
            });
        }
        debug!(
            class = %context.class_name(),
            handle = %context.handle(),
            options = options.len(),
            "Destination constructed"
        );
        Ok(Self {
            plugin,
            context,
            options,
            state: DestinationState::Uninitialized,
            failed: false,
            last_error: None,
        })
    }

    // =========================================================================
    // Queries
    // =========================================================================

    pub fn state(&self) -> DestinationState {
        self.state
    }

    /// Raw value of option `name`, available from construction.
    pub fn get_option(&self, name: &str) -> Option<&str> {
        self.context.get_option(name)
    }

    pub fn name_by_uniq_options(&self) -> String {
        self.plugin.name_by_uniq_options(&self.context)
    }

    /// `true` only when opened and the plugin reports its target usable.
    pub fn is_opened(&self) -> bool {
        self.state == DestinationState::Opened && self.plugin.is_opened()
    }

    /// `false` once `init` has failed.
    pub fn is_usable(&self) -> bool {
        !self.failed
    }

    pub fn options(&self) -> &Options {
        &self.options
    }

    pub fn context(&self) -> &Arc<DestinationContext> {
        &self.context
    }

    pub fn plugin(&self) -> &D {
        &self.plugin
    }

    pub fn plugin_mut(&mut self) -> &mut D {
        &mut self.plugin
    }

    /// The most recent reported failure.
    pub fn last_error(&self) -> Option<&LifecycleError> {
        self.last_error.as_ref()
    }

    fn diagnostics(&self) -> &Diagnostics {
        self.context.diagnostics()
    }

    // =========================================================================
    // Lifecycle
    // =========================================================================

    /// Validates every declared option, then initializes the plugin.
    pub fn init(&mut self) -> bool {
        if let Err(err) = self.admit(Operation::Init) {
            self.report(err);
            return false;
        }

        if let Err(source) = self.options.init() {
            self.fail_init(LifecycleError::Option {
                name: self.name_by_uniq_options(),
                source,
            });
            return false;
        }
        if let Err(source) = self.plugin.init(&self.options) {
            self.fail_init(LifecycleError::Hook {
                name: self.name_by_uniq_options(),
                operation: Operation::Init,
                source,
            });
            return false;
        }

        self.state = DestinationState::Initialized;
        debug!(destination = %self.name_by_uniq_options(), "Destination initialized");
        true
    }

    /// Opens the destination. A failed open leaves the state unchanged so the
    /// engine may retry.
    ///
    /// An opened destination whose plugin lost its target is closed and then
    /// opened again.
    pub fn open(&mut self) -> bool {
        if self.state == DestinationState::Opened && !self.failed && !self.plugin.is_opened() {
            debug!(
                destination = %self.name_by_uniq_options(),
                "Destination lost its target, reopening"
            );
            self.close();
        }
        if let Err(err) = self.admit(Operation::Open) {
            self.report(err);
            return false;
        }

        if let Err(source) = self.plugin.open(&self.options) {
            self.report(LifecycleError::Hook {
                name: self.name_by_uniq_options(),
                operation: Operation::Open,
                source,
            });
            return false;
        }

        self.state = DestinationState::Opened;
        debug!(destination = %self.name_by_uniq_options(), "Destination opened");
        true
    }

    /// Hands `message` to the plugin and releases it afterwards.
    ///
    /// The message is released exactly once however this returns; a panic in
    /// the plugin releases it during unwinding. A destination that is not
    /// open yields [`SendStatus::NotConnected`]; any other rejected call
    /// yields [`SendStatus::Error`].
    pub fn send(&mut self, message: LogMessage) -> SendStatus {
        if let Err(err) = self.admit(Operation::Send) {
            let status = match self.state {
                DestinationState::Initialized | DestinationState::Closed if !self.failed => {
                    SendStatus::NotConnected
                }
                _ => SendStatus::Error,
            };
            self.report(err);
            message.release();
            return status;
        }

        let status = self.plugin.send(&message, &self.options);
        message.release();
        if !status.is_delivered() {
            debug!(
                destination = %self.name_by_uniq_options(),
                status = %status,
                "Message not delivered"
            );
        }
        status
    }

    /// Flushes anything the plugin queued.
    pub fn flush(&mut self) -> SendStatus {
        if let Err(err) = self.admit(Operation::Flush) {
            self.report(err);
            return SendStatus::Error;
        }
        let status = self.plugin.flush(&self.options);
        if !status.is_delivered() {
            debug!(
                destination = %self.name_by_uniq_options(),
                status = %status,
                "Flush not delivered"
            );
        }
        status
    }

    /// Closes the destination. Never fails outward: plugin errors are reported
    /// and the destination is considered closed regardless.
    pub fn close(&mut self) {
        if self.state == DestinationState::Closed {
            return;
        }
        if let Err(err) = self.admit(Operation::Close) {
            self.report(err);
            return;
        }

        if let Err(source) = self.plugin.close() {
            self.report(LifecycleError::Hook {
                name: self.name_by_uniq_options(),
                operation: Operation::Close,
                source,
            });
        }
        self.state = DestinationState::Closed;
        debug!(destination = %self.name_by_uniq_options(), "Destination closed");
    }

    /// Releases the plugin's and the options' resources. Idempotent; an open
    /// destination is closed first.
    pub fn deinit(&mut self) {
        match self.state {
            DestinationState::Deinitialized => return,
            DestinationState::Opened => {
                self.diagnostics().warning(format!(
                    "destination {} deinitialized while opened, closing it first",
                    self.name_by_uniq_options()
                ));
                self.close();
            }
            _ => {}
        }

        if self.state != DestinationState::Uninitialized {
            self.plugin.deinit();
        }
        self.options.deinit();
        self.state = DestinationState::Deinitialized;
        debug!(destination = %self.name_by_uniq_options(), "Destination deinitialized");
    }

    // =========================================================================
    // Internals
    // =========================================================================

    /// Checks that `operation` is allowed now.
    fn admit(&self, operation: Operation) -> LifecycleResult<()> {
        if self.failed && operation != Operation::Deinit {
            return Err(LifecycleError::Unusable {
                name: self.name_by_uniq_options(),
            });
        }
        match self.state.transition(operation) {
            Some(_) => Ok(()),
            None => Err(LifecycleError::InvalidTransition {
                name: self.name_by_uniq_options(),
                operation,
                state: self.state,
            }),
        }
    }

    fn fail_init(&mut self, err: LifecycleError) {
        self.failed = true;
        self.options.deinit();
        self.report(err);
    }

    /// Emits `err` on the diagnostics channel and keeps it as the last error.
    ///
    /// Option errors are emitted with their own text so the diagnostic names
    /// the option directly.
    fn report(&mut self, err: LifecycleError) {
        let text = match &err {
            LifecycleError::Option { source, .. } => source.to_string(),
            other => other.to_string(),
        };
        warn!(
            destination = %self.name_by_uniq_options(),
            state = %self.state,
            error = %err,
            "Destination call failed"
        );
        self.diagnostics().error(text);
        self.last_error = Some(err);
    }
}

impl<D: Destination> Drop for ManagedDestination<D> {
    fn drop(&mut self) {
        self.deinit();
    }
}

impl<D: Destination> std::fmt::Debug for ManagedDestination<D> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ManagedDestination")
            .field("context", &self.context)
            .field("state", &self.state)
            .field("failed", &self.failed)
            .field("options", &self.options)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use std::panic::{AssertUnwindSafe, catch_unwind};
    use std::sync::Mutex;

    use logbridge_core::{InProcessEngine, Level, MemorySink};

    use super::*;
    use crate::context::OptionSet;
    use crate::error::{DestinationError, OptionResult};
    use crate::options::{RequiredOptionDecorator, StringOption, TemplateOption};
    use crate::options::testing::context_on;

    /// Records every hook call and fails on request.
    #[derive(Default)]
    struct Recorder {
        calls: Arc<Mutex<Vec<&'static str>>>,
        fail_open: bool,
        fail_close: bool,
        panic_on_send: bool,
        disconnect_on_send: bool,
        connected: bool,
        flush_status: Option<SendStatus>,
        status: Option<SendStatus>,
        sent: Vec<String>,
    }

    impl Recorder {
        fn record(&self, call: &'static str) {
            self.calls.lock().unwrap().push(call);
        }
    }

    impl Destination for Recorder {
        fn declare_options(
            &mut self,
            ctx: &Arc<DestinationContext>,
            options: &mut Options,
        ) -> OptionResult<()> {
            options.put(RequiredOptionDecorator::new(StringOption::new(
                ctx.clone(),
                "required",
            )))?;
            options.put(TemplateOption::with_default(ctx.clone(), "template", "$MSG"))
        }

        fn init(&mut self, _options: &Options) -> Result<(), DestinationError> {
            self.record("init");
            Ok(())
        }

        fn open(&mut self, _options: &Options) -> Result<(), DestinationError> {
            self.record("open");
            if self.fail_open {
                return Err("connection refused".into());
            }
            self.connected = true;
            Ok(())
        }

        fn is_opened(&self) -> bool {
            self.connected
        }

        fn send(&mut self, message: &LogMessage, options: &Options) -> SendStatus {
            self.record("send");
            if self.panic_on_send {
                panic!("plugin bug");
            }
            if self.disconnect_on_send {
                self.connected = false;
                return SendStatus::NotConnected;
            }
            if let Some(line) = options
                .template("template")
                .and_then(|t| t.format(message).ok())
            {
                self.sent.push(line);
            }
            self.status.unwrap_or(SendStatus::Success)
        }

        fn flush(&mut self, _options: &Options) -> SendStatus {
            self.record("flush");
            self.flush_status.unwrap_or(SendStatus::Success)
        }

        fn close(&mut self) -> Result<(), DestinationError> {
            self.record("close");
            self.connected = false;
            if self.fail_close {
                return Err("socket already gone".into());
            }
            Ok(())
        }

        fn deinit(&mut self) {
            self.record("deinit");
        }
    }

    struct Fixture {
        engine: Arc<InProcessEngine>,
        sink: Arc<MemorySink>,
        ctx: Arc<DestinationContext>,
    }

    fn fixture(options: OptionSet) -> Fixture {
        let engine = InProcessEngine::new();
        let (ctx, sink) = context_on(&engine, options);
        Fixture { engine, sink, ctx }
    }

    fn message(engine: &Arc<InProcessEngine>, text: &str) -> LogMessage {
        LogMessage::new(engine.clone(), engine.new_message([("MSG", text)]))
    }

    #[test]
    fn test_send_releases_message_once() {
        let fx = fixture(OptionSet::from([("required", "test")]));
        let mut dest = ManagedDestination::new(Recorder::default(), fx.ctx.clone()).unwrap();

        assert!(dest.init());
        assert!(dest.open());
        let msg = message(&fx.engine, "hello");
        let handle = msg.handle();

        assert_eq!(dest.send(msg), SendStatus::Success);
        assert_eq!(fx.engine.message_release_count(handle), 1);
        assert_eq!(dest.plugin().sent, ["hello"]);
    }

    #[test]
    fn test_send_releases_message_on_failure_status() {
        let fx = fixture(OptionSet::from([("required", "test")]));
        let recorder = Recorder {
            status: Some(SendStatus::Error),
            ..Recorder::default()
        };
        let mut dest = ManagedDestination::new(recorder, fx.ctx.clone()).unwrap();
        assert!(dest.init() && dest.open());

        let msg = message(&fx.engine, "hello");
        let handle = msg.handle();
        assert_eq!(dest.send(msg), SendStatus::Error);
        assert_eq!(fx.engine.message_release_count(handle), 1);
    }

    #[test]
    fn test_send_releases_message_on_panic() {
        let fx = fixture(OptionSet::from([("required", "test")]));
        let recorder = Recorder {
            panic_on_send: true,
            ..Recorder::default()
        };
        let mut dest = ManagedDestination::new(recorder, fx.ctx.clone()).unwrap();
        assert!(dest.init() && dest.open());

        let msg = message(&fx.engine, "hello");
        let handle = msg.handle();
        let result = catch_unwind(AssertUnwindSafe(|| dest.send(msg)));

        assert!(result.is_err());
        assert_eq!(fx.engine.message_release_count(handle), 1);
    }

    #[test]
    fn test_send_before_open_is_rejected() {
        let fx = fixture(OptionSet::from([("required", "test")]));
        let mut dest = ManagedDestination::new(Recorder::default(), fx.ctx.clone()).unwrap();
        assert!(dest.init());

        let msg = message(&fx.engine, "hello");
        let handle = msg.handle();
        assert_eq!(dest.send(msg), SendStatus::NotConnected);
        assert_eq!(fx.engine.message_release_count(handle), 1);
        assert!(fx.sink.contains("cannot send destination test#1 in state initialized"));
        assert!(!dest.plugin().calls.lock().unwrap().contains(&"send"));
    }

    #[test]
    fn test_missing_required_option_fails_init() {
        let fx = fixture(OptionSet::new());
        let mut dest = ManagedDestination::new(Recorder::default(), fx.ctx.clone()).unwrap();

        assert!(!dest.init());
        assert_eq!(dest.state(), DestinationState::Uninitialized);
        assert!(!dest.is_usable());
        assert_eq!(
            fx.sink.records(),
            [(Level::Error, "option required is a required option".to_string())]
        );
        assert!(matches!(
            dest.last_error(),
            Some(LifecycleError::Option { .. })
        ));
        // The plugin hook never ran.
        assert!(dest.plugin().calls.lock().unwrap().is_empty());
    }

    #[test]
    fn test_failed_init_is_permanent() {
        let fx = fixture(OptionSet::new());
        let mut dest = ManagedDestination::new(Recorder::default(), fx.ctx.clone()).unwrap();

        assert!(!dest.init());
        assert!(!dest.init());
        assert!(!dest.open());
        assert!(matches!(
            dest.last_error(),
            Some(LifecycleError::Unusable { .. })
        ));

        dest.deinit();
        assert_eq!(dest.state(), DestinationState::Deinitialized);
        assert_eq!(fx.engine.live_templates(), 0);
    }

    #[test]
    fn test_open_failure_can_be_retried() {
        let fx = fixture(OptionSet::from([("required", "test")]));
        let recorder = Recorder {
            fail_open: true,
            ..Recorder::default()
        };
        let mut dest = ManagedDestination::new(recorder, fx.ctx.clone()).unwrap();
        assert!(dest.init());

        assert!(!dest.open());
        assert_eq!(dest.state(), DestinationState::Initialized);
        assert!(!dest.is_opened());
        assert!(fx.sink.contains("connection refused"));

        dest.plugin_mut().fail_open = false;
        assert!(dest.open());
        assert!(dest.is_opened());
    }

    #[test]
    fn test_close_swallows_errors_and_reopens() {
        let fx = fixture(OptionSet::from([("required", "test")]));
        let recorder = Recorder {
            fail_close: true,
            ..Recorder::default()
        };
        let mut dest = ManagedDestination::new(recorder, fx.ctx.clone()).unwrap();
        assert!(dest.init() && dest.open());

        dest.close();
        assert_eq!(dest.state(), DestinationState::Closed);
        assert!(fx.sink.contains("socket already gone"));

        // Closing again is a no-op.
        dest.close();
        assert_eq!(
            dest.plugin()
                .calls
                .lock()
                .unwrap()
                .iter()
                .filter(|c| **c == "close")
                .count(),
            1
        );

        assert!(dest.open());
        assert_eq!(dest.state(), DestinationState::Opened);
    }

    #[test]
    fn test_open_recovers_lost_target() {
        let fx = fixture(OptionSet::from([("required", "test")]));
        let recorder = Recorder {
            disconnect_on_send: true,
            ..Recorder::default()
        };
        let mut dest = ManagedDestination::new(recorder, fx.ctx.clone()).unwrap();
        assert!(dest.init() && dest.open());

        assert_eq!(
            dest.send(message(&fx.engine, "lost")),
            SendStatus::NotConnected
        );
        assert_eq!(dest.state(), DestinationState::Opened);
        assert!(!dest.is_opened());

        assert!(dest.open());
        assert!(dest.is_opened());
        assert!(!fx.sink.contains("cannot open"));
        assert_eq!(
            *dest.plugin().calls.lock().unwrap(),
            ["init", "open", "send", "close", "open"]
        );
    }

    #[test]
    fn test_failed_flush_status_is_returned() {
        let fx = fixture(OptionSet::from([("required", "test")]));
        let recorder = Recorder {
            flush_status: Some(SendStatus::Error),
            ..Recorder::default()
        };
        let mut dest = ManagedDestination::new(recorder, fx.ctx.clone()).unwrap();
        assert!(dest.init() && dest.open());

        assert_eq!(dest.flush(), SendStatus::Error);
        assert_eq!(dest.state(), DestinationState::Opened);
        assert!(dest.plugin().calls.lock().unwrap().contains(&"flush"));
    }

    #[test]
    fn test_open_while_connected_is_rejected() {
        let fx = fixture(OptionSet::from([("required", "test")]));
        let mut dest = ManagedDestination::new(Recorder::default(), fx.ctx.clone()).unwrap();
        assert!(dest.init() && dest.open());

        assert!(!dest.open());
        assert!(fx.sink.contains("cannot open destination test#1 in state opened"));
        assert!(dest.is_opened());
    }

    #[test]
    fn test_deinit_from_opened_closes_first() {
        let fx = fixture(OptionSet::from([("required", "test")]));
        let calls = Arc::new(Mutex::new(Vec::new()));
        let recorder = Recorder {
            calls: calls.clone(),
            ..Recorder::default()
        };
        let mut dest = ManagedDestination::new(recorder, fx.ctx.clone()).unwrap();
        assert!(dest.init() && dest.open());
        assert_eq!(fx.engine.live_templates(), 1);

        dest.deinit();
        dest.deinit();

        assert_eq!(*calls.lock().unwrap(), ["init", "open", "close", "deinit"]);
        assert_eq!(fx.engine.live_templates(), 0);
        assert!(fx.sink.contains("deinitialized while opened"));
        assert_eq!(
            fx.sink
                .records()
                .iter()
                .filter(|(level, _)| *level == Level::Warning)
                .count(),
            1
        );
    }

    #[test]
    fn test_drop_deinitializes() {
        let fx = fixture(OptionSet::from([("required", "test")]));
        let calls = Arc::new(Mutex::new(Vec::new()));
        let recorder = Recorder {
            calls: calls.clone(),
            ..Recorder::default()
        };
        let mut dest = ManagedDestination::new(recorder, fx.ctx.clone()).unwrap();
        assert!(dest.init());
        drop(dest);

        assert_eq!(*calls.lock().unwrap(), ["init", "deinit"]);
        assert_eq!(fx.engine.live_templates(), 0);
    }

    #[test]
    fn test_get_option_before_init() {
        let fx = fixture(OptionSet::from([("required", "test")]));
        let dest = ManagedDestination::new(Recorder::default(), fx.ctx.clone()).unwrap();

        assert_eq!(dest.get_option("required"), Some("test"));
        assert_eq!(dest.name_by_uniq_options(), "test#1");
        assert_eq!(dest.state(), DestinationState::Uninitialized);
    }

    #[test]
    fn test_duplicate_declaration_fails_construction() {
        struct Twice;

        impl Destination for Twice {
            fn declare_options(
                &mut self,
                ctx: &Arc<DestinationContext>,
                options: &mut Options,
            ) -> OptionResult<()> {
                options.put(StringOption::new(ctx.clone(), "host"))?;
                options.put(StringOption::new(ctx.clone(), "host"))
            }

            fn send(&mut self, _: &LogMessage, _: &Options) -> SendStatus {
                SendStatus::Success
            }
        }

        let fx = fixture(OptionSet::new());
        let err = ManagedDestination::new(Twice, fx.ctx.clone()).unwrap_err();
        assert_eq!(err.to_string(), "destination test#1: option host is declared more than once");
    }
}
