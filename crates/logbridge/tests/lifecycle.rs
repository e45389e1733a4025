//! End-to-end lifecycle of a destination over the in-process engine.

use std::sync::Arc;

use logbridge::core::{
    DestinationHandle, InProcessEngine, Level, LogMessage, MemorySink, NativeContext,
};
use logbridge::framework::{
    Destination, DestinationContext, DestinationState, ManagedDestination, OptionResult,
    OptionSet, Options, SendStatus, TemplateOption,
};

/// Renders every message with its `template` option and keeps the lines.
#[derive(Default)]
struct Collect {
    lines: Vec<String>,
}

impl Destination for Collect {
    fn declare_options(
        &mut self,
        context: &Arc<DestinationContext>,
        options: &mut Options,
    ) -> OptionResult<()> {
        options.put(TemplateOption::with_default(
            context.clone(),
            "template",
            "$HOST $MSG",
        ))
    }

    fn send(&mut self, message: &LogMessage, options: &Options) -> SendStatus {
        let Some(template) = options.template("template") else {
            return SendStatus::Error;
        };
        match template.format(message) {
            Ok(line) => {
                self.lines.push(line);
                SendStatus::Success
            }
            Err(_) => SendStatus::Error,
        }
    }
}

struct Fixture {
    engine: Arc<InProcessEngine>,
    sink: Arc<MemorySink>,
}

impl Fixture {
    fn new() -> Self {
        Self {
            engine: InProcessEngine::new(),
            sink: MemorySink::new(Level::Debug),
        }
    }

    fn manage(&self, options: OptionSet) -> ManagedDestination<Collect> {
        let native = NativeContext::new(self.engine.clone(), self.engine.new_config())
            .with_diagnostics(self.sink.diagnostics());
        let context = DestinationContext::new(
            "collect",
            DestinationHandle::from_raw(1).unwrap(),
            options,
            native,
        );
        ManagedDestination::new(Collect::default(), context).unwrap()
    }

    fn message(&self, msg: &str) -> LogMessage {
        let handle = self.engine.new_message([("HOST", "web1"), ("MSG", msg)]);
        LogMessage::new(self.engine.clone(), handle)
    }
}

#[test]
fn send_releases_message_once() {
    let fixture = Fixture::new();
    let mut dest = fixture.manage(OptionSet::new());

    assert!(dest.init());
    assert!(dest.open());

    let message = fixture.message("started");
    let handle = message.handle();
    assert_eq!(dest.send(message), SendStatus::Success);

    assert_eq!(fixture.engine.message_release_count(handle), 1);
    assert_eq!(dest.plugin().lines, ["web1 started"]);
}

#[test]
fn full_lifecycle_releases_everything() {
    let fixture = Fixture::new();
    let mut dest = fixture.manage(OptionSet::from([("template", "[$HOST] $MSG")]));

    assert!(dest.init());
    assert_eq!(fixture.engine.live_templates(), 1);
    assert!(dest.open());

    let handles: Vec<_> = ["a", "b", "c"]
        .into_iter()
        .map(|msg| {
            let message = fixture.message(msg);
            let handle = message.handle();
            assert_eq!(dest.send(message), SendStatus::Success);
            handle
        })
        .collect();

    assert_eq!(dest.flush(), SendStatus::Success);
    dest.close();
    assert_eq!(dest.state(), DestinationState::Closed);
    dest.deinit();
    assert_eq!(dest.state(), DestinationState::Deinitialized);

    assert_eq!(dest.plugin().lines, ["[web1] a", "[web1] b", "[web1] c"]);
    for handle in handles {
        assert_eq!(fixture.engine.message_release_count(handle), 1);
    }
    assert_eq!(fixture.engine.live_templates(), 0);
}

#[test]
fn send_before_open_is_rejected() {
    let fixture = Fixture::new();
    let mut dest = fixture.manage(OptionSet::new());
    assert!(dest.init());

    let message = fixture.message("early");
    let handle = message.handle();
    assert_eq!(dest.send(message), SendStatus::NotConnected);

    assert_eq!(fixture.engine.message_release_count(handle), 1);
    assert!(dest.plugin().lines.is_empty());
    assert!(fixture.sink.contains("cannot send destination collect#1"));
}

#[test]
fn invalid_template_fails_init() {
    let fixture = Fixture::new();
    let mut dest = fixture.manage(OptionSet::from([("template", "${HOST")]));

    assert!(!dest.init());
    assert!(!dest.is_usable());
    assert_eq!(fixture.engine.live_templates(), 0);
    assert!(
        fixture
            .sink
            .contains("option template: failed to compile template: unterminated")
    );

    assert!(!dest.open());
    assert_eq!(dest.state(), DestinationState::Uninitialized);
}
