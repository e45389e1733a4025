//! Option composition as seen by a destination author.

use std::sync::Arc;

use logbridge::core::{DestinationHandle, InProcessEngine, Level, MemorySink, NativeContext};
use logbridge::framework::{
    BooleanOptionDecorator, DestinationContext, DestinationOption, EnumOptionDecorator,
    IntegerOptionDecorator, OptionError, OptionSet, OptionValue, Options, PortOptionDecorator,
    RangeOptionDecorator, RequiredOptionDecorator, StringOption,
};

fn context(options: OptionSet) -> (Arc<DestinationContext>, Arc<MemorySink>) {
    let engine = InProcessEngine::new();
    let sink = MemorySink::new(Level::Debug);
    let native =
        NativeContext::new(engine.clone(), engine.new_config()).with_diagnostics(sink.diagnostics());
    let context = DestinationContext::new(
        "options",
        DestinationHandle::from_raw(1).unwrap(),
        options,
        native,
    );
    (context, sink)
}

#[test]
fn required_option_present() {
    let (ctx, _) = context(OptionSet::from([("required", "test")]));
    let mut option = RequiredOptionDecorator::new(StringOption::new(ctx, "required"));

    assert!(option.init().is_ok());
    assert_eq!(option.value(), Some(&OptionValue::String("test".into())));
}

#[test]
fn required_option_satisfied_by_default() {
    let (ctx, _) = context(OptionSet::new());
    let mut option =
        RequiredOptionDecorator::new(StringOption::with_default(ctx, "required", "default"));

    assert!(option.init().is_ok());
    assert_eq!(option.value(), Some(&OptionValue::String("default".into())));
}

#[test]
fn required_option_absent() {
    let (ctx, _) = context(OptionSet::new());
    let mut option = RequiredOptionDecorator::new(StringOption::new(ctx, "required"));

    let err = option.init().unwrap_err();
    assert_eq!(err, OptionError::required("required"));
    assert_eq!(err.to_string(), "option required is a required option");
}

#[test]
fn typical_network_options() {
    let (ctx, _) = context(OptionSet::from([
        ("host", "collector.example"),
        ("port", "6514"),
        ("transport", "TLS"),
        ("keepalive", "on"),
        ("retries", "3"),
    ]));

    let mut options = Options::new();
    options
        .put(RequiredOptionDecorator::new(StringOption::new(ctx.clone(), "host")))
        .unwrap();
    options
        .put(PortOptionDecorator::new(StringOption::with_default(
            ctx.clone(),
            "port",
            "514",
        )))
        .unwrap();
    options
        .put(EnumOptionDecorator::new(
            StringOption::with_default(ctx.clone(), "transport", "udp"),
            ["udp", "tcp", "tls"],
        ))
        .unwrap();
    options
        .put(BooleanOptionDecorator::new(StringOption::new(ctx.clone(), "keepalive")))
        .unwrap();
    options
        .put(RangeOptionDecorator::new(
            IntegerOptionDecorator::new(StringOption::new(ctx, "retries")),
            0..=5,
        ))
        .unwrap();

    options.init().unwrap();

    assert_eq!(options.string("host"), Some("collector.example"));
    assert_eq!(options.integer("port"), Some(6514));
    assert_eq!(options.string("transport"), Some("tls"));
    assert_eq!(options.boolean("keepalive"), Some(true));
    assert_eq!(options.integer("retries"), Some(3));
}

#[test]
fn decorator_order_does_not_change_outcome() {
    let (ctx, _) = context(OptionSet::from([("retries", "9")]));

    let mut range_inside = RequiredOptionDecorator::new(RangeOptionDecorator::new(
        StringOption::new(ctx.clone(), "retries"),
        0..=5,
    ));
    let mut required_inside = RangeOptionDecorator::new(
        RequiredOptionDecorator::new(StringOption::new(ctx, "retries")),
        0..=5,
    );

    let first = range_inside.init();
    let second = required_inside.init();
    assert!(first.is_err());
    assert_eq!(first, second);
}
