//! Soak tests: repeated create/dispose cycles must not grow without bound

use embed_core::{IsolateConfig, PlatformConfig, Runtime};

const CYCLES: usize = 200;

/// Isolates, contexts and values created and disposed in a loop
#[test]
fn test_soak_isolate_cycles() {
    let runtime = Runtime::new(PlatformConfig::new()).expect("runtime");

    for cycle in 0..CYCLES {
        let isolate = runtime
            .create_isolate_with(&IsolateConfig::new().with_memory_limit(32 * 1024 * 1024))
            .expect("isolate");
        let mut template = isolate.create_template().expect("template");
        let context = isolate.create_context(&template).expect("context");
        context
            .register_function(&mut template, "f", |info| {
                info.return_value().set_string("result string");
            })
            .expect("register");

        let value = context.evaluate("f()").expect("evaluate");
        assert_eq!(value.utf8_length().unwrap(), 13, "cycle {cycle}");
        value.dispose();

        assert_eq!(isolate.stats().live_values, 0, "cycle {cycle}");
        context.dispose();
        template.dispose();
        isolate.dispose().expect("dispose");
    }

    assert_eq!(runtime.live_isolates(), 0);
    runtime.shutdown().expect("shutdown");
}

/// Values created and disposed inside one long-lived isolate
#[test]
fn test_soak_value_handles() {
    let runtime = Runtime::new(PlatformConfig::new()).expect("runtime");
    let isolate = runtime.create_isolate().expect("isolate");
    let mut template = isolate.create_template().expect("template");
    let context = isolate.create_context(&template).expect("context");
    context
        .register_function(&mut template, "echo", |info| match info.take_arg(0) {
            Some(arg) => info.return_value().set_value(arg),
            None => info.return_value().set_undefined(),
        })
        .expect("register");

    let baseline = isolate.stats();
    for round in 0..5_000 {
        let value = context
            .evaluate(&format!("echo({{ round: {round}, text: 'x'.repeat(64) }})"))
            .expect("evaluate");
        let round_trip = value.get("round").expect("property");
        assert_eq!(round_trip.to_int().unwrap(), round);
    }
    isolate.collect_garbage().expect("gc");

    let after = isolate.stats();
    assert_eq!(after.live_values, baseline.live_values);
    assert_eq!(after.live_contexts, baseline.live_contexts);
    assert_eq!(after.callbacks, baseline.callbacks);
}

/// Rebuilding repeatedly keeps one context and one global object
#[test]
fn test_soak_rebuilds() {
    let runtime = Runtime::new(PlatformConfig::new()).expect("runtime");
    let isolate = runtime.create_isolate().expect("isolate");
    let mut template = isolate.create_template().expect("template");
    let context = isolate.create_context(&template).expect("context");
    context.evaluate("var total = 0;").expect("evaluate");

    for n in 0..100 {
        let name = format!("fn{n}");
        context
            .register_function(&mut template, &name, move |info| {
                info.return_value().set_number(f64::from(n));
            })
            .expect("register");
        context
            .evaluate(&format!("total += {name}();"))
            .expect("evaluate");
    }

    let total = context.evaluate("total").expect("evaluate");
    assert_eq!(total.to_int().unwrap(), 4950);
    let stats = isolate.stats();
    assert_eq!(stats.live_contexts, 1);
    assert_eq!(stats.rebuilds, 100);
    assert_eq!(stats.callbacks, 100);
}
