//! Tests for value handles: type predicates and conversions

use crate::common::Fixture;
use embed_core::{ErrorKind, ValueKind};

#[test]
fn test_value_kinds() {
    let fx = Fixture::new();
    let cases = [
        ("undefined", ValueKind::Undefined),
        ("null", ValueKind::Null),
        ("true", ValueKind::Boolean),
        ("42", ValueKind::Number),
        ("4.5", ValueKind::Number),
        ("'text'", ValueKind::String),
        ("({})", ValueKind::Object),
        ("[1, 2]", ValueKind::Object),
        ("(function () {})", ValueKind::Function),
        ("Symbol('s')", ValueKind::Symbol),
        ("10n", ValueKind::BigInt),
    ];
    for (source, expected) in cases {
        assert_eq!(fx.eval(source).kind().unwrap(), expected, "{source}");
    }
}

#[test]
fn test_isolate_predicates() {
    let fx = Fixture::new();
    let isolate = &fx.isolate;

    let null = fx.eval("null");
    assert!(isolate.is_null(&null).unwrap());
    assert!(!isolate.is_undefined(&null).unwrap());
    assert!(!isolate.is_object(&null).unwrap());

    let undefined = fx.eval("undefined");
    assert!(isolate.is_undefined(&undefined).unwrap());
    assert!(!isolate.is_null(&undefined).unwrap());

    let boolean = fx.eval("false");
    assert!(isolate.is_boolean(&boolean).unwrap());
    assert!(!isolate.is_number(&boolean).unwrap());

    let number = fx.eval("3.25");
    assert!(isolate.is_number(&number).unwrap());
    assert!(!isolate.is_string(&number).unwrap());

    let string = fx.eval("'3.25'");
    assert!(isolate.is_string(&string).unwrap());
    assert!(!isolate.is_number(&string).unwrap());

    let function = fx.eval("(() => 1)");
    assert!(isolate.is_object(&function).unwrap());
    assert!(function.is_function().unwrap());
}

#[test]
fn test_boxed_primitives_are_objects() {
    let fx = Fixture::new();
    let boxed = fx.eval("new String('boxed')");
    assert!(boxed.is_object().unwrap());
    assert!(!boxed.is_string().unwrap());
    assert_eq!(boxed.to_rust_string().unwrap(), "boxed");
}

#[test]
fn test_to_int_truncates_and_saturates() {
    let fx = Fixture::new();
    let cases = [
        ("3.9", 3),
        ("-3.9", -3),
        ("'42'", 42),
        ("'abc'", 0),
        ("true", 1),
        ("null", 0),
        ("undefined", 0),
        ("1e300", i64::MAX),
        ("-Infinity", i64::MIN),
        ("({ valueOf() { return 7; } })", 7),
    ];
    for (source, expected) in cases {
        assert_eq!(fx.int(source), expected, "{source}");
    }
}

#[test]
fn test_to_int_of_symbol_throws() {
    let fx = Fixture::new();
    let symbol = fx.eval("Symbol('nope')");
    let error = symbol.to_int().unwrap_err();
    let exception = error.exception().expect("script exception");
    assert_eq!(exception.info().kind, ErrorKind::TypeError);
}

#[test]
fn test_to_int_propagates_value_of_exception() {
    let fx = Fixture::new();
    let hostile = fx.eval("({ valueOf() { throw new Error('no number here'); } })");
    let error = fx.isolate.value_to_int(&hostile).unwrap_err();
    assert_eq!(error.exception().unwrap().info().message, "no number here");
}

#[test]
fn test_to_boolean() {
    let fx = Fixture::new();
    for (source, expected) in [("''", false), ("'a'", true), ("0", false), ("NaN", false), ("({})", true), ("[]", true)] {
        assert_eq!(fx.eval(source).to_boolean().unwrap(), expected, "{source}");
    }
}

#[test]
fn test_to_number() {
    let fx = Fixture::new();
    assert_eq!(fx.eval("'2.5'").to_number().unwrap(), 2.5);
    assert!(fx.eval("'x'").to_number().unwrap().is_nan());
}

#[test]
fn test_to_rust_string() {
    let fx = Fixture::new();
    assert_eq!(fx.string("42"), "42");
    assert_eq!(fx.string("[1, 2]"), "1,2");
    assert_eq!(fx.string("({})"), "[object Object]");
    assert_eq!(fx.string("null"), "null");
    assert_eq!(fx.string("({ toString() { return 'custom'; } })"), "custom");
}

#[test]
fn test_dispose_releases_handle() {
    let fx = Fixture::new();
    let before = fx.isolate.stats().live_values;
    let values: Vec<_> = (0..10).map(|n| fx.eval(&format!("({n})"))).collect();
    assert_eq!(fx.isolate.stats().live_values, before + 10);
    for value in values {
        value.dispose();
    }
    assert_eq!(fx.isolate.stats().live_values, before);
}

#[test]
fn test_with_scope_runs_several_queries() {
    let fx = Fixture::new();
    let value = fx.eval("({ a: 1, b: 'two' })");
    let (a, b) = fx
        .isolate
        .with_scope(|scope| {
            let a = scope.get_property(&value, "a")?;
            let b = scope.get_property(&value, "b")?;
            Ok((scope.to_int(&a)?, scope.to_rust_string(&b)?))
        })
        .unwrap();
    assert_eq!(a, 1);
    assert_eq!(b, "two");
}
