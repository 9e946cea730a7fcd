//! Tests for script evaluation and exception capture

use crate::common::Fixture;
use embed_core::ErrorKind;

#[test]
fn test_arithmetic_expressions() {
    let fx = Fixture::new();
    let cases = [
        ("40 + 2", 42),
        ("1 + 2 * 3", 7),
        ("(10 + 20) * 2 - 18", 42),
        ("7 / 2", 3),
        ("-7 / 2", -3),
        ("2 ** 10", 1024),
        ("17 % 5", 2),
    ];
    for (source, expected) in cases {
        let value = fx.eval(source);
        assert!(value.is_number().unwrap(), "{source} should be a number");
        assert_eq!(fx.isolate.value_to_int(&value).unwrap(), expected, "{source}");
    }
}

#[test]
fn test_malformed_scripts_raise_syntax_errors() {
    let fx = Fixture::new();
    for source in ["let = ;", "function (", "1 +", "}", "var 1x = 2;"] {
        let exception = fx.exception(source);
        assert_eq!(
            exception.info().kind,
            ErrorKind::SyntaxError,
            "{source} should be a syntax error"
        );
    }
}

#[test]
fn test_context_survives_failed_evaluation() {
    let fx = Fixture::new();
    fx.exception("throw new Error('first')");
    assert_eq!(fx.int("1 + 1"), 2);
}

#[test]
fn test_globals_persist_between_evaluations() {
    let fx = Fixture::new();
    assert!(fx.eval("var counter = 1;").is_undefined().unwrap());
    assert_eq!(fx.int("counter += 1; counter"), 2);
    assert_eq!(fx.int("counter * 10"), 20);
}

#[test]
fn test_type_error_is_classified() {
    let fx = Fixture::new();
    let exception = fx.exception("null.foo");
    assert_eq!(exception.info().kind, ErrorKind::TypeError);
    assert!(!exception.info().message.is_empty());
}

#[test]
fn test_reference_error_for_undeclared_name() {
    let fx = Fixture::new();
    let exception = fx.exception("undeclaredName + 1");
    assert_eq!(exception.info().kind, ErrorKind::ReferenceError);
    assert!(exception.info().message.contains("undeclaredName"));
}

#[test]
fn test_thrown_primitive_is_not_an_error() {
    let fx = Fixture::new();
    let exception = fx.exception("throw 42");
    assert_eq!(exception.info().kind, ErrorKind::NonError);
    assert_eq!(exception.info().message, "42");
    assert_eq!(exception.value().to_int().unwrap(), 42);
}

#[test]
fn test_custom_error_name() {
    let fx = Fixture::new();
    let exception = fx.exception(
        "class ValidationError extends Error {
             constructor(message) { super(message); this.name = 'ValidationError'; }
         }
         throw new ValidationError('bad input');",
    );
    assert_eq!(
        exception.info().kind,
        ErrorKind::Custom("ValidationError".to_string())
    );
    assert_eq!(exception.info().message, "bad input");
    assert_eq!(exception.to_string(), "ValidationError: bad input");
}

#[test]
fn test_exception_value_is_inspectable() {
    let fx = Fixture::new();
    let exception = fx.exception("throw Object.assign(new Error('boom'), { code: 7 })");
    let code = exception.value().get("code").unwrap();
    assert_eq!(code.to_int().unwrap(), 7);
    assert!(fx.isolate.is_object(exception.value()).unwrap());
}

#[test]
fn test_exception_carries_stack_frames() {
    let fx = Fixture::new();
    let exception = fx.exception("function inner() { throw new Error('deep'); }\ninner();");
    let info = exception.info();
    let top = info.stack.first().expect("stack frames");
    assert_eq!(top.function_name.as_deref(), Some("inner"));
    assert_eq!(info.source_position.as_ref().map(|p| p.line), Some(1));
}

#[test]
fn test_caught_exceptions_stay_inside_script() {
    let fx = Fixture::new();
    let value = fx.eval("try { null.x } catch (e) { e instanceof TypeError }");
    assert!(value.to_boolean().unwrap());
}

#[test]
fn test_resolved_promises_run_before_evaluate_returns() {
    let fx = Fixture::new();
    fx.eval("var settled = 'pending'; Promise.resolve('done').then(v => { settled = v; });");
    assert_eq!(fx.string("settled"), "done");
}

#[test]
fn test_exception_dispose_releases_value() {
    let fx = Fixture::new();
    let before = fx.isolate.stats().live_values;
    let exception = fx.exception("throw new RangeError('out of range')");
    assert_eq!(exception.info().kind, ErrorKind::RangeError);
    assert_eq!(fx.isolate.stats().live_values, before + 1);
    exception.dispose();
    assert_eq!(fx.isolate.stats().live_values, before);
}
