//! Tests for property lookup

use crate::common::Fixture;
use embed_core::{EmbedError, ErrorKind};

fn error_kind(error: EmbedError) -> ErrorKind {
    match error {
        EmbedError::Exception(exception) => exception.info().kind.clone(),
        other => panic!("expected an exception, got {other}"),
    }
}

#[test]
fn test_own_property() {
    let fx = Fixture::new();
    let object = fx.eval("({ answer: 42, name: 'deep thought' })");
    let answer = fx.isolate.get_property(&object, "answer").unwrap();
    assert_eq!(answer.to_int().unwrap(), 42);
    let name = object.get("name").unwrap();
    assert_eq!(name.to_rust_string().unwrap(), "deep thought");
}

#[test]
fn test_inherited_property() {
    let fx = Fixture::new();
    let object = fx.eval(
        "function Base() {}
         Base.prototype.kind = 'base';
         new Base()",
    );
    let kind = fx.isolate.get_property(&object, "kind").unwrap();
    assert_eq!(kind.to_rust_string().unwrap(), "base");

    let to_string = fx.isolate.get_property(&object, "toString").unwrap();
    assert!(to_string.is_function().unwrap());
}

#[test]
fn test_missing_property_is_reference_error() {
    let fx = Fixture::new();
    let object = fx.eval("({ present: 1 })");
    let error = fx.isolate.get_property(&object, "absent").unwrap_err();
    let exception = error.exception().expect("exception");
    assert_eq!(exception.info().kind, ErrorKind::ReferenceError);
    assert!(exception.info().message.contains("absent"));
}

#[test]
fn test_explicit_undefined_is_found() {
    let fx = Fixture::new();
    let object = fx.eval("({ nothing: undefined })");
    let value = fx.isolate.get_property(&object, "nothing").unwrap();
    assert!(value.is_undefined().unwrap());
}

#[test]
fn test_null_and_undefined_targets_throw_type_error() {
    let fx = Fixture::new();
    for source in ["null", "undefined"] {
        let target = fx.eval(source);
        let error = fx.isolate.get_property(&target, "x").unwrap_err();
        assert_eq!(error_kind(error), ErrorKind::TypeError, "{source}");
    }
}

#[test]
fn test_primitive_targets_are_boxed() {
    let fx = Fixture::new();

    let text = fx.eval("'hello'");
    let length = fx.isolate.get_property(&text, "length").unwrap();
    assert_eq!(length.to_int().unwrap(), 5);

    let number = fx.eval("3.14159");
    let to_fixed = fx.isolate.get_property(&number, "toFixed").unwrap();
    assert!(to_fixed.is_function().unwrap());

    let flag = fx.eval("true");
    let missing = fx.isolate.get_property(&flag, "length").unwrap_err();
    assert_eq!(error_kind(missing), ErrorKind::ReferenceError);
}

#[test]
fn test_getter_runs() {
    let fx = Fixture::new();
    let object = fx.eval("({ get computed() { return 6 * 7; } })");
    assert_eq!(object.get("computed").unwrap().to_int().unwrap(), 42);
}

#[test]
fn test_throwing_getter_propagates() {
    let fx = Fixture::new();
    let object = fx.eval("({ get broken() { throw new RangeError('getter failed'); } })");
    let error = object.get("broken").unwrap_err();
    let exception = error.exception().expect("exception");
    assert_eq!(exception.info().kind, ErrorKind::RangeError);
    assert_eq!(exception.info().message, "getter failed");
}

#[test]
fn test_array_index_and_length() {
    let fx = Fixture::new();
    let array = fx.eval("[10, 20, 30]");
    assert_eq!(array.get("1").unwrap().to_int().unwrap(), 20);
    assert_eq!(array.get("length").unwrap().to_int().unwrap(), 3);
}

#[test]
fn test_global_object_properties() {
    let fx = Fixture::new();
    fx.eval("var configured = 'yes';");
    let global = fx.context.global().unwrap();
    assert!(global.is_object().unwrap());
    assert_eq!(global.get("configured").unwrap().to_rust_string().unwrap(), "yes");
    assert!(global.get("Math").unwrap().is_object().unwrap());
}

#[test]
fn test_chained_lookup() {
    let fx = Fixture::new();
    let config = fx.eval("({ server: { port: 8080, hosts: ['a', 'b'] } })");
    let server = config.get("server").unwrap();
    let port = server.get("port").unwrap();
    let hosts = server.get("hosts").unwrap();
    assert_eq!(port.to_int().unwrap(), 8080);
    assert_eq!(hosts.to_rust_string().unwrap(), "a,b");
}
