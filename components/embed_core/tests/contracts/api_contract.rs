//! Shape of the public API

use embed_core::{
    CallbackId, EmbedError, ErrorKind, Exception, ExecutionContext, GlobalTemplate, Isolate,
    IsolateConfig, IsolateStats, PlatformConfig, Runtime, TerminationHandle, Value,
};

fn assert_send_sync<T: Send + Sync>() {}

mod handle_contract {
    use super::*;

    #[test]
    fn handles_are_send_and_sync() {
        assert_send_sync::<Runtime>();
        assert_send_sync::<Isolate>();
        assert_send_sync::<GlobalTemplate>();
        assert_send_sync::<ExecutionContext>();
        assert_send_sync::<Value>();
        assert_send_sync::<Exception>();
        assert_send_sync::<EmbedError>();
        assert_send_sync::<TerminationHandle>();
    }

    #[test]
    fn handles_report_their_isolate() {
        let runtime = Runtime::new(PlatformConfig::new()).unwrap();
        let isolate = runtime.create_isolate().unwrap();
        let template = isolate.create_template().unwrap();
        let context = isolate.create_context(&template).unwrap();
        let value = context.evaluate("1").unwrap();

        assert_eq!(template.isolate_id(), isolate.id());
        assert_eq!(context.isolate_id(), isolate.id());
        assert_eq!(value.isolate_id(), isolate.id());
        assert!(isolate.id().to_string().starts_with("isolate#"));
    }
}

mod error_contract {
    use super::*;

    #[test]
    fn exception_display_has_uncaught_prefix() {
        let runtime = Runtime::new(PlatformConfig::new()).unwrap();
        let isolate = runtime.create_isolate().unwrap();
        let template = isolate.create_template().unwrap();
        let context = isolate.create_context(&template).unwrap();

        let error = context.evaluate("throw new TypeError('wrong type')").unwrap_err();
        assert!(error.is_exception());
        assert_eq!(error.to_string(), "uncaught TypeError: wrong type");

        let exception = error.into_exception().unwrap();
        assert_eq!(exception.info().kind, ErrorKind::TypeError);
        assert_eq!(exception.into_value().get("message").unwrap().to_rust_string().unwrap(), "wrong type");
    }

    #[test]
    fn host_errors_are_not_exceptions() {
        let error = EmbedError::UnknownCallback(CallbackId(3));
        assert!(!error.is_exception());
        assert!(error.exception().is_none());
        assert_eq!(error.to_string(), "no host function registered under callback#3");
    }
}

mod config_contract {
    use super::*;

    #[test]
    fn isolate_config_json_round_trip() {
        let config = IsolateConfig::new()
            .with_memory_limit(1 << 24)
            .with_gc_threshold(1 << 20);
        let json = serde_json::to_string(&config).unwrap();
        assert_eq!(IsolateConfig::from_json_str(&json).unwrap(), config);
    }

    #[test]
    fn empty_json_is_default_config() {
        assert_eq!(IsolateConfig::from_json_str("{}").unwrap(), IsolateConfig::default());
    }

    #[test]
    fn stats_serialize_with_stable_keys() {
        let runtime = Runtime::new(PlatformConfig::new()).unwrap();
        let isolate = runtime.create_isolate().unwrap();
        let stats: IsolateStats = isolate.stats();
        let json = serde_json::to_value(stats).unwrap();
        for key in ["isolate", "live_values", "live_contexts", "callbacks", "rebuilds", "disposed"] {
            assert!(json.get(key).is_some(), "missing {key}");
        }
        assert_eq!(json["disposed"], serde_json::Value::Bool(false));
    }
}
