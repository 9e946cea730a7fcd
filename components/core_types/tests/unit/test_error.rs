//! Unit tests for JsError and ErrorKind

use core_types::{ErrorKind, JsError, SourcePosition};

#[cfg(test)]
mod error_kind_tests {
    use super::*;

    #[test]
    fn test_error_kind_from_builtin_names() {
        assert_eq!(ErrorKind::from_name("SyntaxError"), ErrorKind::SyntaxError);
        assert_eq!(ErrorKind::from_name("RangeError"), ErrorKind::RangeError);
        assert_eq!(ErrorKind::from_name("URIError"), ErrorKind::URIError);
        assert_eq!(ErrorKind::from_name("InternalError"), ErrorKind::InternalError);
    }

    #[test]
    fn test_error_kind_custom_name() {
        let kind = ErrorKind::from_name("HttpError");
        assert_eq!(kind, ErrorKind::Custom("HttpError".to_string()));
        assert_eq!(kind.name(), "HttpError");
        assert_eq!(kind.to_string(), "HttpError");
    }
}

#[cfg(test)]
mod js_error_tests {
    use super::*;

    #[test]
    fn test_js_error_from_engine_stack() {
        let stack = "    at fail (lib.js:2:11)\n    at <eval> (main.js:6:1)\n";
        let error = JsError::new(ErrorKind::TypeError, "fail is broken").with_stack_text(stack);

        assert_eq!(error.stack.len(), 2);
        assert_eq!(error.stack[0].function_name.as_deref(), Some("fail"));
        assert_eq!(error.stack[1].source_url.as_deref(), Some("main.js"));
        assert_eq!(
            error.source_position,
            Some(SourcePosition { line: 2, column: 11 })
        );
    }

    #[test]
    fn test_js_error_without_locatable_frames() {
        let error = JsError::new(ErrorKind::Error, "x").with_stack_text("    at call (native)\n");
        assert_eq!(error.stack.len(), 1);
        assert_eq!(error.source_position, None);
    }

    #[test]
    fn test_js_error_is_std_error() {
        let error: Box<dyn std::error::Error> =
            Box::new(JsError::new(ErrorKind::RangeError, "bad length"));
        assert_eq!(error.to_string(), "RangeError: bad length");
    }
}
