//! Unit tests for ValueKind

use core_types::ValueKind;

#[cfg(test)]
mod value_kind_tests {
    use super::*;

    #[test]
    fn test_type_of_matches_javascript() {
        assert_eq!(ValueKind::Undefined.type_of(), "undefined");
        assert_eq!(ValueKind::Null.type_of(), "object");
        assert_eq!(ValueKind::Boolean.type_of(), "boolean");
        assert_eq!(ValueKind::Number.type_of(), "number");
        assert_eq!(ValueKind::BigInt.type_of(), "bigint");
        assert_eq!(ValueKind::String.type_of(), "string");
        assert_eq!(ValueKind::Symbol.type_of(), "symbol");
        assert_eq!(ValueKind::Object.type_of(), "object");
        assert_eq!(ValueKind::Function.type_of(), "function");
    }

    #[test]
    fn test_primitive_split() {
        assert!(ValueKind::Null.is_primitive());
        assert!(ValueKind::Symbol.is_primitive());
        assert!(!ValueKind::Object.is_primitive());
        assert!(!ValueKind::Function.is_primitive());
    }
}
