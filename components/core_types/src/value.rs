//! Classification of engine values as seen from the host.

use serde::{Deserialize, Serialize};
use std::fmt;

/// What kind of JavaScript value a handle refers to.
///
/// Functions are reported separately from other objects, matching the
/// `typeof` operator. Arrays, errors, promises and the global object are all
/// [`ValueKind::Object`].
///
/// # Examples
///
/// ```
/// use core_types::ValueKind;
///
/// assert_eq!(ValueKind::Null.type_of(), "object");
/// assert!(ValueKind::String.is_primitive());
/// assert!(ValueKind::Function.is_object());
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ValueKind {
    /// JavaScript undefined value
    Undefined,
    /// JavaScript null value
    Null,
    /// JavaScript boolean (true or false)
    Boolean,
    /// IEEE 754 number, including integers the engine stores unboxed
    Number,
    /// Arbitrary precision integer
    BigInt,
    /// JavaScript string value
    String,
    /// Symbol value
    Symbol,
    /// Any non-callable object
    Object,
    /// Callable object
    Function,
}

impl ValueKind {
    /// Returns the JavaScript `typeof` result for this kind.
    ///
    /// `null` reports `"object"`, as JavaScript does.
    pub fn type_of(&self) -> &'static str {
        match self {
            ValueKind::Undefined => "undefined",
            ValueKind::Null => "object",
            ValueKind::Boolean => "boolean",
            ValueKind::Number => "number",
            ValueKind::BigInt => "bigint",
            ValueKind::String => "string",
            ValueKind::Symbol => "symbol",
            ValueKind::Object => "object",
            ValueKind::Function => "function",
        }
    }

    /// Whether values of this kind are primitives.
    pub fn is_primitive(&self) -> bool {
        !self.is_object()
    }

    /// Whether values of this kind are objects (functions included).
    pub fn is_object(&self) -> bool {
        matches!(self, ValueKind::Object | ValueKind::Function)
    }

    /// Whether `ToObject` succeeds for values of this kind.
    pub fn is_object_coercible(&self) -> bool {
        !matches!(self, ValueKind::Undefined | ValueKind::Null)
    }
}

impl fmt::Display for ValueKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ValueKind::Null => "null",
            other => other.type_of(),
        };
        f.write_str(name)
    }
}
