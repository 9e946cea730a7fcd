//! Host-side view of JavaScript errors.
//!
//! The engine hands back thrown values as opaque handles. When the embedding
//! core captures an exception it also reads the value's `name`, `message` and
//! `stack` once, under the isolate lock, and stores the result here so hosts
//! can log or format the failure without re-entering the engine.

use crate::{SourcePosition, StackFrame};
use serde::{Deserialize, Serialize};
use std::fmt;

/// The kind of JavaScript error.
///
/// These correspond to JavaScript's built-in error constructors. Values that
/// are not error objects (`throw 42`) are reported as [`ErrorKind::NonError`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ErrorKind {
    /// Plain `Error`
    Error,
    /// Syntax error in JavaScript code
    SyntaxError,
    /// Type error (e.g., calling a non-function)
    TypeError,
    /// Reference to an undefined variable or missing property
    ReferenceError,
    /// Value out of allowed range
    RangeError,
    /// Error in eval() function
    EvalError,
    /// Error in URI handling functions
    URIError,
    /// Several errors wrapped together
    AggregateError,
    /// Internal engine error, including interrupted execution
    InternalError,
    /// Error object whose `name` is not a built-in constructor name
    Custom(String),
    /// The thrown value was not an error object
    NonError,
}

impl ErrorKind {
    /// Classify an error by its `name` property.
    ///
    /// # Examples
    ///
    /// ```
    /// use core_types::ErrorKind;
    ///
    /// assert_eq!(ErrorKind::from_name("TypeError"), ErrorKind::TypeError);
    /// assert_eq!(
    ///     ErrorKind::from_name("ValidationError"),
    ///     ErrorKind::Custom("ValidationError".to_string())
    /// );
    /// ```
    pub fn from_name(name: &str) -> Self {
        match name {
            "Error" => ErrorKind::Error,
            "SyntaxError" => ErrorKind::SyntaxError,
            "TypeError" => ErrorKind::TypeError,
            "ReferenceError" => ErrorKind::ReferenceError,
            "RangeError" => ErrorKind::RangeError,
            "EvalError" => ErrorKind::EvalError,
            "URIError" => ErrorKind::URIError,
            "AggregateError" => ErrorKind::AggregateError,
            "InternalError" => ErrorKind::InternalError,
            other => ErrorKind::Custom(other.to_string()),
        }
    }

    /// The constructor name JavaScript would report for this kind.
    pub fn name(&self) -> &str {
        match self {
            ErrorKind::Error => "Error",
            ErrorKind::SyntaxError => "SyntaxError",
            ErrorKind::TypeError => "TypeError",
            ErrorKind::ReferenceError => "ReferenceError",
            ErrorKind::RangeError => "RangeError",
            ErrorKind::EvalError => "EvalError",
            ErrorKind::URIError => "URIError",
            ErrorKind::AggregateError => "AggregateError",
            ErrorKind::InternalError => "InternalError",
            ErrorKind::Custom(name) => name,
            ErrorKind::NonError => "Uncaught",
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A snapshot of a thrown JavaScript value.
///
/// `message` is the error's `message` property, or the string conversion of
/// the thrown value when it is not an error object. `stack` holds the frames
/// that could be parsed out of the engine's stack text; unparseable lines are
/// skipped.
///
/// # Examples
///
/// ```
/// use core_types::{JsError, ErrorKind};
///
/// let error = JsError::new(ErrorKind::ReferenceError, "missing is not defined");
/// assert_eq!(error.message, "missing is not defined");
/// assert!(error.stack.is_empty());
/// assert!(error.source_position.is_none());
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JsError {
    /// The type of error
    pub kind: ErrorKind,
    /// Human-readable error message
    pub message: String,
    /// Stack trace (call stack at the time of the error)
    pub stack: Vec<StackFrame>,
    /// Position of the innermost frame that carried a location
    pub source_position: Option<SourcePosition>,
}

impl JsError {
    /// Create an error snapshot without stack information.
    pub fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        JsError {
            kind,
            message: message.into(),
            stack: Vec::new(),
            source_position: None,
        }
    }

    /// Attach frames parsed from an engine stack string.
    ///
    /// Each line of `text` is parsed with [`StackFrame::parse`]. The first
    /// frame with a line number becomes `source_position`.
    pub fn with_stack_text(mut self, text: &str) -> Self {
        self.stack = text.lines().filter_map(StackFrame::parse).collect();
        self.source_position = self
            .stack
            .iter()
            .find(|frame| frame.line > 0)
            .map(|frame| SourcePosition {
                line: frame.line,
                column: frame.column,
            });
        self
    }

    /// Whether the engine aborted execution because of a termination request
    /// or an expired deadline.
    pub fn is_interrupted(&self) -> bool {
        self.kind == ErrorKind::InternalError && self.message == "interrupted"
    }
}

impl fmt::Display for JsError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.message.is_empty() {
            write!(f, "{}", self.kind)
        } else {
            write!(f, "{}: {}", self.kind, self.message)
        }
    }
}

impl std::error::Error for JsError {}
