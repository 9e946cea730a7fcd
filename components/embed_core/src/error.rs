//! Error types for the embedding core.
//!
//! Script failures and host misuse travel through the same [`EmbedError`]
//! enum. A script failure is [`EmbedError::Exception`]: it owns a handle to
//! the thrown value plus a [`JsError`] snapshot read when it was captured.
//! Every other variant is a host-side failure that never reached script code.

use crate::value::Value;
use core_types::{CallbackId, IsolateId, JsError};
use std::fmt;
use std::path::PathBuf;
use thiserror::Error;

/// A JavaScript exception caught at the embedding boundary.
///
/// The thrown value stays alive while the `Exception` does, so hosts can
/// inspect it with the usual value accessors (`getProperty(e, "code")`).
#[derive(Debug)]
pub struct Exception {
    value: Value,
    info: JsError,
}

impl Exception {
    pub(crate) fn new(value: Value, info: JsError) -> Self {
        Self { value, info }
    }

    /// Handle to the thrown value.
    pub fn value(&self) -> &Value {
        &self.value
    }

    /// Take ownership of the thrown value.
    pub fn into_value(self) -> Value {
        self.value
    }

    /// Snapshot of the thrown value's name, message and stack.
    pub fn info(&self) -> &JsError {
        &self.info
    }

    /// Whether the script was stopped by a timeout or a termination request.
    pub fn is_interrupted(&self) -> bool {
        self.info.is_interrupted()
    }

    /// Release the thrown value.
    pub fn dispose(self) {
        drop(self);
    }
}

impl fmt::Display for Exception {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.info, f)
    }
}

/// Errors produced by the embedding core.
#[derive(Debug, Error)]
pub enum EmbedError {
    /// Script code threw, or a coercion ran user code that threw.
    #[error("uncaught {0}")]
    Exception(Exception),

    /// The isolate owning the handle has been disposed.
    #[error("{0} has been disposed")]
    IsolateDisposed(IsolateId),

    /// The execution context has been disposed.
    #[error("execution context has been disposed")]
    ContextDisposed,

    /// A handle was passed to an isolate other than the one that created it.
    #[error("handle belongs to {found}, not {expected}")]
    ForeignHandle {
        /// Isolate the operation was invoked on.
        expected: IsolateId,
        /// Isolate that created the handle.
        found: IsolateId,
    },

    /// The operation needs exclusive use of the engine but script code is
    /// running further up this thread's stack.
    #[error("{operation} is not allowed while {isolate} is running script code")]
    Reentrant {
        /// The busy isolate.
        isolate: IsolateId,
        /// What the host tried to do.
        operation: &'static str,
    },

    /// No host closure is registered under the id.
    #[error("no host function registered under {0}")]
    UnknownCallback(CallbackId),

    /// A host closure is already registered under the id.
    #[error("{0} is already registered")]
    DuplicateCallback(CallbackId),

    /// The destination buffer cannot hold the encoded string.
    #[error("buffer of {provided} bytes cannot hold {needed} bytes of UTF-8")]
    BufferTooSmall {
        /// Bytes required.
        needed: usize,
        /// Bytes supplied by the caller.
        provided: usize,
    },

    /// The runtime has already been shut down.
    #[error("runtime has been shut down")]
    PlatformShutdown,

    /// Shutdown was requested while isolates are still alive.
    #[error("cannot shut down runtime: {0} isolate(s) still alive")]
    IsolatesAlive(usize),

    /// The engine data directory is missing or unreadable.
    #[error("engine data directory {}: {reason}", path.display())]
    DataPath {
        /// The configured directory.
        path: PathBuf,
        /// Why it cannot be used.
        reason: String,
    },

    /// Configuration could not be parsed.
    #[error("invalid configuration: {0}")]
    Config(#[from] serde_json::Error),

    /// File I/O failed.
    #[error(transparent)]
    Io(#[from] std::io::Error),

    /// The engine itself failed (allocation, encoding, ...).
    #[error("engine error: {0}")]
    Engine(String),
}

impl EmbedError {
    /// Whether this is a script exception rather than a host-side failure.
    pub fn is_exception(&self) -> bool {
        matches!(self, EmbedError::Exception(_))
    }

    /// Borrow the captured exception, if any.
    pub fn exception(&self) -> Option<&Exception> {
        match self {
            EmbedError::Exception(exception) => Some(exception),
            _ => None,
        }
    }

    /// Take the captured exception, if any.
    pub fn into_exception(self) -> Option<Exception> {
        match self {
            EmbedError::Exception(exception) => Some(exception),
            _ => None,
        }
    }

    pub(crate) fn engine(error: rquickjs::Error) -> Self {
        EmbedError::Engine(error.to_string())
    }
}

/// Result type for embedding operations.
pub type EmbedResult<T> = Result<T, EmbedError>;
