//! Host-side types shared by the embedding core and its hosts.
//!
//! Nothing in this crate touches engine memory. It describes what the host
//! sees of the engine: identifiers for isolates and callbacks, the
//! `typeof`-style classification of a value, and the snapshot of a thrown
//! JavaScript error.
//!
//! # Overview
//!
//! - [`ValueKind`] - `typeof`-style classification of an engine value
//! - [`JsError`] - Host-side snapshot of a thrown JavaScript value
//! - [`ErrorKind`] - Which error constructor produced the thrown value
//! - [`SourcePosition`] / [`StackFrame`] - Locations parsed from engine stacks
//! - [`IsolateId`] / [`CallbackId`] - Identity of isolates and host callbacks
//!
//! # Examples
//!
//! ```
//! use core_types::{ErrorKind, JsError, ValueKind};
//!
//! assert_eq!(ValueKind::Function.type_of(), "function");
//!
//! let error = JsError::new(ErrorKind::TypeError, "x is not a function")
//!     .with_stack_text("    at run (main.js:3:7)\n");
//! assert_eq!(error.to_string(), "TypeError: x is not a function");
//! assert_eq!(error.stack[0].line, 3);
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![deny(unsafe_code)]

mod error;
mod ids;
mod source;
mod value;

pub use error::{ErrorKind, JsError};
pub use ids::{CallbackId, IsolateId};
pub use source::{SourcePosition, StackFrame};
pub use value::ValueKind;
