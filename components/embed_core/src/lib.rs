//! Embedding core for a JavaScript engine.
//!
//! This crate is the surface a host program uses to run JavaScript: create
//! isolated engine instances, give them global objects, evaluate scripts,
//! inspect results through owned handles and expose host closures to script
//! code.
//!
//! # Overview
//!
//! - [`Runtime`] - Process-level setup and the factory for isolates
//! - [`Isolate`] - One engine heap; every other handle belongs to exactly one
//! - [`GlobalTemplate`] - Host description of a context's global object
//! - [`ExecutionContext`] - A global scope scripts are evaluated in
//! - [`Value`] - Owning handle to an engine value
//! - [`Scope`] - An entered context, for several operations under one lock
//! - [`CallbackInfo`] / [`ReturnValue`] - What host closures see of a call
//! - [`EmbedError`] - Script exceptions and host-side failures
//!
//! # Examples
//!
//! ```
//! use embed_core::{PlatformConfig, Runtime};
//!
//! let runtime = Runtime::new(PlatformConfig::new()).unwrap();
//! let isolate = runtime.create_isolate().unwrap();
//! let mut template = isolate.create_template().unwrap();
//! let context = isolate.create_context(&template).unwrap();
//!
//! let greet = isolate
//!     .register_callback(|info| {
//!         let name = info
//!             .arg(0)
//!             .and_then(|arg| info.to_rust_string(arg).ok())
//!             .unwrap_or_default();
//!         info.return_value().set_string(format!("hello, {name}"));
//!     })
//!     .unwrap();
//! context.bind_function(&mut template, "greet", greet).unwrap();
//!
//! let result = context.evaluate("greet('host')").unwrap();
//! assert_eq!(result.to_rust_string().unwrap(), "hello, host");
//! ```
//!
//! # Threads
//!
//! Every handle type is `Send + Sync`. Calls on one isolate are serialized by
//! its lock; different isolates run in parallel.

#![warn(missing_docs)]
#![warn(clippy::all)]

mod callback;
mod config;
mod context;
mod error;
mod handles;
mod isolate;
mod runtime;
mod scope;
mod template;
mod value;

pub use callback::{CallbackInfo, HostFn, ReturnValue};
pub use config::{IsolateConfig, PlatformConfig};
pub use context::ExecutionContext;
pub use error::{EmbedError, EmbedResult, Exception};
pub use isolate::{Isolate, IsolateStats, TerminationHandle};
pub use runtime::Runtime;
pub use scope::Scope;
pub use template::{Binding, GlobalTemplate, Primitive};
pub use value::Value;

pub use core_types::{CallbackId, ErrorKind, IsolateId, JsError, SourcePosition, StackFrame, ValueKind};
