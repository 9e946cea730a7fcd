//! Host program for the embedding core
//!
//! Provides the [`Runtime`] that owns one isolate and context, the host
//! functions scripts can call, and the command-line surface around them.

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod cli;
pub mod error;
pub mod repl;
pub mod runtime;

pub use cli::Cli;
pub use error::{CliError, CliResult};
pub use runtime::Runtime;
