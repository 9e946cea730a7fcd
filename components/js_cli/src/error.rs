//! Error types for the CLI

use embed_core::EmbedError;
use std::path::PathBuf;
use thiserror::Error;

/// CLI-specific errors
#[derive(Debug, Error)]
pub enum CliError {
    /// The embedding core failed, or the script threw
    #[error(transparent)]
    Embed(#[from] EmbedError),

    /// A script file could not be read
    #[error("could not read '{}': {source}", path.display())]
    Io {
        /// File that was being read
        path: PathBuf,
        /// Underlying failure
        #[source]
        source: std::io::Error,
    },

    /// The line editor failed
    #[error("REPL error: {0}")]
    Repl(String),
}

impl CliError {
    /// Whether the error is an exception thrown by script code.
    pub fn is_script_error(&self) -> bool {
        matches!(self, CliError::Embed(error) if error.is_exception())
    }

    /// Process exit status for this error.
    pub fn exit_code(&self) -> i32 {
        match self {
            CliError::Embed(error) if error.is_exception() => 1,
            CliError::Io { .. } => 2,
            _ => 3,
        }
    }
}

impl From<rustyline::error::ReadlineError> for CliError {
    fn from(err: rustyline::error::ReadlineError) -> Self {
        CliError::Repl(err.to_string())
    }
}

/// Result type for CLI operations
pub type CliResult<T> = Result<T, CliError>;
