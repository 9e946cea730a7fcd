//! Runtime orchestration for JavaScript execution
//!
//! The Runtime owns one isolate of the embedding core and a single execution
//! context whose global object carries the host functions:
//! - `print(...args)` writes its arguments, space separated, as one line
//! - `hostVersion()` returns the version of this program
//! - `HOST_NAME` is the constant `"jsembed"`

use crate::cli::Cli;
use crate::error::{CliError, CliResult};
use embed_core::{
    ExecutionContext, GlobalTemplate, Isolate, IsolateConfig, IsolateStats, PlatformConfig,
    Scope, TerminationHandle, Value, ValueKind,
};
use parking_lot::Mutex;
use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tracing::debug;

/// Version reported by `hostVersion()`.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Destination of `print`: stdout, or a buffer the host drains.
#[derive(Debug, Default)]
struct Console {
    echo: AtomicBool,
    lines: Mutex<Vec<String>>,
}

impl Console {
    fn write(&self, line: String) {
        if self.echo.load(Ordering::Relaxed) {
            println!("{line}");
        } else {
            self.lines.lock().push(line);
        }
    }
}

/// One isolate and context with the host functions installed
pub struct Runtime {
    context: ExecutionContext,
    template: GlobalTemplate,
    isolate: Isolate,
    platform: embed_core::Runtime,
    console: Arc<Console>,
}

impl Runtime {
    /// Create a runtime with its own platform and isolate
    ///
    /// `print` output is buffered until [`Runtime::with_echo`] turns on
    /// echoing to stdout.
    ///
    /// # Example
    /// ```
    /// use embed_core::{IsolateConfig, PlatformConfig};
    /// use js_cli::Runtime;
    ///
    /// let mut runtime = Runtime::new(PlatformConfig::new(), &IsolateConfig::default()).unwrap();
    /// runtime.execute_string("print('hello', 42)").unwrap();
    /// assert_eq!(runtime.take_output(), vec!["hello 42".to_string()]);
    /// ```
    pub fn new(platform: PlatformConfig, config: &IsolateConfig) -> CliResult<Self> {
        let platform = embed_core::Runtime::new(platform)?;
        let isolate = platform.create_isolate_with(config)?;
        let console = Arc::new(Console::default());

        let sink = Arc::clone(&console);
        let print = isolate.register_callback(move |info| {
            let scope = info.scope();
            let line = info
                .args()
                .map(|arg| render(scope, arg, false))
                .collect::<Vec<_>>()
                .join(" ");
            sink.write(line);
        })?;
        let version = isolate.register_callback(|info| info.return_value().set_string(VERSION))?;

        let mut template = isolate.create_template()?;
        template
            .set_function("print", print)
            .set_function("hostVersion", version)
            .set_value("HOST_NAME", "jsembed");
        let context = isolate.create_context(&template)?;
        debug!(isolate = %isolate.id(), prelude = platform.has_prelude(), "host runtime ready");

        Ok(Self {
            context,
            template,
            isolate,
            platform,
            console,
        })
    }

    /// Create a runtime from parsed command-line arguments
    pub fn from_cli(cli: &Cli) -> CliResult<Self> {
        Self::new(cli.platform_config(), &cli.isolate_config()?)
    }

    /// Echo `print` output to stdout instead of buffering it
    pub fn with_echo(self, echo: bool) -> Self {
        self.console.echo.store(echo, Ordering::Relaxed);
        self
    }

    /// Execute a JavaScript file
    ///
    /// # Errors
    /// Returns `CliError::Io` if the file cannot be read, or the script's
    /// exception if it throws
    pub fn execute_file(&mut self, path: impl AsRef<Path>) -> CliResult<Value> {
        let path = path.as_ref();
        let source = std::fs::read_to_string(path).map_err(|source| CliError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        self.execute_string(&source)
    }

    /// Execute a JavaScript source string
    ///
    /// Globals declared with `var` persist between calls.
    pub fn execute_string(&mut self, source: &str) -> CliResult<Value> {
        Ok(self.context.evaluate(source)?)
    }

    /// Format a value the way the REPL shows it: strings quoted, functions
    /// by name
    pub fn display(&self, value: &Value) -> CliResult<String> {
        Ok(self.isolate.with_scope(|scope| Ok(render(scope, value, true)))?)
    }

    /// Expose another host closure to scripts under `name`
    ///
    /// The context is rebuilt; existing globals stay in place.
    pub fn define_function<F>(&mut self, name: &str, function: F) -> CliResult<()>
    where
        F: Fn(&mut embed_core::CallbackInfo<'_>) + Send + Sync + 'static,
    {
        self.context
            .register_function(&mut self.template, name, function)?;
        Ok(())
    }

    /// Drain lines written by `print` while echo is off
    pub fn take_output(&self) -> Vec<String> {
        std::mem::take(&mut *self.console.lines.lock())
    }

    /// Handle for aborting a running script from another thread
    pub fn termination_handle(&self) -> TerminationHandle {
        self.isolate.termination_handle()
    }

    /// Isolate counters
    pub fn stats(&self) -> IsolateStats {
        self.isolate.stats()
    }

    /// Whether the data directory supplied a prelude
    pub fn has_prelude(&self) -> bool {
        self.platform.has_prelude()
    }

    /// Start the REPL (Read-Eval-Print Loop)
    ///
    /// # Example
    /// ```no_run
    /// use js_cli::{Cli, Runtime};
    ///
    /// let mut runtime = Runtime::from_cli(&Cli::default()).unwrap().with_echo(true);
    /// runtime.repl().unwrap();
    /// ```
    pub fn repl(&mut self) -> CliResult<()> {
        crate::repl::run_repl(self)
    }
}

impl std::fmt::Debug for Runtime {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Runtime")
            .field("isolate", &self.isolate.id())
            .field("bindings", &self.template.len())
            .finish_non_exhaustive()
    }
}

fn render(scope: &Scope<'_>, value: &Value, quote_strings: bool) -> String {
    let kind = match scope.value_kind(value) {
        Ok(kind) => kind,
        Err(error) => return format!("<{error}>"),
    };
    let rendered = match kind {
        ValueKind::String if quote_strings => scope.to_rust_string(value).map(|s| format!("'{s}'")),
        ValueKind::BigInt => scope.to_rust_string(value).map(|digits| format!("{digits}n")),
        ValueKind::Symbol => scope.get_property(value, "description").and_then(|description| {
            if scope.is_undefined(&description)? {
                Ok("Symbol()".to_string())
            } else {
                Ok(format!("Symbol({})", scope.to_rust_string(&description)?))
            }
        }),
        ValueKind::Function => scope
            .get_property(value, "name")
            .and_then(|name| scope.to_rust_string(&name))
            .map(|name| {
                if name.is_empty() {
                    "[Function (anonymous)]".to_string()
                } else {
                    format!("[Function: {name}]")
                }
            }),
        _ => scope.to_rust_string(value),
    };
    rendered.unwrap_or_else(|_| format!("[{kind}]"))
}
