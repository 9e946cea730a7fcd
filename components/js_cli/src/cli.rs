//! Command-line arguments

use crate::error::CliResult;
use clap::Parser;
use embed_core::{IsolateConfig, PlatformConfig};
use std::path::PathBuf;
use std::time::Duration;

/// Arguments of the `jsembed` binary.
#[derive(Parser, Debug, Clone, Default, PartialEq, Eq)]
#[command(name = "jsembed", version, about = "Run JavaScript through the embedding core", long_about = None)]
pub struct Cli {
    /// JavaScript file to execute
    #[arg(short, long, value_name = "FILE")]
    pub file: Option<String>,

    /// Inline JavaScript to evaluate
    #[arg(short, long, value_name = "CODE", conflicts_with = "file")]
    pub eval: Option<String>,

    /// Start the interactive REPL
    #[arg(short, long)]
    pub repl: bool,

    /// JSON file with isolate limits
    #[arg(short, long, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Engine data directory (overrides JSEMBED_DATA_DIR)
    #[arg(long, value_name = "DIR")]
    pub data_dir: Option<PathBuf>,

    /// Abort any single evaluation after this many milliseconds
    #[arg(long, value_name = "MS")]
    pub timeout_ms: Option<u64>,

    /// Heap limit in bytes
    #[arg(long, value_name = "BYTES")]
    pub memory_limit: Option<usize>,

    /// Log engine activity to stderr
    #[arg(long)]
    pub trace: bool,
}

impl Cli {
    /// Arguments that execute `path` with default settings.
    pub fn with_file(path: impl Into<String>) -> Self {
        Self {
            file: Some(path.into()),
            ..Self::default()
        }
    }

    /// Arguments that evaluate `code` with default settings.
    pub fn with_eval(code: impl Into<String>) -> Self {
        Self {
            eval: Some(code.into()),
            ..Self::default()
        }
    }

    /// Platform settings: `--data-dir` if given, otherwise the environment.
    pub fn platform_config(&self) -> PlatformConfig {
        match &self.data_dir {
            Some(dir) => PlatformConfig::new().with_data_dir(dir),
            None => PlatformConfig::from_env(),
        }
    }

    /// Isolate limits from `--config`, with command-line flags taking
    /// precedence over the file.
    pub fn isolate_config(&self) -> CliResult<IsolateConfig> {
        let mut config = match &self.config {
            Some(path) => IsolateConfig::from_json_file(path)?,
            None => IsolateConfig::default(),
        };
        if let Some(ms) = self.timeout_ms {
            config = config.with_execution_timeout(Duration::from_millis(ms));
        }
        if let Some(bytes) = self.memory_limit {
            config = config.with_memory_limit(bytes);
        }
        Ok(config)
    }
}
